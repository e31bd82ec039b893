//! Domain models for antimicrobial extraction.

mod administration;
mod encounter;
mod order;
mod parameter;

pub use administration::*;
pub use encounter::*;
pub use order::*;
pub use parameter::*;
