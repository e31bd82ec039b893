//! Abx-Extract Core Library
//!
//! Extracts the antimicrobial medications of a clinical encounter from a
//! medication-management system and reshapes them into two encounter-scoped
//! records.
//!
//! # Architecture
//!
//! ```text
//!                       MedicationSource
//!                              │
//!            ┌─────────────────┴─────────────────┐
//!            │                                   │
//!   administration events           orders + 7 parameter streams
//!            │                                   │
//!            ▼                                   ▼
//!   ┌─────────────────┐               ┌─────────────────────┐
//!   │ Antimicrobial   │◄── codes ────►│ Antimicrobial       │
//!   │ filter          │               │ filter              │
//!   └────────┬────────┘               └──────────┬──────────┘
//!            ▼                                   ▼
//!   Administration compactor          Order reason resolver
//!   (dose episodes)                   (reason, grade, drain by save time)
//!            │                                   │
//!            └─────────────► Encounter ◄─────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (RawAdministrationEvent, DoseEpisode, EnrichedOrder, Encounter, etc.)
//! - [`filter`]: ATC code classification
//! - [`compactor`]: Administration events → dose episodes
//! - [`resolver`]: Order reason correlation
//! - [`source`]: Medication system query traits and a JSON snapshot source
//! - [`db`]: SQLite store for the antimicrobial code lists
//! - [`config`]: Parameter identifiers and pipeline policies
//! - [`filler`]: Encounter assembler

pub mod compactor;
pub mod config;
pub mod db;
pub mod filler;
pub mod filter;
pub mod models;
pub mod resolver;
pub mod source;

// Re-export commonly used types
pub use compactor::{merge_episodes, AdministrationCompactor};
pub use config::{ExtractConfig, MergeOrder, OrderFailurePolicy, ParameterIds};
pub use db::Database;
pub use filler::{FillReport, MedicationFiller, OrderFill, OrderOutcome};
pub use filter::AntimicrobialCodeSet;
pub use models::{
    DoseEpisode, Encounter, EnrichedOrder, ParameterStream, ParameterTextEntry,
    RawAdministrationEvent, RawMedicationOrder, TimeWindow,
};
pub use resolver::{OrderReasonResolver, ParameterStreams};
pub use source::{CodeRepository, MedicationSource, SnapshotSource};

use thiserror::Error;

/// Crate-level error.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid encounter key: {0:?}")]
    InvalidEncounterKey(String),

    #[error("Source error: {0}")]
    Source(#[from] source::SourceError),

    #[error("Order resolution failed: {0}")]
    Resolver(#[from] resolver::ResolverError),

    #[error("Database error: {0}")]
    Database(#[from] db::DbError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type ExtractResult<T> = Result<T, ExtractError>;
