//! Query interfaces of the external medication system.
//!
//! Both traits are blocking. Connection and credential handling belong to the
//! implementor; the pipelines only see the logical queries.

mod snapshot;

pub use snapshot::*;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::{ParameterTextEntry, RawAdministrationEvent, RawMedicationOrder, TimeWindow};

/// Medication source errors.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Query failed: {0}")]
    Query(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Per-encounter queries against the medication-management system.
pub trait MedicationSource {
    /// Administration events of a patient within an encounter.
    fn administrations(
        &self,
        patient_id: &str,
        period: &TimeWindow,
        encounter_key: i32,
    ) -> SourceResult<Vec<RawAdministrationEvent>>;

    /// Medication orders of an encounter placed within a window.
    fn medication_orders(
        &self,
        encounter_key: i32,
        window: &TimeWindow,
    ) -> SourceResult<Vec<RawMedicationOrder>>;

    /// Time the order record was last saved.
    fn order_save_time(&self, encounter_key: i32, order_id: i64) -> SourceResult<NaiveDateTime>;

    /// Free-text values of one parameter within a window.
    fn parameter_text_values(
        &self,
        parameter_id: i32,
        encounter_key: i32,
        window: &TimeWindow,
    ) -> SourceResult<Vec<ParameterTextEntry>>;
}

/// Reference lists of antimicrobial ATC codes.
pub trait CodeRepository {
    /// Exact ATC codes of antibiotics.
    fn antibiotic_codes(&self) -> SourceResult<Vec<String>>;

    /// ATC code prefixes of antifungal groups.
    fn antifungal_group_codes(&self) -> SourceResult<Vec<String>>;
}
