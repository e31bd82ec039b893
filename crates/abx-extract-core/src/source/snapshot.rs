//! In-memory medication source backed by a JSON snapshot.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{CodeRepository, MedicationSource, SourceError, SourceResult};
use crate::models::{ParameterTextEntry, RawAdministrationEvent, RawMedicationOrder, TimeWindow};

/// Saved time of one order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSaveTime {
    pub order_id: i64,
    pub saved_at: NaiveDateTime,
}

/// Source data recorded for one encounter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EncounterSnapshot {
    /// Numeric encounter key in the source
    pub encounter_key: i32,
    #[serde(default)]
    pub administrations: Vec<RawAdministrationEvent>,
    #[serde(default)]
    pub orders: Vec<RawMedicationOrder>,
    #[serde(default)]
    pub order_save_times: Vec<OrderSaveTime>,
    /// Entries of every parameter stream, distinguished by `parameter_id`
    #[serde(default)]
    pub parameters: Vec<ParameterTextEntry>,
}

/// A medication source answering from a recorded snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SnapshotSource {
    #[serde(default)]
    pub antibiotic_codes: Vec<String>,
    #[serde(default)]
    pub antifungal_group_codes: Vec<String>,
    #[serde(default)]
    pub encounters: Vec<EncounterSnapshot>,
}

impl SnapshotSource {
    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> SourceResult<Self> {
        serde_json::from_str(json).map_err(|e| SourceError::Query(format!("malformed snapshot: {}", e)))
    }

    /// Read a snapshot file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SourceError::Unavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    fn encounter(&self, encounter_key: i32) -> Option<&EncounterSnapshot> {
        self.encounters
            .iter()
            .find(|e| e.encounter_key == encounter_key)
    }
}

impl MedicationSource for SnapshotSource {
    fn administrations(
        &self,
        _patient_id: &str,
        _period: &TimeWindow,
        encounter_key: i32,
    ) -> SourceResult<Vec<RawAdministrationEvent>> {
        Ok(self
            .encounter(encounter_key)
            .map(|e| e.administrations.clone())
            .unwrap_or_default())
    }

    fn medication_orders(
        &self,
        encounter_key: i32,
        window: &TimeWindow,
    ) -> SourceResult<Vec<RawMedicationOrder>> {
        Ok(self
            .encounter(encounter_key)
            .map(|e| {
                e.orders
                    .iter()
                    .filter(|o| window.contains(o.ordered_at))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn order_save_time(&self, encounter_key: i32, order_id: i64) -> SourceResult<NaiveDateTime> {
        self.encounter(encounter_key)
            .and_then(|e| e.order_save_times.iter().find(|s| s.order_id == order_id))
            .map(|s| s.saved_at)
            .ok_or_else(|| {
                SourceError::NotFound(format!(
                    "save time of order {} in encounter {}",
                    order_id, encounter_key
                ))
            })
    }

    fn parameter_text_values(
        &self,
        parameter_id: i32,
        encounter_key: i32,
        window: &TimeWindow,
    ) -> SourceResult<Vec<ParameterTextEntry>> {
        Ok(self
            .encounter(encounter_key)
            .map(|e| {
                e.parameters
                    .iter()
                    .filter(|p| p.parameter_id == parameter_id && window.contains(p.time))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl CodeRepository for SnapshotSource {
    fn antibiotic_codes(&self) -> SourceResult<Vec<String>> {
        Ok(self.antibiotic_codes.clone())
    }

    fn antifungal_group_codes(&self) -> SourceResult<Vec<String>> {
        Ok(self.antifungal_group_codes.clone())
    }
}
