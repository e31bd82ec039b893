//! Encounter models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::administration::DoseEpisode;
use super::order::EnrichedOrder;
use crate::ExtractError;

/// A closed time window `[start, end]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Check whether an instant lies inside the window (both bounds inclusive).
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        time >= self.start && time <= self.end
    }

    /// Check whether an interval lies fully inside the window.
    pub fn contains_interval(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start >= self.start && end <= self.end
    }
}

/// A clinical encounter whose antimicrobial medications are being extracted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Encounter {
    /// Encounter identifier in the medication source (numeric, stored as text)
    pub source_encounter_id: String,
    /// Patient identifier in the medication source
    pub patient_id: String,
    /// Encounter start
    pub period_start: NaiveDateTime,
    /// Encounter end
    pub period_end: NaiveDateTime,
    /// Compacted administration timeline
    #[serde(default)]
    pub medication_administrations: Vec<DoseEpisode>,
    /// Antimicrobial orders; `None` when order resolution failed
    #[serde(default)]
    pub medication_orders: Option<Vec<EnrichedOrder>>,
}

/// Counts describing the extracted medications of one encounter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AntimicrobialSummary {
    pub episodes: usize,
    pub doses: u32,
    pub orders: usize,
    pub orders_with_reason: usize,
}

impl Encounter {
    /// Create an encounter with empty medication lists.
    pub fn new(
        source_encounter_id: String,
        patient_id: String,
        period_start: NaiveDateTime,
        period_end: NaiveDateTime,
    ) -> Self {
        Self {
            source_encounter_id,
            patient_id,
            period_start,
            period_end,
            medication_administrations: Vec::new(),
            medication_orders: None,
        }
    }

    /// The encounter period as a window.
    pub fn period(&self) -> TimeWindow {
        TimeWindow::new(self.period_start, self.period_end)
    }

    /// Parse the source encounter identifier into the numeric key the source expects.
    pub fn encounter_key(&self) -> Result<i32, ExtractError> {
        self.source_encounter_id
            .trim()
            .parse::<i32>()
            .map_err(|_| ExtractError::InvalidEncounterKey(self.source_encounter_id.clone()))
    }

    /// Summarize the extracted medications.
    pub fn antimicrobial_summary(&self) -> AntimicrobialSummary {
        let orders = self.medication_orders.as_deref().unwrap_or_default();
        AntimicrobialSummary {
            episodes: self.medication_administrations.len(),
            doses: self
                .medication_administrations
                .iter()
                .map(|e| e.dose_count)
                .sum(),
            orders: orders.len(),
            orders_with_reason: orders.iter().filter(|o| o.has_reason()).count(),
        }
    }
}
