//! Medication administration models: raw source events and compacted dose episodes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Role of a substance within a composite administration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubstanceRole {
    /// Primary active substance
    MainComponent,
    /// Diluent, carrier or additive
    Other,
}

/// Route and site of an administration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dosage {
    /// Route of administration (e.g., "IV", "PO")
    pub route: Option<String>,
    /// Administration site
    pub site: Option<String>,
}

/// One constituent substance of an administration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdministeredSubstance {
    /// Role within the administration
    pub role: SubstanceRole,
    /// Substance name
    pub name: String,
    /// ATC code, empty when the source has none
    #[serde(default)]
    pub atc_code: String,
    /// Administered quantity
    pub quantity: Option<f64>,
    /// Unit of the quantity
    pub unit: Option<String>,
}

/// One recorded administration act as delivered by the medication source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawAdministrationEvent {
    /// Set when the administration was charted but not given
    #[serde(default)]
    pub was_not_given: bool,
    /// Start of the effective interval
    pub effective_start: NaiveDateTime,
    /// End of the effective interval
    pub effective_end: NaiveDateTime,
    /// Route and site
    #[serde(default)]
    pub dosage: Dosage,
    /// Constituent substances
    pub substances: Vec<AdministeredSubstance>,
}

/// A compacted run of administrations of the same drug and dose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoseEpisode {
    pub name: String,
    pub atc_code: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    /// Start of the first merged administration
    pub start: NaiveDateTime,
    /// End of the last merged administration
    pub end: NaiveDateTime,
    pub route: Option<String>,
    pub site: Option<String>,
    /// Always true for episodes produced by the compactor
    pub is_antibiotic: bool,
    /// Number of raw administrations merged into this episode
    pub dose_count: u32,
}

impl DoseEpisode {
    /// Build a single-dose episode from one substance of an event.
    pub fn from_substance(event: &RawAdministrationEvent, substance: &AdministeredSubstance) -> Self {
        Self {
            name: substance.name.clone(),
            atc_code: substance.atc_code.clone(),
            quantity: substance.quantity,
            unit: substance.unit.clone(),
            start: event.effective_start,
            end: event.effective_end,
            route: event.dosage.route.clone(),
            site: event.dosage.site.clone(),
            is_antibiotic: true,
            dose_count: 1,
        }
    }

    /// Check whether two episodes describe the same drug and dose.
    ///
    /// Identity is (name, ATC code, quantity, unit); route and site are ignored.
    pub fn same_drug_and_dose(&self, other: &DoseEpisode) -> bool {
        self.name == other.name
            && self.atc_code == other.atc_code
            && self.quantity == other.quantity
            && self.unit == other.unit
    }

    /// Check whether `candidate` ends on the same calendar day or the day after this episode.
    pub fn is_adjacent_to(&self, candidate: &DoseEpisode) -> bool {
        let last = self.end.date();
        let next = candidate.end.date();
        last == next || last.succ_opt() == Some(next)
    }

    /// Absorb another dose into this episode.
    pub fn extend_with(&mut self, candidate: &DoseEpisode) {
        self.end = candidate.end;
        self.dose_count += 1;
    }
}
