//! Medication order models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A medication order as delivered by the medication source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawMedicationOrder {
    /// Source order identifier
    pub order_id: i64,
    /// Source medication identifier
    pub medication_id: i64,
    /// Medication display name
    pub medication_name: String,
    /// ATC code, empty when the source has none
    #[serde(default)]
    pub atc_code: String,
    /// Ordered amount
    pub amount: Option<f64>,
    /// Unit of the ordered amount
    pub unit: Option<String>,
    /// Orderer identifier
    pub ordered_by_id: Option<i64>,
    /// Orderer display name
    pub ordered_by: Option<String>,
    /// Clinical order time
    pub ordered_at: NaiveDateTime,
    /// Ward or unit
    pub location: Option<String>,
    /// Route of administration
    pub route: Option<String>,
}

/// An antimicrobial order enriched with its clinical justification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedOrder {
    pub order_id: i64,
    pub medication_id: i64,
    pub medication_name: String,
    pub atc_code: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub ordered_by_id: Option<i64>,
    pub ordered_by: Option<String>,
    pub ordered_at: NaiveDateTime,
    pub location: Option<String>,
    pub route: Option<String>,
    /// Always true for orders produced by the resolver
    pub is_antibiotic: bool,
    /// Reason text, with any drain annotation appended
    pub order_reason: Option<String>,
    /// Label of the parameter stream the reason came from
    pub order_reason_type: Option<String>,
    /// Infection grade recorded together with the reason
    pub order_reason_grade: Option<String>,
}

impl EnrichedOrder {
    /// Create an order with no reason attached.
    pub fn from_raw(order: &RawMedicationOrder) -> Self {
        Self {
            order_id: order.order_id,
            medication_id: order.medication_id,
            medication_name: order.medication_name.clone(),
            atc_code: order.atc_code.clone(),
            amount: order.amount,
            unit: order.unit.clone(),
            ordered_by_id: order.ordered_by_id,
            ordered_by: order.ordered_by.clone(),
            ordered_at: order.ordered_at,
            location: order.location.clone(),
            route: order.route.clone(),
            is_antibiotic: true,
            order_reason: None,
            order_reason_type: None,
            order_reason_grade: None,
        }
    }

    /// Check whether a reason was resolved for this order.
    pub fn has_reason(&self) -> bool {
        self.order_reason.is_some()
    }
}
