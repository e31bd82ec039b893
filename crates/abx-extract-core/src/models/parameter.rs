//! Free-text clinical parameter models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A timestamped free-text value from one parameter stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterTextEntry {
    /// Source parameter identifier
    pub parameter_id: i32,
    /// Parameter label (e.g., "Vårdbegäran")
    pub name: String,
    /// Free-text value
    #[serde(default)]
    pub value: String,
    /// Time the value was saved
    pub time: NaiveDateTime,
}

/// The seven parameter streams consulted when resolving order reasons.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParameterStream {
    CommunicableDiseaseRequest,
    CareRequest,
    Prophylaxis,
    Other,
    InfectionGrade,
    InfectionCategoryGrade,
    Drain,
}

impl ParameterStream {
    /// Reason streams in priority order.
    pub const REASONS: [ParameterStream; 4] = [
        ParameterStream::CommunicableDiseaseRequest,
        ParameterStream::CareRequest,
        ParameterStream::Prophylaxis,
        ParameterStream::Other,
    ];

    /// Every stream, in fetch order.
    pub const ALL: [ParameterStream; 7] = [
        ParameterStream::CommunicableDiseaseRequest,
        ParameterStream::CareRequest,
        ParameterStream::Prophylaxis,
        ParameterStream::Other,
        ParameterStream::InfectionGrade,
        ParameterStream::InfectionCategoryGrade,
        ParameterStream::Drain,
    ];

    /// Check whether entries of this stream can become an order reason.
    pub fn is_reason(&self) -> bool {
        Self::REASONS.contains(self)
    }
}
