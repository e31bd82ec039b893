//! Extraction configuration.
//!
//! Resolved once at startup and passed by value into [`crate::MedicationFiller`].
//! Only the drain parameter identifier has no default; it differs between
//! installations of the medication system.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ParameterStream, TimeWindow};

/// Environment variable holding the drain parameter identifier.
pub const DRAIN_PARAMETER_ENV: &str = "ABX_DRAIN_PARAMETER_ID";

pub const COMMUNICABLE_DISEASE_REQUEST_PARAMETER_ID: i32 = 23576;
pub const PROPHYLAXIS_PARAMETER_ID: i32 = 23577;
pub const CARE_REQUEST_PARAMETER_ID: i32 = 23578;
pub const INFECTION_GRADE_PARAMETER_ID: i32 = 23579;
pub const INFECTION_CATEGORY_GRADE_PARAMETER_ID: i32 = 23580;
pub const OTHER_REASON_PARAMETER_ID: i32 = 23663;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Drain parameter id is not configured (set ABX_DRAIN_PARAMETER_ID or parameters.drain)")]
    MissingDrainParameter,

    #[error("Invalid drain parameter id: {0:?}")]
    InvalidDrainParameter(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Source parameter identifiers of the seven parameter streams.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParameterIds {
    pub communicable_disease_request: i32,
    pub care_request: i32,
    pub prophylaxis: i32,
    pub other: i32,
    pub infection_grade: i32,
    pub infection_category_grade: i32,
    pub drain: i32,
}

impl ParameterIds {
    /// Standard identifiers with the installation-specific drain parameter.
    pub fn with_drain(drain: i32) -> Self {
        Self {
            communicable_disease_request: COMMUNICABLE_DISEASE_REQUEST_PARAMETER_ID,
            care_request: CARE_REQUEST_PARAMETER_ID,
            prophylaxis: PROPHYLAXIS_PARAMETER_ID,
            other: OTHER_REASON_PARAMETER_ID,
            infection_grade: INFECTION_GRADE_PARAMETER_ID,
            infection_category_grade: INFECTION_CATEGORY_GRADE_PARAMETER_ID,
            drain,
        }
    }

    /// Identifier of a stream.
    pub fn id_of(&self, stream: ParameterStream) -> i32 {
        match stream {
            ParameterStream::CommunicableDiseaseRequest => self.communicable_disease_request,
            ParameterStream::CareRequest => self.care_request,
            ParameterStream::Prophylaxis => self.prophylaxis,
            ParameterStream::Other => self.other,
            ParameterStream::InfectionGrade => self.infection_grade,
            ParameterStream::InfectionCategoryGrade => self.infection_category_grade,
            ParameterStream::Drain => self.drain,
        }
    }
}

/// Order in which administration candidates are merged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MergeOrder {
    /// Arrival order from the source. Output depends on that order.
    #[default]
    Source,
    /// Stable sort by start time before merging.
    Chronological,
}

/// What happens when order reason resolution fails.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderFailurePolicy {
    /// Log the failure and leave the encounter without an order list.
    #[default]
    Absorb,
    /// Return the failure to the caller.
    Propagate,
}

/// Settings for one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractConfig {
    pub parameters: ParameterIds,
    #[serde(default)]
    pub merge_order: MergeOrder,
    #[serde(default)]
    pub order_failure_policy: OrderFailurePolicy,
    /// Window for order and parameter queries; the encounter period when unset
    #[serde(default)]
    pub order_window: Option<TimeWindow>,
}

/// On-disk form, where every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    parameters: ParameterOverrides,
    merge_order: MergeOrder,
    order_failure_policy: OrderFailurePolicy,
    order_window: Option<TimeWindow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ParameterOverrides {
    communicable_disease_request: Option<i32>,
    care_request: Option<i32>,
    prophylaxis: Option<i32>,
    other: Option<i32>,
    infection_grade: Option<i32>,
    infection_category_grade: Option<i32>,
    drain: Option<i32>,
}

impl ExtractConfig {
    /// Default settings with the given drain parameter.
    pub fn new(drain_parameter_id: i32) -> Self {
        Self {
            parameters: ParameterIds::with_drain(drain_parameter_id),
            merge_order: MergeOrder::default(),
            order_failure_policy: OrderFailurePolicy::default(),
            order_window: None,
        }
    }

    /// Parse a JSON config. `drain_override` wins over `parameters.drain` in the document.
    pub fn from_json(json: &str, drain_override: Option<i32>) -> ConfigResult<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;
        Self::from_file(file, drain_override)
    }

    /// Resolve the config from an optional file plus an optional drain override.
    pub fn resolve(path: Option<&Path>, drain_override: Option<i32>) -> ConfigResult<Self> {
        match path {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                Self::from_json(&json, drain_override)
            }
            None => Self::from_file(ConfigFile::default(), drain_override),
        }
    }

    fn from_file(file: ConfigFile, drain_override: Option<i32>) -> ConfigResult<Self> {
        let overrides = file.parameters;
        let drain = drain_override
            .or(overrides.drain)
            .ok_or(ConfigError::MissingDrainParameter)?;
        let defaults = ParameterIds::with_drain(drain);

        Ok(Self {
            parameters: ParameterIds {
                communicable_disease_request: overrides
                    .communicable_disease_request
                    .unwrap_or(defaults.communicable_disease_request),
                care_request: overrides.care_request.unwrap_or(defaults.care_request),
                prophylaxis: overrides.prophylaxis.unwrap_or(defaults.prophylaxis),
                other: overrides.other.unwrap_or(defaults.other),
                infection_grade: overrides.infection_grade.unwrap_or(defaults.infection_grade),
                infection_category_grade: overrides
                    .infection_category_grade
                    .unwrap_or(defaults.infection_category_grade),
                drain,
            },
            merge_order: file.merge_order,
            order_failure_policy: file.order_failure_policy,
            order_window: file.order_window,
        })
    }
}

/// Parse a drain parameter identifier supplied as text (env var or flag).
pub fn parse_drain_parameter_id(raw: &str) -> ConfigResult<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ConfigError::InvalidDrainParameter(raw.to_string()))
}
