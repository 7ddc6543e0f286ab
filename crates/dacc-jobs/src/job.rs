//! Hourly job descriptors and results.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use dacc_core::{BusinessInterval, CcError, CcResult, HourPosition};
use serde::{Deserialize, Serialize};

/// References to the inputs the optimization engine needs for one hour.
///
/// The references are opaque to the orchestrator (URLs, object keys or local
/// paths); only their presence is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourlyInputs {
    /// Common grid model for the hour.
    pub network: Option<String>,
    /// Contingencies, remedial actions and constraints definition.
    pub crac: Option<String>,
    /// Generation and load shift keys.
    pub glsk: Option<String>,
    /// Reference programme (exchanges used to compute the base case).
    pub ref_prog: Option<String>,
}

impl HourlyInputs {
    /// Names of required references that are absent or blank.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("network", &self.network),
            ("crac", &self.crac),
            ("glsk", &self.glsk),
            ("ref_prog", &self.ref_prog),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self, position: HourPosition) -> CcResult<()> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CcError::InputValidation(format!(
                "hour {position} is missing required input(s): {}",
                missing.join(", ")
            )))
        }
    }
}

/// One business day's request: which hours to compute and with which inputs.
///
/// Hours absent from `hours` are never requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRequest {
    pub business_day: BusinessInterval,
    pub version: u32,
    pub hours: BTreeMap<HourPosition, HourlyInputs>,
}

/// Immutable request handed to the optimization engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyJobRequest {
    pub job_id: String,
    pub position: HourPosition,
    pub interval: BusinessInterval,
    pub inputs: HourlyInputs,
    pub deadline: DateTime<Utc>,
    /// Where the engine should publish the hourly result.
    pub result_destination: String,
}

/// References produced by a successful hourly optimization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourArtifacts {
    /// Optimization result listing activated remedial actions.
    pub rao_result: String,
    /// Network after optimization, if the engine exports it.
    pub network_with_ras: Option<String>,
    /// Engine-side log, if any.
    pub log: Option<String>,
}

/// Hourly error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HourlyErrorKind {
    /// Raised before dispatch; the hour never reached the engine.
    InputValidation,
    /// Engine business error, timeout or transport failure.
    OptimizationFailure,
}

impl fmt::Display for HourlyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HourlyErrorKind::InputValidation => write!(f, "input validation"),
            HourlyErrorKind::OptimizationFailure => write!(f, "optimization failure"),
        }
    }
}

/// Terminal outcome of an hour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HourOutcome {
    Success {
        artifacts: HourArtifacts,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },
    Failure {
        kind: HourlyErrorKind,
        message: String,
    },
}

impl HourOutcome {
    pub fn failure(kind: HourlyErrorKind, message: impl Into<String>) -> Self {
        HourOutcome::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            HourOutcome::Success { .. } => JobStatus::Success,
            HourOutcome::Failure { .. } => JobStatus::Failure,
        }
    }
}

/// Lifecycle of an hourly job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failure,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
        }
    }
}

/// Result slot for one requested hour.
///
/// Two results for the same position are the same logical entity, so equality
/// only looks at the position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyJobResult {
    pub position: HourPosition,
    pub interval: BusinessInterval,
    pub status: JobStatus,
    pub outcome: Option<HourOutcome>,
}

impl HourlyJobResult {
    pub fn pending(position: HourPosition, interval: BusinessInterval) -> Self {
        Self {
            position,
            interval,
            status: JobStatus::Pending,
            outcome: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }

    pub fn artifacts(&self) -> Option<&HourArtifacts> {
        match &self.outcome {
            Some(HourOutcome::Success { artifacts, .. }) => Some(artifacts),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<(HourlyErrorKind, &str)> {
        match &self.outcome {
            Some(HourOutcome::Failure { kind, message }) => Some((*kind, message.as_str())),
            _ => None,
        }
    }
}

impl PartialEq for HourlyJobResult {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl Eq for HourlyJobResult {}
