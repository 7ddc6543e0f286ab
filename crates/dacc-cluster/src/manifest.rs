use chrono::{DateTime, Utc};
use dacc_core::{partition_into_hours, BusinessInterval, HourPosition};
use dacc_jobs::{DailyOutcome, HourlyErrorKind};
use serde::{Deserialize, Serialize};

/// Per-hour line of the daily manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRecord {
    pub position: HourPosition,
    pub interval: BusinessInterval,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<HourlyErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rao_result: Option<String>,
}

/// Summary of a day's hourly jobs, exported next to the clustered document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyManifest {
    pub created_at: DateTime<Utc>,
    pub business_day: BusinessInterval,
    pub version: u32,
    pub document_id: String,
    /// Hours in the day (23, 24 or 25).
    pub num_hours: usize,
    pub requested: usize,
    pub success: usize,
    pub failure: usize,
    pub hours: Vec<HourRecord>,
}

impl DailyManifest {
    pub fn from_outcome(outcome: &DailyOutcome, document_id: &str) -> Self {
        let hours = outcome
            .results
            .values()
            .map(|result| {
                let (error_kind, error) = match result.error() {
                    Some((kind, message)) => (Some(kind), Some(message.to_string())),
                    None => (None, None),
                };
                HourRecord {
                    position: result.position,
                    interval: result.interval,
                    status: result.status.as_str().to_string(),
                    error_kind,
                    error,
                    rao_result: result.artifacts().map(|a| a.rao_result.clone()),
                }
            })
            .collect();
        Self {
            created_at: Utc::now(),
            business_day: outcome.day,
            version: outcome.version,
            document_id: document_id.to_string(),
            num_hours: partition_into_hours(&outcome.day).len(),
            requested: outcome.results.len(),
            success: outcome.success_count(),
            failure: outcome.failure_count(),
            hours,
        }
    }
}
