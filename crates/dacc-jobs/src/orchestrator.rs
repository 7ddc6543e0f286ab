//! Daily job orchestration.
//!
//! ```text
//! DailyRequest ──► Orchestrator::dispatch_day ──► one task per requested hour
//!                                                   │  OptimizationEngine::submit (deadline-bounded)
//!                                                   ▼
//!                              CompletionTracker::on_job_completed (single mutex)
//!                                                   │  last terminal hour
//!                                                   ▼
//!                              DailyAggregator::aggregate (exactly once, outside the lock)
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use dacc_core::{hourly_filename, partition_into_hours, CcError, CcResult, HourPosition};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::CcConfig;
use crate::engine::{failure_message, FailureCause, OptimizationEngine};
use crate::events::JobEvent;
use crate::job::{DailyRequest, HourOutcome, HourlyErrorKind, HourlyJobRequest};
use crate::tracker::{Completion, CompletionTracker, DailyOutcome};

/// Summary of a finished aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationReport {
    pub document_id: String,
    /// Store locations of every artifact written for the day.
    pub artifacts: Vec<String>,
    pub success: usize,
    pub failure: usize,
}

/// Consumer of completed days.
#[async_trait]
pub trait DailyAggregator: Send + Sync {
    async fn aggregate(&self, outcome: DailyOutcome) -> CcResult<AggregationReport>;
}

/// Dispatches business days to an optimization engine.
pub struct Orchestrator {
    engine: Arc<dyn OptimizationEngine>,
    aggregator: Arc<dyn DailyAggregator>,
    timezone: Tz,
    timeout_minutes: u64,
    timeout: chrono::Duration,
    event_capacity: usize,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<dyn OptimizationEngine>,
        aggregator: Arc<dyn DailyAggregator>,
        config: &CcConfig,
    ) -> CcResult<Self> {
        config.engine.validate()?;
        Ok(Self {
            engine,
            aggregator,
            timezone: config.timezone()?,
            timeout_minutes: config.engine.timeout_minutes,
            timeout: config.engine.timeout()?,
            event_capacity: config.engine.event_capacity,
        })
    }

    pub fn timeout_minutes(&self) -> u64 {
        self.timeout_minutes
    }

    /// Dispatch every requested hour of a day and return immediately.
    ///
    /// Hours with missing inputs are failed with `InputValidation` without
    /// reaching the engine. Positions outside the day's partition reject the
    /// whole request. Must be called from within a Tokio runtime.
    pub fn dispatch_day(&self, request: DailyRequest) -> CcResult<DayHandle> {
        let hours = partition_into_hours(&request.business_day);
        let mut requested = std::collections::BTreeMap::new();
        for position in request.hours.keys() {
            let interval = hours.get(position).ok_or_else(|| {
                CcError::InputValidation(format!(
                    "hour {position} is outside business day {} ({} hours)",
                    request.business_day,
                    hours.len()
                ))
            })?;
            requested.insert(*position, *interval);
        }

        let deadline = Utc::now().checked_add_signed(self.timeout).ok_or_else(|| {
            CcError::Config(format!(
                "a {} minute deadline is out of range",
                self.timeout_minutes
            ))
        })?;

        let run_id = Uuid::new_v4().to_string();
        let tracker = Arc::new(CompletionTracker::new(
            request.business_day,
            request.version,
            requested.clone(),
            self.event_capacity,
        ));
        let (report_tx, report_rx) = oneshot::channel();
        let day = Arc::new(DayContext {
            tracker: Arc::clone(&tracker),
            aggregator: Arc::clone(&self.aggregator),
            report_tx: Mutex::new(Some(report_tx)),
        });

        tracker.note(
            None,
            format!(
                "run {run_id}: dispatching {} of {} hours of {} (version {})",
                requested.len(),
                hours.len(),
                request.business_day,
                request.version
            ),
        );

        if requested.is_empty() {
            if let Some(outcome) = tracker.seal() {
                day.trigger(outcome);
            }
        }

        for (position, inputs) in request.hours {
            if let Err(err) = inputs.validate(position) {
                day.record(
                    position,
                    HourOutcome::failure(HourlyErrorKind::InputValidation, err.to_string()),
                );
                continue;
            }
            let interval = requested[&position];
            let job = HourlyJobRequest {
                job_id: format!("{run_id}-{:02}", position.value()),
                position,
                interval,
                inputs,
                deadline,
                result_destination: hourly_filename(interval.start(), request.version, self.timezone),
            };
            tracker.mark_dispatched(position);

            let day = Arc::clone(&day);
            let engine = Arc::clone(&self.engine);
            let timeout_minutes = self.timeout_minutes;
            tokio::spawn(async move {
                day.tracker.mark_running(position);
                let budget = (job.deadline - Utc::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                let outcome = match tokio::time::timeout(budget, engine.submit(job)).await {
                    Ok(Ok(success)) => HourOutcome::Success {
                        artifacts: success.artifacts,
                        started_at: success.started_at,
                        ended_at: success.ended_at,
                    },
                    Ok(Err(err)) => HourOutcome::failure(
                        HourlyErrorKind::OptimizationFailure,
                        failure_message(&FailureCause::Engine(err), timeout_minutes),
                    ),
                    Err(_) => HourOutcome::failure(
                        HourlyErrorKind::OptimizationFailure,
                        failure_message(&FailureCause::Timeout, timeout_minutes),
                    ),
                };
                day.record(position, outcome);
            });
        }

        Ok(DayHandle {
            run_id,
            day,
            report: report_rx,
        })
    }
}

struct DayContext {
    tracker: Arc<CompletionTracker>,
    aggregator: Arc<dyn DailyAggregator>,
    report_tx: Mutex<Option<oneshot::Sender<CcResult<AggregationReport>>>>,
}

impl DayContext {
    fn record(self: &Arc<Self>, position: HourPosition, outcome: HourOutcome) -> bool {
        match self.tracker.on_job_completed(position, outcome) {
            Completion::Recorded { .. } => true,
            Completion::DayComplete(day) => {
                self.trigger(day);
                true
            }
            Completion::Ignored(_) => false,
        }
    }

    fn trigger(self: &Arc<Self>, outcome: DailyOutcome) {
        let day = Arc::clone(self);
        tokio::spawn(async move {
            let interval = outcome.day;
            let report = day.aggregator.aggregate(outcome).await;
            match &report {
                Ok(report) => info!(
                    "aggregated {interval}: document {} ({} artifacts)",
                    report.document_id,
                    report.artifacts.len()
                ),
                Err(err) => error!("aggregation of {interval} failed: {err}"),
            }
            if let Some(tx) = day.report_tx.lock().take() {
                let _ = tx.send(report);
            }
        });
    }
}

/// Handle to a dispatched day.
pub struct DayHandle {
    run_id: String,
    day: Arc<DayContext>,
    report: oneshot::Receiver<CcResult<AggregationReport>>,
}

impl DayHandle {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn tracker(&self) -> &Arc<CompletionTracker> {
        &self.day.tracker
    }

    /// Subscribe to job events. Events sent before subscribing are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.day.tracker.subscribe()
    }

    /// Deliver a completion notification from outside the dispatch tasks,
    /// e.g. a redelivered message. Returns false when it was ignored.
    pub fn deliver(&self, position: HourPosition, outcome: HourOutcome) -> bool {
        self.day.record(position, outcome)
    }

    /// Wait for the day's aggregation report.
    pub async fn wait(self) -> CcResult<AggregationReport> {
        self.report.await.map_err(|_| {
            CcError::InternalInvariant("aggregation finished without a report".to_string())
        })?
    }
}
