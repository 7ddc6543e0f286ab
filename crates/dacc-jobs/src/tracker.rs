//! Completion tracking for one business day.
//!
//! All mutable state of a day lives in a [`DailyRequestState`] behind a single
//! mutex. Hours complete in any order; [`CompletionTracker::on_job_completed`]
//! is the only way to record a terminal result, and it hands out the day's
//! [`DailyOutcome`] exactly once, when the last requested hour turns terminal.
//! The outcome is an owned copy so aggregation runs without the lock.

use std::collections::BTreeMap;

use dacc_core::{BusinessInterval, CcError, HourPosition};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::config::MAX_EVENT_CAPACITY;
use crate::events::JobEvent;
use crate::job::{HourOutcome, HourlyJobResult, JobStatus};
use crate::runlog::RunLog;

/// Mutable state of one in-flight day.
#[derive(Debug)]
pub struct DailyRequestState {
    day: BusinessInterval,
    version: u32,
    results: BTreeMap<HourPosition, HourlyJobResult>,
    dispatched: usize,
    terminal: usize,
    aggregated: bool,
    log: RunLog,
}

impl DailyRequestState {
    fn new(
        day: BusinessInterval,
        version: u32,
        requested: BTreeMap<HourPosition, BusinessInterval>,
    ) -> Self {
        let results: BTreeMap<_, _> = requested
            .into_iter()
            .map(|(position, interval)| (position, HourlyJobResult::pending(position, interval)))
            .collect();
        Self {
            day,
            version,
            dispatched: results.len(),
            results,
            terminal: 0,
            aggregated: false,
            log: RunLog::new(),
        }
    }

    /// Flip the aggregated flag and copy the day out, once.
    fn take_outcome(&mut self) -> Option<DailyOutcome> {
        if self.aggregated || self.terminal != self.dispatched {
            return None;
        }
        self.aggregated = true;
        let success = self.results.values().filter(|r| r.is_success()).count();
        self.log.info(
            None,
            format!(
                "all {} requested hours terminal ({} success, {} failure), aggregating",
                self.dispatched,
                success,
                self.terminal - success
            ),
        );
        Some(DailyOutcome {
            day: self.day,
            version: self.version,
            results: self.results.clone(),
            log: self.log.clone(),
        })
    }
}

/// Owned, final view of a day handed to aggregation.
#[derive(Debug, Clone)]
pub struct DailyOutcome {
    pub day: BusinessInterval,
    pub version: u32,
    pub results: BTreeMap<HourPosition, HourlyJobResult>,
    pub log: RunLog,
}

impl DailyOutcome {
    pub fn success_count(&self) -> usize {
        self.results.values().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results
            .values()
            .filter(|r| r.status == JobStatus::Failure)
            .count()
    }

    pub fn result(&self, position: HourPosition) -> Option<&HourlyJobResult> {
        self.results.get(&position)
    }
}

/// What a completion notification did to the day.
#[derive(Debug)]
pub enum Completion {
    /// Stored; the day is still waiting for other hours.
    Recorded { terminal: usize, dispatched: usize },

    /// Not stored: unknown hour, redelivery, or aggregation already triggered.
    Ignored(CcError),

    /// Stored, and it was the last one. Aggregate this outcome.
    DayComplete(DailyOutcome),
}

/// Serializes every mutation of a day's state.
pub struct CompletionTracker {
    state: Mutex<DailyRequestState>,
    events: broadcast::Sender<JobEvent>,
}

impl CompletionTracker {
    /// Track the requested hours of `day`, all initially pending.
    pub fn new(
        day: BusinessInterval,
        version: u32,
        requested: BTreeMap<HourPosition, BusinessInterval>,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.clamp(1, MAX_EVENT_CAPACITY));
        Self {
            state: Mutex::new(DailyRequestState::new(day, version, requested)),
            events,
        }
    }

    /// Add an informational line to the day's run log.
    pub fn note(&self, position: Option<HourPosition>, message: impl Into<String>) {
        self.state.lock().log.info(position, message);
    }

    /// Record that the hour's request left for the engine.
    pub fn mark_dispatched(&self, position: HourPosition) {
        self.state.lock().log.info(Some(position), "dispatched to optimization engine");
        let _ = self.events.send(JobEvent::Dispatched { position });
    }

    /// Pending -> Running. Returns false when the hour is unknown or no longer pending.
    pub fn mark_running(&self, position: HourPosition) -> bool {
        let moved = {
            let mut state = self.state.lock();
            match state.results.get_mut(&position) {
                Some(slot) if slot.status == JobStatus::Pending => {
                    slot.status = JobStatus::Running;
                    true
                }
                _ => false,
            }
        };
        if moved {
            let _ = self.events.send(JobEvent::Running { position });
        }
        moved
    }

    /// Record the terminal outcome of `position`.
    ///
    /// Redeliveries for an already-terminal hour are logged and ignored; they
    /// never move the terminal counter and never trigger a second aggregation.
    pub fn on_job_completed(&self, position: HourPosition, outcome: HourOutcome) -> Completion {
        let mut events = Vec::with_capacity(2);
        let completion = {
            let mut state = self.state.lock();
            let previous = state.results.get(&position).map(|slot| slot.status);
            match previous {
                None => {
                    state.log.warn(
                        Some(position),
                        "completion for an hour that was never requested, ignored",
                    );
                    Completion::Ignored(CcError::NotFound(format!(
                        "hour {position} is not part of this request"
                    )))
                }
                Some(status) if status.is_terminal() => {
                    state.log.warn(
                        Some(position),
                        format!("duplicate completion ignored, hour already {}", status.as_str()),
                    );
                    events.push(JobEvent::DuplicateIgnored { position });
                    Completion::Ignored(CcError::InternalInvariant(format!(
                        "hour {position} is already terminal"
                    )))
                }
                Some(_) => {
                    events.push(match &outcome {
                        HourOutcome::Success { .. } => JobEvent::Succeeded { position },
                        HourOutcome::Failure { kind, message } => JobEvent::Failed {
                            position,
                            kind: *kind,
                            error: message.clone(),
                        },
                    });
                    match &outcome {
                        HourOutcome::Success { .. } => {
                            state.log.info(Some(position), "optimization succeeded")
                        }
                        HourOutcome::Failure { kind, message } => state
                            .log
                            .error(Some(position), format!("{kind}: {message}")),
                    }
                    if let Some(slot) = state.results.get_mut(&position) {
                        slot.status = outcome.status();
                        slot.outcome = Some(outcome);
                    }
                    state.terminal += 1;
                    debug_assert!(state.terminal <= state.dispatched);

                    if state.terminal < state.dispatched {
                        Completion::Recorded {
                            terminal: state.terminal,
                            dispatched: state.dispatched,
                        }
                    } else {
                        match state.take_outcome() {
                            Some(day) => {
                                events.push(JobEvent::DayComplete {
                                    success: day.success_count(),
                                    failure: day.failure_count(),
                                });
                                Completion::DayComplete(day)
                            }
                            None => Completion::Ignored(CcError::InternalInvariant(
                                "aggregation already triggered for this day".to_string(),
                            )),
                        }
                    }
                }
            }
        };
        for event in events {
            let _ = self.events.send(event);
        }
        completion
    }

    /// Hand out the outcome of a day that is already complete but was never
    /// aggregated, which only happens when no hour was requested.
    pub fn seal(&self) -> Option<DailyOutcome> {
        let outcome = self.state.lock().take_outcome();
        if let Some(day) = &outcome {
            let _ = self.events.send(JobEvent::DayComplete {
                success: day.success_count(),
                failure: day.failure_count(),
            });
        }
        outcome
    }

    pub fn status(&self, position: HourPosition) -> Option<JobStatus> {
        self.state.lock().results.get(&position).map(|r| r.status)
    }

    pub fn terminal_count(&self) -> usize {
        self.state.lock().terminal
    }

    pub fn dispatched_count(&self) -> usize {
        self.state.lock().dispatched
    }

    pub fn is_aggregated(&self) -> bool {
        self.state.lock().aggregated
    }

    /// Copy of the current results, for read-only inspection.
    pub fn results(&self) -> BTreeMap<HourPosition, HourlyJobResult> {
        self.state.lock().results.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }
}
