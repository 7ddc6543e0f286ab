//! Optimization engine seam.
//!
//! The engine computes remedial-action optimizations; this crate only submits
//! requests and waits for exactly one terminal answer per request.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dacc_core::HourPosition;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::{HourArtifacts, HourlyJobRequest};

/// Payload of a successful hourly optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSuccess {
    pub artifacts: HourArtifacts,
    pub started_at: chrono::DateTime<Utc>,
    pub ended_at: chrono::DateTime<Utc>,
}

/// Errors reported back by the engine or the transport in front of it.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Structured business error produced by the optimizer itself.
    #[error("{message}")]
    Business { code: String, message: String },

    /// Messaging/RPC failure between orchestrator and engine.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

/// Asynchronous optimization engine.
#[async_trait]
pub trait OptimizationEngine: Send + Sync {
    async fn submit(&self, request: HourlyJobRequest) -> Result<EngineSuccess, EngineError>;
}

/// Why an hour did not succeed, before it is turned into a message.
#[derive(Debug)]
pub enum FailureCause {
    Engine(EngineError),
    Timeout,
}

/// Message recorded for a failed hour.
///
/// Business errors keep the engine's own message, timeouts get a fixed message
/// naming the configured wait budget, everything else its error text.
pub fn failure_message(cause: &FailureCause, timeout_minutes: u64) -> String {
    match cause {
        FailureCause::Engine(EngineError::Business { message, .. }) => message.clone(),
        FailureCause::Timeout => format!(
            "Timeout: no answer from the optimization engine after {timeout_minutes} minutes"
        ),
        FailureCause::Engine(other) => other.to_string(),
    }
}

/// Scripted answer for one hour of a [`ReplayEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptedOutcome {
    Success {
        rao_result: String,
        #[serde(default)]
        network_with_ras: Option<String>,
    },
    BusinessError {
        #[serde(default)]
        code: String,
        message: String,
    },
    TransportError {
        message: String,
    },
    /// Never answers; the orchestrator's deadline turns this into a timeout.
    Hang,
}

/// Engine that replays scripted outcomes, for offline runs and tests.
///
/// Hours without a script fail with a transport error.
#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    outcomes: BTreeMap<HourPosition, ScriptedOutcome>,
    latency: BTreeMap<HourPosition, Duration>,
}

impl ReplayEngine {
    pub fn new(outcomes: BTreeMap<HourPosition, ScriptedOutcome>) -> Self {
        Self {
            outcomes,
            latency: BTreeMap::new(),
        }
    }

    pub fn with_outcome(mut self, position: HourPosition, outcome: ScriptedOutcome) -> Self {
        self.outcomes.insert(position, outcome);
        self
    }

    /// Delay the answer for `position`, to force out-of-order completion.
    pub fn with_latency(mut self, position: HourPosition, latency: Duration) -> Self {
        self.latency.insert(position, latency);
        self
    }
}

#[async_trait]
impl OptimizationEngine for ReplayEngine {
    async fn submit(&self, request: HourlyJobRequest) -> Result<EngineSuccess, EngineError> {
        let started_at = Utc::now();
        if let Some(latency) = self.latency.get(&request.position) {
            tokio::time::sleep(*latency).await;
        }
        match self.outcomes.get(&request.position) {
            Some(ScriptedOutcome::Success {
                rao_result,
                network_with_ras,
            }) => Ok(EngineSuccess {
                artifacts: HourArtifacts {
                    rao_result: rao_result.clone(),
                    network_with_ras: network_with_ras.clone(),
                    log: None,
                },
                started_at,
                ended_at: Utc::now(),
            }),
            Some(ScriptedOutcome::BusinessError { code, message }) => Err(EngineError::Business {
                code: code.clone(),
                message: message.clone(),
            }),
            Some(ScriptedOutcome::TransportError { message }) => {
                Err(EngineError::Transport(message.clone()))
            }
            Some(ScriptedOutcome::Hang) => std::future::pending().await,
            None => Err(EngineError::Transport(format!(
                "no scripted outcome for hour {}",
                request.position
            ))),
        }
    }
}
