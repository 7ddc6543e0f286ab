//! The daily aggregator: clusters a completed day and exports its artifacts.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use dacc_core::{daily_filename, CcError, CcResult, DailyArtifact};
use dacc_jobs::{AggregationReport, CcConfig, DailyAggregator, DailyOutcome};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::cluster::{cluster_day, ClusteringInput};
use crate::manifest::DailyManifest;
use crate::record::ClusteredDailyDocument;
use crate::source::ConstraintSource;
use crate::store::ArtifactStore;

/// Exported form of the clustered document.
#[derive(Serialize)]
struct DocumentExport<'a> {
    document_id: &'a str,
    version: u32,
    #[serde(flatten)]
    document: &'a ClusteredDailyDocument,
}

#[derive(Clone)]
pub struct ClusteringAggregator {
    source: Arc<dyn ConstraintSource>,
    store: Arc<dyn ArtifactStore>,
    timezone: Tz,
    pretty_json: bool,
}

impl ClusteringAggregator {
    pub fn new(
        source: Arc<dyn ConstraintSource>,
        store: Arc<dyn ArtifactStore>,
        config: &CcConfig,
    ) -> CcResult<Self> {
        Ok(Self {
            source,
            store,
            timezone: config.timezone()?,
            pretty_json: config.export.pretty_json,
        })
    }

    /// Cluster `outcome` and write document, manifest and run log.
    ///
    /// A successful hour whose optimization result cannot be read keeps its
    /// permanent limits only; the problem is recorded in the run log.
    pub fn aggregate_blocking(&self, mut outcome: DailyOutcome) -> CcResult<AggregationReport> {
        let document_id = Uuid::new_v4().to_string();
        let records = self.source.constraint_records(&outcome.day)?;

        let mut activated = BTreeMap::new();
        for (position, result) in outcome.results.iter().filter(|(_, r)| r.is_success()) {
            match self.source.activated_actions(*position, result) {
                Ok(actions) => {
                    activated.insert(*position, actions);
                }
                Err(err) => outcome.log.warn(
                    Some(*position),
                    format!("optimization result unreadable, permanent limits only: {err}"),
                ),
            }
        }

        let document = cluster_day(&ClusteringInput {
            day: outcome.day,
            results: &outcome.results,
            records: &records,
            activated: &activated,
            timezone: self.timezone,
        })?;
        outcome.log.info(
            None,
            format!(
                "clustered {} native records into {} constraints and {} variants",
                records.len(),
                document.constraints.len(),
                document.variants.len()
            ),
        );

        let day_start = outcome.day.start();
        let name = |artifact| daily_filename(artifact, day_start, outcome.version, self.timezone);
        let mut artifacts = Vec::with_capacity(3);

        let export = DocumentExport {
            document_id: &document_id,
            version: outcome.version,
            document: &document,
        };
        artifacts.push(self.write(&name(DailyArtifact::Document), &export)?);

        let manifest = DailyManifest::from_outcome(&outcome, &document_id);
        artifacts.push(self.write(&name(DailyArtifact::Manifest), &manifest)?);

        let log_name = name(DailyArtifact::Log);
        outcome.log.info(None, format!("exported {document_id}"));
        artifacts.push(self.write(&log_name, &outcome.log)?);

        info!(
            document = %document_id,
            day = %outcome.day,
            "daily document exported"
        );
        Ok(AggregationReport {
            document_id,
            artifacts,
            success: outcome.success_count(),
            failure: outcome.failure_count(),
        })
    }

    fn write<T: Serialize>(&self, path: &str, value: &T) -> CcResult<String> {
        let payload = if self.pretty_json {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        self.store.put(path, &payload)
    }
}

#[async_trait]
impl DailyAggregator for ClusteringAggregator {
    async fn aggregate(&self, outcome: DailyOutcome) -> CcResult<AggregationReport> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.aggregate_blocking(outcome))
            .await
            .map_err(|err| CcError::InternalInvariant(format!("aggregation task failed: {err}")))?
    }
}
