//! # dacc-cluster
//!
//! Turns a completed business day into one clustered document: hourly
//! constraint records are merged over contiguous hours with equal content, and
//! hours where the optimizer activated remedial actions are split into an
//! outage-only record and a curative record pointing at a per-hour variant.
//!
//! [`ClusteringAggregator`] plugs this into the job layer as its
//! [`dacc_jobs::DailyAggregator`], reading from a [`ConstraintSource`] and
//! writing through an [`ArtifactStore`].

pub mod aggregator;
pub mod cluster;
pub mod manifest;
pub mod record;
pub mod source;
pub mod store;

pub use aggregator::ClusteringAggregator;
pub use cluster::{cluster_day, ClusteringInput, PERMANENT_SUFFIX, TEMPORARY_SUFFIX};
pub use manifest::{DailyManifest, HourRecord};
pub use record::{
    ActivatedActions, ClusteredConstraint, ClusteredDailyDocument, ConstraintRecord, Direction,
    LimitKind, MonitoredBranch, RemedialVariant,
};
pub use source::{ConstraintSource, InMemoryConstraintSource, JsonConstraintSource};
pub use store::{ArtifactStore, FileSystemStore, MemoryStore};
