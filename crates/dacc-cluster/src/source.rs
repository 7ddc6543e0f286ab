//! Where native constraint records and hourly optimization results come from.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use dacc_core::{BusinessInterval, CcError, CcResult, HourPosition};
use dacc_jobs::HourlyJobResult;
use serde::Deserialize;

use crate::record::{ActivatedActions, ConstraintRecord};

/// Read side of clustering.
pub trait ConstraintSource: Send + Sync {
    /// Every native record version whose validity overlaps `day`.
    fn constraint_records(&self, day: &BusinessInterval) -> CcResult<Vec<ConstraintRecord>>;

    /// Actions activated by a successful hour, per contingency.
    fn activated_actions(
        &self,
        position: HourPosition,
        result: &HourlyJobResult,
    ) -> CcResult<ActivatedActions>;
}

/// Shape of an hourly optimization result file; only activations are read.
#[derive(Debug, Default, Deserialize)]
struct RaoResultFile {
    #[serde(default)]
    activated_actions: ActivatedActions,
}

/// Records from a JSON array on disk; RAO results resolved next to it.
#[derive(Debug, Clone)]
pub struct JsonConstraintSource {
    records_path: PathBuf,
    base_dir: PathBuf,
}

impl JsonConstraintSource {
    pub fn new(records_path: impl Into<PathBuf>) -> Self {
        let records_path = records_path.into();
        let base_dir = records_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            records_path,
            base_dir,
        }
    }

    /// Resolve relative RAO result references against `dir` instead.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ConstraintSource for JsonConstraintSource {
    fn constraint_records(&self, day: &BusinessInterval) -> CcResult<Vec<ConstraintRecord>> {
        let file = File::open(&self.records_path).map_err(|err| {
            CcError::Io(std::io::Error::new(
                err.kind(),
                format!("opening constraints '{}': {err}", self.records_path.display()),
            ))
        })?;
        let records: Vec<ConstraintRecord> = serde_json::from_reader(file).map_err(|err| {
            CcError::Parse(format!(
                "constraints '{}': {err}",
                self.records_path.display()
            ))
        })?;
        Ok(records
            .into_iter()
            .filter(|record| record.validity.overlaps(day))
            .collect())
    }

    fn activated_actions(
        &self,
        position: HourPosition,
        result: &HourlyJobResult,
    ) -> CcResult<ActivatedActions> {
        let artifacts = result.artifacts().ok_or_else(|| {
            CcError::NotFound(format!("hour {position} has no optimization result"))
        })?;
        let path = self.resolve(&artifacts.rao_result);
        let file = File::open(&path).map_err(|err| {
            CcError::Io(std::io::Error::new(
                err.kind(),
                format!("opening RAO result '{}': {err}", path.display()),
            ))
        })?;
        let parsed: RaoResultFile = serde_json::from_reader(file).map_err(|err| {
            CcError::Parse(format!("RAO result '{}': {err}", path.display()))
        })?;
        Ok(parsed.activated_actions)
    }
}

/// Source fed from memory, keyed by RAO result reference.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConstraintSource {
    records: Vec<ConstraintRecord>,
    results: BTreeMap<String, ActivatedActions>,
}

impl InMemoryConstraintSource {
    pub fn new(records: Vec<ConstraintRecord>) -> Self {
        Self {
            records,
            results: BTreeMap::new(),
        }
    }

    pub fn with_result(mut self, rao_result: impl Into<String>, actions: ActivatedActions) -> Self {
        self.results.insert(rao_result.into(), actions);
        self
    }
}

impl ConstraintSource for InMemoryConstraintSource {
    fn constraint_records(&self, day: &BusinessInterval) -> CcResult<Vec<ConstraintRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.validity.overlaps(day))
            .cloned()
            .collect())
    }

    fn activated_actions(
        &self,
        position: HourPosition,
        result: &HourlyJobResult,
    ) -> CcResult<ActivatedActions> {
        let artifacts = result.artifacts().ok_or_else(|| {
            CcError::NotFound(format!("hour {position} has no optimization result"))
        })?;
        self.results
            .get(&artifacts.rao_result)
            .cloned()
            .ok_or_else(|| CcError::NotFound(format!("RAO result '{}'", artifacts.rao_result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dacc_jobs::{HourArtifacts, HourOutcome, JobStatus};
    use std::fs;
    use tempfile::tempdir;

    fn succeeded(rao_result: &str) -> HourlyJobResult {
        let mut result = HourlyJobResult::pending(
            HourPosition::new(12).unwrap(),
            BusinessInterval::parse("2019-01-08T10:00Z/2019-01-08T11:00Z").unwrap(),
        );
        result.status = JobStatus::Success;
        result.outcome = Some(HourOutcome::Success {
            artifacts: HourArtifacts {
                rao_result: rao_result.into(),
                ..Default::default()
            },
            started_at: Utc::now(),
            ended_at: Utc::now(),
        });
        result
    }

    #[test]
    fn json_source_filters_by_day_and_reads_relative_results() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("constraints.json"),
            r#"[
                {"id": "CB_1", "validity": "2019-01-07T23:00Z/2019-01-08T23:00Z",
                 "branch": {"name": "L1", "from_node": "A", "to_node": "B"},
                 "permanent_limit": 1000.0, "tso": "FR"},
                {"id": "CB_2", "validity": "2019-01-09T23:00Z/2019-01-10T23:00Z",
                 "branch": {"name": "L2", "from_node": "A", "to_node": "C"},
                 "permanent_limit": 800.0, "tso": "BE"}
            ]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("rao-12.json"),
            r#"{"activated_actions": {"CO_1": ["PST_1"]}}"#,
        )
        .unwrap();

        let source = JsonConstraintSource::new(dir.path().join("constraints.json"));
        let day = BusinessInterval::parse("2019-01-07T23:00Z/2019-01-08T23:00Z").unwrap();
        let records = source.constraint_records(&day).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "CB_1");

        let actions = source
            .activated_actions(HourPosition::new(12).unwrap(), &succeeded("rao-12.json"))
            .unwrap();
        assert!(actions.for_contingency("CO_1").unwrap().contains("PST_1"));
    }

    #[test]
    fn missing_result_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let source = JsonConstraintSource::new(dir.path().join("constraints.json"));
        let err = source
            .activated_actions(HourPosition::new(12).unwrap(), &succeeded("absent.json"))
            .unwrap_err();
        assert!(matches!(err, CcError::Io(_)));
    }

    #[test]
    fn base_dir_override_resolves_results_elsewhere() {
        let records_dir = tempdir().unwrap();
        let results_dir = tempdir().unwrap();
        fs::write(
            results_dir.path().join("rao-12.json"),
            r#"{"activated_actions": {"CO_2": ["TOPO_1", "PST_2"]}}"#,
        )
        .unwrap();

        let default_source = JsonConstraintSource::new(records_dir.path().join("constraints.json"));
        assert!(matches!(
            default_source
                .activated_actions(HourPosition::new(12).unwrap(), &succeeded("rao-12.json")),
            Err(CcError::Io(_))
        ));

        let source = default_source.with_base_dir(results_dir.path());
        let actions = source
            .activated_actions(HourPosition::new(12).unwrap(), &succeeded("rao-12.json"))
            .unwrap();
        let co_2 = actions.for_contingency("CO_2").unwrap();
        assert!(co_2.contains("TOPO_1") && co_2.contains("PST_2"));
    }

    #[test]
    fn in_memory_source_looks_up_by_reference() {
        let source = InMemoryConstraintSource::new(Vec::new())
            .with_result("rao.json", ActivatedActions::new().with("CO_1", &["TOPO"]));
        let actions = source
            .activated_actions(HourPosition::new(12).unwrap(), &succeeded("rao.json"))
            .unwrap();
        assert!(!actions.is_empty());
        assert!(source
            .activated_actions(HourPosition::new(12).unwrap(), &succeeded("other.json"))
            .is_err());
    }
}
