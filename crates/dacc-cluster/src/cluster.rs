//! Daily clustering of hourly constraint records.
//!
//! For every native constraint id, walk the day hour by hour and decide what
//! that hour contributes:
//!
//! | hour state                                         | records emitted                                  |
//! |----------------------------------------------------|--------------------------------------------------|
//! | not requested, failed, or no action after outage   | `id`: PATL                                       |
//! | succeeded with actions after the record's outage   | `id_OUTAGE`: TATL, `id_CURATIVE`: PATL + variant |
//!
//! Records for consecutive hours that share an id and all other fields are
//! folded into one record spanning both hours. Variants are never folded: each
//! (hour, contingency) pair gets its own id, so `_CURATIVE` records stay hourly.

use std::collections::{BTreeMap, HashMap};

use chrono_tz::Tz;
use dacc_core::{partition_into_hours, variant_identifier, BusinessInterval, CcResult, HourPosition};
use dacc_jobs::HourlyJobResult;

use crate::record::{
    ActivatedActions, ClusteredConstraint, ClusteredDailyDocument, ConstraintRecord, LimitKind,
    RemedialVariant,
};

/// Suffix of the temporary-limit copy of a split record.
pub const TEMPORARY_SUFFIX: &str = "_OUTAGE";
/// Suffix of the permanent-limit copy of a split record.
pub const PERMANENT_SUFFIX: &str = "_CURATIVE";

/// Everything the clustering needs about one completed day.
pub struct ClusteringInput<'a> {
    pub day: BusinessInterval,
    /// Results of the requested hours; absent positions were never requested.
    pub results: &'a BTreeMap<HourPosition, HourlyJobResult>,
    /// All native record versions overlapping the day.
    pub records: &'a [ConstraintRecord],
    /// Activated actions of successful hours.
    pub activated: &'a BTreeMap<HourPosition, ActivatedActions>,
    pub timezone: Tz,
}

pub fn cluster_day(input: &ClusteringInput<'_>) -> CcResult<ClusteredDailyDocument> {
    let hours = partition_into_hours(&input.day);
    let (variants, variant_by_outage) = build_variants(input, &hours);

    let mut versions_by_id: BTreeMap<&str, Vec<&ConstraintRecord>> = BTreeMap::new();
    for record in input.records {
        versions_by_id.entry(record.id.as_str()).or_default().push(record);
    }

    let mut constraints = Vec::new();
    for versions in versions_by_id.values() {
        let mut merger = IntervalMerger::default();
        for (position, hour) in &hours {
            let Some(record) = version_for_hour(versions, hour) else {
                continue;
            };
            let variant = record
                .contingency
                .as_deref()
                .and_then(|outage| variant_by_outage.get(&(*position, outage)));
            match variant {
                None => merger.push(permanent_record(record, *hour, None))?,
                Some(variant) => {
                    merger.push(temporary_record(record, *hour))?;
                    merger.push(permanent_record(record, *hour, Some(variant)))?;
                }
            }
        }
        constraints.extend(merger.finish());
    }

    Ok(ClusteredDailyDocument {
        business_day: input.day,
        constraints,
        variants,
    })
}

/// One variant per (successful hour, contingency with activated actions).
fn build_variants<'a>(
    input: &'a ClusteringInput<'_>,
    hours: &BTreeMap<HourPosition, BusinessInterval>,
) -> (Vec<RemedialVariant>, HashMap<(HourPosition, &'a str), String>) {
    let mut variants = Vec::new();
    let mut by_outage = HashMap::new();
    for (position, hour) in hours {
        let succeeded = input
            .results
            .get(position)
            .is_some_and(HourlyJobResult::is_success);
        let Some(activated) = input.activated.get(position).filter(|_| succeeded) else {
            continue;
        };
        for (sequence, (contingency, actions)) in (1u32..).zip(activated.iter()) {
            let id = variant_identifier(hour.start(), sequence, input.timezone);
            by_outage.insert((*position, contingency), id.clone());
            variants.push(RemedialVariant {
                id,
                position: *position,
                interval: *hour,
                contingency: contingency.to_string(),
                actions: actions.iter().cloned().collect(),
            });
        }
    }
    (variants, by_outage)
}

/// The version whose validity contains the hour's midpoint; the latest-starting
/// one wins when versions overlap.
fn version_for_hour<'a>(
    versions: &[&'a ConstraintRecord],
    hour: &BusinessInterval,
) -> Option<&'a ConstraintRecord> {
    let midpoint = hour.midpoint();
    versions
        .iter()
        .copied()
        .filter(|record| record.validity.contains(midpoint))
        .max_by_key(|record| record.validity.start())
}

fn permanent_record(
    record: &ConstraintRecord,
    hour: BusinessInterval,
    variant: Option<&String>,
) -> ClusteredConstraint {
    let id = match variant {
        Some(_) => format!("{}{PERMANENT_SUFFIX}", record.id),
        None => record.id.clone(),
    };
    ClusteredConstraint {
        id,
        original_id: record.id.clone(),
        interval: hour,
        contingency: record.contingency.clone(),
        branch: record.branch.clone(),
        limit_kind: LimitKind::Permanent,
        limit: record.permanent_limit,
        frm: record.frm,
        tso: record.tso.clone(),
        variant: variant.cloned(),
    }
}

fn temporary_record(record: &ConstraintRecord, hour: BusinessInterval) -> ClusteredConstraint {
    ClusteredConstraint {
        id: format!("{}{TEMPORARY_SUFFIX}", record.id),
        original_id: record.id.clone(),
        interval: hour,
        contingency: record.contingency.clone(),
        branch: record.branch.clone(),
        limit_kind: LimitKind::Temporary,
        limit: record.effective_temporary_limit(),
        frm: record.frm,
        tso: record.tso.clone(),
        variant: None,
    }
}

/// Folds each id's records over adjacent intervals while content is equal.
#[derive(Default)]
struct IntervalMerger {
    records: Vec<ClusteredConstraint>,
    last_by_id: HashMap<String, usize>,
}

impl IntervalMerger {
    fn push(&mut self, next: ClusteredConstraint) -> CcResult<()> {
        if let Some(&index) = self.last_by_id.get(&next.id) {
            let last = &mut self.records[index];
            if last.interval.is_followed_by(&next.interval) && last.same_content(&next) {
                last.interval = last.interval.spanning(&next.interval)?;
                return Ok(());
            }
        }
        self.last_by_id.insert(next.id.clone(), self.records.len());
        self.records.push(next);
        Ok(())
    }

    fn finish(self) -> Vec<ClusteredConstraint> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MonitoredBranch;
    use chrono::Utc;
    use chrono_tz::Europe::Brussels;
    use dacc_jobs::{HourArtifacts, HourOutcome, HourlyErrorKind, JobStatus};

    fn day() -> BusinessInterval {
        BusinessInterval::parse("2019-01-07T23:00Z/2019-01-08T23:00Z").unwrap()
    }

    fn pos(value: u32) -> HourPosition {
        HourPosition::new(value).unwrap()
    }

    fn record(id: &str, contingency: Option<&str>, validity: &str, patl: f64) -> ConstraintRecord {
        ConstraintRecord {
            id: id.to_string(),
            validity: BusinessInterval::parse(validity).unwrap(),
            contingency: contingency.map(str::to_string),
            branch: MonitoredBranch {
                name: format!("{id} line"),
                from_node: "FFG.IL11".into(),
                to_node: "FFNGEN11".into(),
                order_code: "1".into(),
                direction: Default::default(),
            },
            permanent_limit: patl,
            temporary_limit: Some(patl + 200.0),
            frm: 50.0,
            tso: "FR".into(),
        }
    }

    fn result(position: u32, ok: bool) -> (HourPosition, HourlyJobResult) {
        result_in(day(), position, ok)
    }

    fn result_in(
        day: BusinessInterval,
        position: u32,
        ok: bool,
    ) -> (HourPosition, HourlyJobResult) {
        let interval = partition_into_hours(&day)[&pos(position)];
        let mut result = HourlyJobResult::pending(pos(position), interval);
        if ok {
            result.status = JobStatus::Success;
            result.outcome = Some(HourOutcome::Success {
                artifacts: HourArtifacts::default(),
                started_at: Utc::now(),
                ended_at: Utc::now(),
            });
        } else {
            result.status = JobStatus::Failure;
            result.outcome = Some(HourOutcome::failure(
                HourlyErrorKind::OptimizationFailure,
                "no convergence",
            ));
        }
        (pos(position), result)
    }

    fn cluster(
        records: &[ConstraintRecord],
        results: &BTreeMap<HourPosition, HourlyJobResult>,
        activated: &BTreeMap<HourPosition, ActivatedActions>,
    ) -> ClusteredDailyDocument {
        cluster_in(day(), records, results, activated)
    }

    fn cluster_in(
        day: BusinessInterval,
        records: &[ConstraintRecord],
        results: &BTreeMap<HourPosition, HourlyJobResult>,
        activated: &BTreeMap<HourPosition, ActivatedActions>,
    ) -> ClusteredDailyDocument {
        cluster_day(&ClusteringInput {
            day,
            results,
            records,
            activated,
            timezone: Brussels,
        })
        .unwrap()
    }

    const DAY: &str = "2019-01-07T23:00Z/2019-01-08T23:00Z";

    #[test]
    fn unrequested_day_collapses_to_one_record() {
        let records = [record("CB_1", Some("CO_1"), DAY, 1000.0)];
        let doc = cluster(&records, &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(doc.constraints.len(), 1);
        assert_eq!(doc.constraints[0].interval, day());
        assert_eq!(doc.constraints[0].limit_kind, LimitKind::Permanent);
        assert!(doc.variants.is_empty());
    }

    #[test]
    fn activated_hour_splits_and_blocks_merge() {
        let records = [record("CB_1", Some("CO_1"), DAY, 1000.0)];
        let results: BTreeMap<_, _> = [result(10, true), result(11, true)].into();
        let activated: BTreeMap<_, _> = [
            (pos(10), ActivatedActions::new()),
            (pos(11), ActivatedActions::new().with("CO_1", &["PST_1"])),
        ]
        .into();
        let doc = cluster(&records, &results, &activated);

        let ids: Vec<_> = doc
            .constraints
            .iter()
            .map(|c| (c.id.as_str(), c.interval.to_string()))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("CB_1", "2019-01-07T23:00Z/2019-01-08T09:00Z".to_string()),
                ("CB_1_OUTAGE", "2019-01-08T09:00Z/2019-01-08T10:00Z".to_string()),
                ("CB_1_CURATIVE", "2019-01-08T09:00Z/2019-01-08T10:00Z".to_string()),
                ("CB_1", "2019-01-08T10:00Z/2019-01-08T23:00Z".to_string()),
            ]
        );
        let curative = &doc.constraints[2];
        assert_eq!(curative.variant.as_deref(), Some("CRA_10_001"));
        assert_eq!(curative.limit, 1000.0);
        assert_eq!(doc.constraints[1].limit, 1200.0);
        assert_eq!(doc.original_of("CB_1_OUTAGE"), Some("CB_1"));
        assert_eq!(doc.original_of("CB_1_CURATIVE"), Some("CB_1"));
    }

    #[test]
    fn outage_copies_merge_but_curative_copies_do_not() {
        let records = [record("CB_1", Some("CO_1"), DAY, 1000.0)];
        let results: BTreeMap<_, _> = [result(5, true), result(6, true)].into();
        let actions = ActivatedActions::new().with("CO_1", &["TOPO_1"]);
        let activated: BTreeMap<_, _> = [(pos(5), actions.clone()), (pos(6), actions)].into();
        let doc = cluster(&records, &results, &activated);

        let outage: Vec<_> = doc
            .constraints
            .iter()
            .filter(|c| c.id == "CB_1_OUTAGE")
            .collect();
        assert_eq!(outage.len(), 1);
        assert_eq!(outage[0].interval.duration().num_hours(), 2);
        let curative: Vec<_> = doc
            .constraints
            .iter()
            .filter(|c| c.id == "CB_1_CURATIVE")
            .collect();
        assert_eq!(curative.len(), 2);
        assert_ne!(curative[0].variant, curative[1].variant);
        assert_eq!(doc.variants.len(), 2);
    }

    #[test]
    fn failed_hour_keeps_permanent_limit_only() {
        let records = [record("CB_1", Some("CO_1"), DAY, 1000.0)];
        let results: BTreeMap<_, _> = [result(3, false)].into();
        let activated: BTreeMap<_, _> =
            [(pos(3), ActivatedActions::new().with("CO_1", &["PST_1"]))].into();
        let doc = cluster(&records, &results, &activated);
        assert_eq!(doc.constraints.len(), 1);
        assert!(doc.variants.is_empty());
    }

    #[test]
    fn differing_limits_split_adjacent_hours() {
        let records = [
            record(
                "CB_1",
                None,
                "2019-01-07T23:00Z/2019-01-08T11:00Z",
                1000.0,
            ),
            record("CB_1", None, "2019-01-08T11:00Z/2019-01-08T23:00Z", 900.0),
        ];
        let doc = cluster(&records, &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(doc.constraints.len(), 2);
        assert_eq!(doc.constraints[0].limit, 1000.0);
        assert_eq!(doc.constraints[1].limit, 900.0);
        assert!(doc.constraints[0]
            .interval
            .is_followed_by(&doc.constraints[1].interval));
    }

    #[test]
    fn version_is_chosen_by_hour_midpoint() {
        // Both versions contain 11:30Z, the later one takes that hour.
        let records = [
            record("CB_1", None, "2019-01-07T23:00Z/2019-01-08T11:45Z", 1000.0),
            record("CB_1", None, "2019-01-08T11:15Z/2019-01-08T23:00Z", 900.0),
        ];
        let doc = cluster(&records, &BTreeMap::new(), &BTreeMap::new());
        let first = &doc.constraints[0];
        assert_eq!(first.limit, 1000.0);
        assert_eq!(
            first.interval.to_string(),
            "2019-01-07T23:00Z/2019-01-08T11:00Z"
        );
    }

    #[test]
    fn hours_outside_record_validity_emit_nothing() {
        let records = [record("CB_1", None, "2019-01-08T05:00Z/2019-01-08T07:00Z", 1000.0)];
        let doc = cluster(&records, &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(doc.constraints.len(), 1);
        assert_eq!(doc.constraints[0].interval.duration().num_hours(), 2);
    }

    #[test]
    fn repeated_fall_back_hour_gets_distinct_variant_ids() {
        const FALL_BACK: &str = "2019-10-26T22:00Z/2019-10-27T23:00Z";
        let fall_back = BusinessInterval::parse(FALL_BACK).unwrap();
        let records = [record("CB_1", Some("CO_1"), FALL_BACK, 1000.0)];
        // Positions 3 and 4 both start at local 02:00.
        let results: BTreeMap<_, _> =
            [result_in(fall_back, 3, true), result_in(fall_back, 4, true)].into();
        let actions = ActivatedActions::new().with("CO_1", &["PST_1"]);
        let activated: BTreeMap<_, _> = [(pos(3), actions.clone()), (pos(4), actions)].into();
        let doc = cluster_in(fall_back, &records, &results, &activated);

        let ids: Vec<_> = doc.variants.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["CRA_02_001", "CRA_B2_001"]);

        let first = doc.variant("CRA_02_001").unwrap();
        assert_eq!(first.position, pos(3));
        assert_eq!(
            first.interval.to_string(),
            "2019-10-27T00:00Z/2019-10-27T01:00Z"
        );
        let repeated = doc.variant("CRA_B2_001").unwrap();
        assert_eq!(repeated.position, pos(4));
        assert_eq!(
            repeated.interval.to_string(),
            "2019-10-27T01:00Z/2019-10-27T02:00Z"
        );

        let curative: Vec<_> = doc
            .constraints_for("CB_1")
            .filter(|c| c.id == "CB_1_CURATIVE")
            .map(|c| c.variant.as_deref())
            .collect();
        assert_eq!(curative, vec![Some("CRA_02_001"), Some("CRA_B2_001")]);
        let outage: Vec<_> = doc
            .constraints_for("CB_1")
            .filter(|c| c.id == "CB_1_OUTAGE")
            .collect();
        assert_eq!(outage.len(), 1);
        assert_eq!(outage[0].interval.duration().num_hours(), 2);
        assert_eq!(doc.constraints_for("CB_1").count(), 5);
        assert_eq!(doc.constraints_for("CB_2").count(), 0);
    }
}
