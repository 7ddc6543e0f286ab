//! Constraint records before and after clustering.

use std::collections::{BTreeMap, BTreeSet};

use dacc_core::{BusinessInterval, HourPosition};
use serde::{Deserialize, Serialize};

/// Flow direction a limit applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Direct,
    Opposite,
    #[default]
    Both,
}

/// Grid element whose flow is monitored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitoredBranch {
    pub name: String,
    pub from_node: String,
    pub to_node: String,
    #[serde(default)]
    pub order_code: String,
    #[serde(default)]
    pub direction: Direction,
}

/// One native version of a critical branch definition.
///
/// Several versions may share an `id`; each one only applies inside its own
/// `validity` window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    pub id: String,
    pub validity: BusinessInterval,
    /// Outage after which the branch is monitored; `None` for the base case.
    #[serde(default)]
    pub contingency: Option<String>,
    pub branch: MonitoredBranch,
    /// PATL, in amperes.
    pub permanent_limit: f64,
    /// TATL, in amperes; the PATL applies when absent.
    #[serde(default)]
    pub temporary_limit: Option<f64>,
    /// Flow reliability margin, in MW.
    #[serde(default)]
    pub frm: f64,
    pub tso: String,
}

impl ConstraintRecord {
    pub fn effective_temporary_limit(&self) -> f64 {
        self.temporary_limit.unwrap_or(self.permanent_limit)
    }
}

/// Remedial actions activated by one hour's optimization, per contingency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivatedActions(BTreeMap<String, BTreeSet<String>>);

impl ActivatedActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, contingency: &str, actions: &[&str]) -> Self {
        self.0
            .entry(contingency.to_string())
            .or_default()
            .extend(actions.iter().map(|a| a.to_string()));
        self
    }

    /// Actions for `contingency`, if at least one was activated.
    pub fn for_contingency(&self, contingency: &str) -> Option<&BTreeSet<String>> {
        self.0.get(contingency).filter(|actions| !actions.is_empty())
    }

    /// Contingencies with at least one activated action, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.0
            .iter()
            .filter(|(_, actions)| !actions.is_empty())
            .map(|(contingency, actions)| (contingency.as_str(), actions))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    Permanent,
    Temporary,
}

/// Output record: a constraint valid over a (possibly widened) interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredConstraint {
    pub id: String,
    /// Identifier of the native record this one was built from.
    pub original_id: String,
    pub interval: BusinessInterval,
    pub contingency: Option<String>,
    pub branch: MonitoredBranch,
    pub limit_kind: LimitKind,
    pub limit: f64,
    pub frm: f64,
    pub tso: String,
    /// Remedial-action variant applied after the contingency.
    pub variant: Option<String>,
}

impl ClusteredConstraint {
    /// Equality of every field except the interval. Floats compare bit-for-bit.
    pub fn same_content(&self, other: &Self) -> bool {
        self.id == other.id
            && self.original_id == other.original_id
            && self.contingency == other.contingency
            && self.branch == other.branch
            && self.limit_kind == other.limit_kind
            && self.limit.to_bits() == other.limit.to_bits()
            && self.frm.to_bits() == other.frm.to_bits()
            && self.tso == other.tso
            && self.variant == other.variant
    }
}

/// Remedial actions activated after one contingency in one hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemedialVariant {
    pub id: String,
    pub position: HourPosition,
    pub interval: BusinessInterval,
    pub contingency: String,
    pub actions: Vec<String>,
}

/// The aggregate of one business day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredDailyDocument {
    pub business_day: BusinessInterval,
    pub constraints: Vec<ClusteredConstraint>,
    pub variants: Vec<RemedialVariant>,
}

impl ClusteredDailyDocument {
    /// Original native identifier behind an output record id.
    pub fn original_of(&self, id: &str) -> Option<&str> {
        self.constraints
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.original_id.as_str())
    }

    /// Output records built from one native record, in time order.
    pub fn constraints_for<'a>(
        &'a self,
        original_id: &'a str,
    ) -> impl Iterator<Item = &'a ClusteredConstraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| c.original_id == original_id)
    }

    pub fn variant(&self, id: &str) -> Option<&RemedialVariant> {
        self.variants.iter().find(|v| v.id == id)
    }
}
