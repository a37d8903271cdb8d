use crate::master::VersionNumber;
use serde::Serialize;
use std::collections::BTreeSet;

/// Pending work for a run, computed from the master definition and ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionPlan {
    /// Master versions not yet in the ledger, ascending.
    pub pending: Vec<VersionNumber>,
    /// Pending versions older than both the newest master version and the
    /// newest applied version.
    pub missing: Vec<VersionNumber>,
    pub latest_master: Option<VersionNumber>,
    pub latest_applied: Option<VersionNumber>,
}

impl VersionPlan {
    pub fn is_nothing_pending(&self) -> bool {
        self.pending.is_empty()
    }

    /// Missing versions block the run unless forced.
    pub fn is_blocked(&self, force: bool) -> bool {
        !force && !self.missing.is_empty()
    }
}

/// Diff master versions against applied versions.
pub fn plan_versions<I>(master_versions: I, applied: &BTreeSet<VersionNumber>) -> VersionPlan
where
    I: IntoIterator<Item = VersionNumber>,
{
    let master: BTreeSet<VersionNumber> = master_versions.into_iter().collect();
    let latest_master = master.last().copied();
    let latest_applied = applied.last().copied();
    let pending: Vec<VersionNumber> = master.difference(applied).copied().collect();
    let missing = match (latest_master, latest_applied) {
        (Some(latest_master), Some(latest_applied)) => pending
            .iter()
            .copied()
            .filter(|version| *version < latest_master && *version < latest_applied)
            .collect(),
        _ => Vec::new(),
    };
    VersionPlan {
        pending,
        missing,
        latest_master,
        latest_applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(values: &[u32]) -> BTreeSet<VersionNumber> {
        values.iter().copied().map(VersionNumber::new).collect()
    }

    fn numbers(values: &[VersionNumber]) -> Vec<u32> {
        values.iter().map(|version| version.get()).collect()
    }

    #[test]
    fn empty_ledger_applies_everything() {
        let plan = plan_versions(versions(&[1, 2, 3]), &BTreeSet::new());
        assert_eq!(numbers(&plan.pending), vec![1, 2, 3]);
        assert!(plan.missing.is_empty());
        assert_eq!(plan.latest_applied, None);
        assert!(!plan.is_blocked(false));
    }

    #[test]
    fn gap_below_latest_applied_is_missing() {
        let plan = plan_versions(versions(&[1, 2, 3]), &versions(&[1, 3]));
        assert_eq!(numbers(&plan.pending), vec![2]);
        assert_eq!(numbers(&plan.missing), vec![2]);
        assert!(plan.is_blocked(false));
        assert!(!plan.is_blocked(true));
    }

    #[test]
    fn newer_versions_are_pending_not_missing() {
        let plan = plan_versions(versions(&[1, 2, 3, 4]), &versions(&[1, 2]));
        assert_eq!(numbers(&plan.pending), vec![3, 4]);
        assert!(plan.missing.is_empty());
    }

    #[test]
    fn latest_master_version_is_never_missing() {
        let plan = plan_versions(versions(&[1, 2]), &versions(&[1, 5]));
        assert_eq!(numbers(&plan.pending), vec![2]);
        assert!(plan.missing.is_empty());
    }

    #[test]
    fn fully_applied_is_nothing_pending() {
        let plan = plan_versions(versions(&[1, 2]), &versions(&[1, 2]));
        assert!(plan.is_nothing_pending());
    }
}
