//! History command: ledger search from the command line.
use super::ProjectContext;
use crate::cli::{HistoryArgs, HistorySort};
use crate::ledger::{
    Condition, Filter, SearchCriteria, SearchResults, SortDirection, SortField, VersionLedger,
};
use crate::master::VersionNumber;
use anyhow::{Context, Result};
use std::path::Path;

/// List ledger records matching the flags.
pub fn run_history(root: &Path, args: &HistoryArgs) -> Result<()> {
    let project = ProjectContext::load(root)?;
    let ledger = project.open_ledger();
    let results = ledger
        .search(&criteria_for(args))
        .context("search version ledger")?;

    if args.json {
        let text = serde_json::to_string_pretty(&results).context("serialize history")?;
        println!("{text}");
        return Ok(());
    }
    print_results(&results);
    Ok(())
}

fn criteria_for(args: &HistoryArgs) -> SearchCriteria {
    let mut criteria = SearchCriteria::default();
    if let Some(from) = args.from {
        criteria = criteria.filter(Filter::Version {
            condition: Condition::Gteq,
            value: VersionNumber::new(from),
        });
    }
    if let Some(to) = args.to {
        criteria = criteria.filter(Filter::Version {
            condition: Condition::Lteq,
            value: VersionNumber::new(to),
        });
    }
    for filter in &args.filters {
        criteria = criteria.filter(filter.clone());
    }
    let direction = if args.desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };
    let field = match args.sort {
        HistorySort::Version => SortField::Version,
        HistorySort::AppliedAt => SortField::AppliedAt,
    };
    criteria = criteria.sort(field, direction);
    if let Some(page_size) = args.page_size {
        criteria = criteria.page(page_size, args.page);
    }
    criteria
}

fn print_results(results: &SearchResults) {
    if results.items.is_empty() {
        println!("no applied versions");
        return;
    }
    for record in &results.items {
        println!("{:>6}  {}", record.version, record.applied_at.to_rfc3339());
    }
    if results.items.len() < results.total_count {
        println!(
            "showing {} of {} (page {})",
            results.items.len(),
            results.total_count,
            results.criteria.current_page
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> HistoryArgs {
        HistoryArgs {
            from: None,
            to: None,
            filters: Vec::new(),
            sort: HistorySort::Version,
            desc: false,
            page_size: None,
            page: 1,
            json: false,
        }
    }

    #[test]
    fn flags_become_filters_sort_and_page() {
        let criteria = criteria_for(&HistoryArgs {
            from: Some(2),
            to: Some(9),
            filters: vec!["version!=4".parse().expect("filter")],
            sort: HistorySort::AppliedAt,
            desc: true,
            page_size: Some(3),
            page: 2,
            ..args()
        });
        assert_eq!(criteria.filters.len(), 3);
        assert_eq!(criteria.sort_orders[0].field, SortField::AppliedAt);
        assert_eq!(criteria.sort_orders[0].direction, SortDirection::Desc);
        assert_eq!(criteria.page_size, Some(3));
        assert_eq!(criteria.current_page, 2);
    }

    #[test]
    fn default_flags_list_everything_ascending() {
        let criteria = criteria_for(&args());
        assert!(criteria.filters.is_empty());
        assert_eq!(criteria.page_size, None);
        assert_eq!(criteria.sort_orders[0].field, SortField::Version);
    }
}
