//! Filter / sort / paginate over ledger records.
use super::VersionRecord;
use crate::master::VersionNumber;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

/// Comparison applied by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Eq,
    Neq,
    Lt,
    Lteq,
    Gt,
    Gteq,
}

impl Condition {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Condition::Eq => ordering == Ordering::Equal,
            Condition::Neq => ordering != Ordering::Equal,
            Condition::Lt => ordering == Ordering::Less,
            Condition::Lteq => ordering != Ordering::Greater,
            Condition::Gt => ordering == Ordering::Greater,
            Condition::Gteq => ordering != Ordering::Less,
        }
    }
}

/// A typed field filter; all filters of a search must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "field")]
pub enum Filter {
    Version {
        condition: Condition,
        value: VersionNumber,
    },
    AppliedAt {
        condition: Condition,
        value: DateTime<Utc>,
    },
}

/// Operators in match order; two-character ones first.
const OPERATORS: [(&str, Condition); 6] = [
    ("!=", Condition::Neq),
    ("<=", Condition::Lteq),
    (">=", Condition::Gteq),
    ("=", Condition::Eq),
    ("<", Condition::Lt),
    (">", Condition::Gt),
];

/// Parses `field<op>value`, e.g. `version>=3` or
/// `applied_at<2026-01-01T00:00:00Z`.
impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (at, operator, condition) = OPERATORS
            .iter()
            .filter_map(|(operator, condition)| {
                s.find(operator).map(|at| (at, *operator, *condition))
            })
            .min_by_key(|(at, _, _)| *at)
            .ok_or_else(|| format!("filter {s:?} has no operator (=, !=, <, <=, >, >=)"))?;
        let field = s[..at].trim();
        let value = s[at + operator.len()..].trim();
        match field {
            "version" => value
                .parse()
                .map(|value| Filter::Version { condition, value })
                .map_err(|err| format!("filter {s:?}: invalid version {value:?}: {err}")),
            "applied_at" => DateTime::parse_from_rfc3339(value)
                .map(|value| Filter::AppliedAt {
                    condition,
                    value: value.with_timezone(&Utc),
                })
                .map_err(|err| format!("filter {s:?}: invalid RFC 3339 time {value:?}: {err}")),
            other => Err(format!(
                "filter {s:?}: unknown field {other:?} (expected version or applied_at)"
            )),
        }
    }
}

impl Filter {
    fn matches(&self, record: &VersionRecord) -> bool {
        match self {
            Filter::Version { condition, value } => condition.accepts(record.version.cmp(value)),
            Filter::AppliedAt { condition, value } => {
                condition.accepts(record.applied_at.cmp(value))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Version,
    AppliedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    fn compare(&self, a: &VersionRecord, b: &VersionRecord) -> Ordering {
        let ordering = match self.field {
            SortField::Version => a.version.cmp(&b.version),
            SortField::AppliedAt => a.applied_at.cmp(&b.applied_at),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Search request; pages are 1-based and `page_size: None` returns all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCriteria {
    pub filters: Vec<Filter>,
    pub sort_orders: Vec<SortOrder>,
    pub page_size: Option<usize>,
    pub current_page: usize,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort_orders: Vec::new(),
            page_size: None,
            current_page: 1,
        }
    }
}

impl SearchCriteria {
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort_orders.push(SortOrder { field, direction });
        self
    }

    pub fn page(mut self, page_size: usize, current_page: usize) -> Self {
        self.page_size = Some(page_size);
        self.current_page = current_page;
        self
    }
}

/// Matching page plus the total count before pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub criteria: SearchCriteria,
    pub total_count: usize,
    pub items: Vec<VersionRecord>,
}

/// Apply `criteria` to `records`; ties fall back to ascending version.
pub fn search_records(records: Vec<VersionRecord>, criteria: &SearchCriteria) -> SearchResults {
    let mut items: Vec<VersionRecord> = records
        .into_iter()
        .filter(|record| criteria.filters.iter().all(|filter| filter.matches(record)))
        .collect();
    items.sort_by(|a, b| {
        criteria
            .sort_orders
            .iter()
            .map(|order| order.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.version.cmp(&b.version))
    });
    let total_count = items.len();
    if let Some(page_size) = criteria.page_size.filter(|size| *size > 0) {
        let skip = criteria.current_page.saturating_sub(1).saturating_mul(page_size);
        items = items.into_iter().skip(skip).take(page_size).collect();
    }
    SearchResults {
        criteria: criteria.clone(),
        total_count,
        items,
    }
}
