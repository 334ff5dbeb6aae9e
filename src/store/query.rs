//! Query descriptors: the small declarative surface the clinic operations use
//! against a collection. Equality filters, an optional single-field ordering
//! and an optional limit cover every query the dashboards and services issue.

use std::cmp::Ordering as CmpOrdering;

use serde_json::Value;

use super::Fields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: String, value: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub ordering: Option<Ordering>,
    pub limit: Option<usize>,
}

impl QueryDescriptor {
    pub fn collection(name: impl Into<String>) -> Self {
        Self { collection: name.into(), filters: Vec::new(), ordering: None, limit: None }
    }

    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq { field: field.into(), value: value.into() });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.ordering = Some(Ordering { field: field.into(), direction });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document's fields satisfy every filter.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters.iter().all(|filter| match filter {
            Filter::Eq { field, value } => fields.get(field) == Some(value),
        })
    }
}

/// Field comparison for ordering: absent and null sort first, numbers compare
/// numerically, strings lexicographically. Mixed types fall back to their JSON
/// rendering so the sort stays total.
pub(crate) fn value_cmp(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (Some(x), Some(y)) => {
            if let (Some(n), Some(m)) = (x.as_f64(), y.as_f64()) {
                n.partial_cmp(&m).unwrap_or(CmpOrdering::Equal)
            } else if let (Some(s), Some(t)) = (x.as_str(), y.as_str()) {
                s.cmp(t)
            } else {
                x.to_string().cmp(&y.to_string())
            }
        }
    }
}
