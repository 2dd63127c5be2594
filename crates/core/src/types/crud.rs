//! Filter and sort descriptors passed through to data providers.
//!
//! These are opaque to the query orchestrator: they are forwarded unmodified
//! and included verbatim in cache keys. Their serialized shape follows the
//! conventional `{field, operator, value}` / `{field, order}` JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operators for a single-field filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudOperator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    In,
    Nin,
    Ina,
    Nina,
    Contains,
    Ncontains,
    Containss,
    Ncontainss,
    Between,
    Nbetween,
    Null,
    Nnull,
    Startswith,
    Nstartswith,
    Startswiths,
    Nstartswiths,
    Endswith,
    Nendswith,
    Endswiths,
    Nendswiths,
}

/// Operators that combine nested filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionalOperator {
    And,
    Or,
}

/// A filter descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CrudFilter {
    /// Compare one field against a value
    Logical {
        field: String,
        operator: CrudOperator,
        value: Value,
    },
    /// Combine nested filters with `and`/`or`
    Conditional {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        operator: ConditionalOperator,
        value: Vec<CrudFilter>,
    },
}

impl CrudFilter {
    pub fn logical(field: impl Into<String>, operator: CrudOperator, value: impl Into<Value>) -> Self {
        CrudFilter::Logical {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::logical(field, CrudOperator::Eq, value)
    }

    pub fn and(filters: Vec<CrudFilter>) -> Self {
        CrudFilter::Conditional {
            key: None,
            operator: ConditionalOperator::And,
            value: filters,
        }
    }

    pub fn or(filters: Vec<CrudFilter>) -> Self {
        CrudFilter::Conditional {
            key: None,
            operator: ConditionalOperator::Or,
            value: filters,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// A sort descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrudSort {
    pub field: String,
    pub order: SortOrder,
}

impl CrudSort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

pub type CrudFilters = Vec<CrudFilter>;
pub type CrudSorting = Vec<CrudSort>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_logical_filter_shape() {
        let filter = CrudFilter::eq("status", "published");
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"field": "status", "operator": "eq", "value": "published"})
        );
    }

    #[test]
    fn test_conditional_filter_roundtrips() {
        let raw = json!({
            "operator": "or",
            "value": [
                {"field": "views", "operator": "gte", "value": 100},
                {"field": "title", "operator": "contains", "value": "rust"}
            ]
        });
        let filter: CrudFilter = serde_json::from_value(raw.clone()).unwrap();
        match &filter {
            CrudFilter::Conditional { operator, value, key } => {
                assert_eq!(*operator, ConditionalOperator::Or);
                assert_eq!(value.len(), 2);
                assert!(key.is_none());
            }
            other => panic!("expected conditional filter, got {other:?}"),
        }
        assert_eq!(serde_json::to_value(&filter).unwrap(), raw);
    }

    #[test]
    fn test_sort_shape() {
        assert_eq!(
            serde_json::to_value(CrudSort::desc("createdAt")).unwrap(),
            json!({"field": "createdAt", "order": "desc"})
        );
    }
}
