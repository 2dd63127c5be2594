//! The parameter digest of a list query key

use listwise_core::{CrudFilters, CrudSorting, Meta, Pagination};
use serde::Serialize;
use serde_json::Value;

/// Parameters that identify a list query.
///
/// Meta is included only when non-empty, pagination only in server mode and
/// sorters only when there are any. Client and off pagination fetch the
/// whole collection, so the window is not part of the identity.
#[derive(Debug, Clone, Serialize)]
pub struct ListKeyParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<Meta>,
    filters: CrudFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sorters: Option<CrudSorting>,
}

impl ListKeyParams {
    pub fn new(
        meta: &Meta,
        filters: &CrudFilters,
        pagination: &Pagination,
        sorters: &CrudSorting,
    ) -> Self {
        Self {
            meta: (!meta.is_empty()).then(|| meta.clone()),
            filters: filters.clone(),
            pagination: pagination.is_server().then_some(*pagination),
            sorters: (!sorters.is_empty()).then(|| sorters.clone()),
        }
    }

    pub fn to_value(&self) -> Value {
        // Only maps with string keys and plain data; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listwise_core::{CrudFilter, CrudSort, PaginationMode};
    use serde_json::json;

    #[test]
    fn test_server_pagination_is_included() {
        let params = ListKeyParams::new(
            &Meta::new(),
            &vec![],
            &Pagination::new(1, 10, PaginationMode::Server),
            &vec![],
        );
        assert_eq!(
            params.to_value(),
            json!({"filters": [], "pagination": {"currentPage": 1, "pageSize": 10, "mode": "server"}})
        );
    }

    #[test]
    fn test_client_and_off_pagination_are_excluded() {
        for mode in [PaginationMode::Client, PaginationMode::Off] {
            let params =
                ListKeyParams::new(&Meta::new(), &vec![], &Pagination::new(2, 5, mode), &vec![]);
            assert_eq!(params.to_value(), json!({"filters": []}));
        }
    }

    #[test]
    fn test_meta_and_sorters_when_present() {
        let params = ListKeyParams::new(
            &Meta::new().with("locale", "en"),
            &vec![CrudFilter::eq("status", "draft")],
            &Pagination::new(1, 10, PaginationMode::Off),
            &vec![CrudSort::asc("title")],
        );
        assert_eq!(
            params.to_value(),
            json!({
                "meta": {"locale": "en"},
                "filters": [{"field": "status", "operator": "eq", "value": "draft"}],
                "sorters": [{"field": "title", "order": "asc"}]
            })
        );
    }
}
