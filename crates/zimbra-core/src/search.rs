//! Directory search queries.
//!
//! [`SearchQuery`] builds the parameter body of `SearchDirectoryRequest`. Absent
//! fields are left out of the request.

use crate::resource::ResourceKind;
use serde::Serialize;
use serde_json::{Map, Value};

/// Parameters of a directory search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// LDAP filter (`(mail=*@example.test)`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Comma-separated resource types (`accounts,distributionlists`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,

    /// Restrict the search to a domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Page offset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,

    /// Hard cap on matched entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    /// Attribute to sort by
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    /// Sort direction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_ascending: Option<bool>,

    /// Comma-separated attributes to return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attrs: Option<String>,

    /// Return only the total
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count_only: Option<bool>,

    /// Apply class-of-service defaults to returned accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_cos: Option<bool>,
}

impl SearchQuery {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the LDAP filter.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the resource types.
    #[must_use]
    pub fn with_types(mut self, types: impl Into<String>) -> Self {
        self.types = Some(types.into());
        self
    }

    /// Restrict the search to one resource kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ResourceKind) -> Self {
        self.types = kind.search_type().map(str::to_string);
        self
    }

    /// Restrict the search to a domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the page offset.
    #[must_use]
    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the hard cap on matched entries.
    #[must_use]
    pub const fn with_max_results(mut self, max: u32) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Sort by an attribute.
    #[must_use]
    pub fn with_sort(mut self, attribute: impl Into<String>, ascending: bool) -> Self {
        self.sort_by = Some(attribute.into());
        self.sort_ascending = Some(ascending);
        self
    }

    /// Select the returned attributes.
    #[must_use]
    pub fn with_attrs(mut self, attrs: &[&str]) -> Self {
        self.attrs = Some(attrs.join(","));
        self
    }

    /// Only count matches.
    #[must_use]
    pub const fn count_only(mut self) -> Self {
        self.count_only = Some(true);
        self
    }

    /// Apply class-of-service defaults.
    #[must_use]
    pub const fn with_apply_cos(mut self, apply: bool) -> Self {
        self.apply_cos = Some(apply);
        self
    }

    /// Parameter body of the search request.
    #[must_use]
    pub fn to_params(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(params)) => params,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_query_has_no_params() {
        assert!(SearchQuery::new().to_params().is_empty());
    }

    #[test]
    fn params_use_wire_names() {
        let query = SearchQuery::new()
            .with_query("(mail=*@example.test)")
            .with_kind(ResourceKind::DistributionList)
            .with_limit(25)
            .with_offset(50)
            .with_sort("name", true)
            .with_attrs(&["mail", "displayName"]);

        assert_eq!(
            Value::Object(query.to_params()),
            json!({
                "query": "(mail=*@example.test)",
                "types": "distributionlists",
                "limit": 25,
                "offset": 50,
                "sortBy": "name",
                "sortAscending": true,
                "attrs": "mail,displayName"
            })
        );
    }

    #[test]
    fn count_only_and_domain() {
        let params = SearchQuery::new()
            .with_domain("example.test")
            .with_max_results(10)
            .with_apply_cos(false)
            .count_only()
            .to_params();
        assert_eq!(params["domain"], "example.test");
        assert_eq!(params["maxResults"], 10);
        assert_eq!(params["countOnly"], true);
        assert_eq!(params["applyCos"], false);
    }
}
