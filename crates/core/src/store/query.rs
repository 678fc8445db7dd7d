//! Query-string construction for Record Store reads.
//!
//! The store expects `qs`-style bracket notation: nested keys flatten to
//! pairs such as `filters[$or][0][doctor][name][$contains]=jo`, with the
//! values percent-encoded and the bracketed keys left literal.

use serde_json::{json, Map, Value};

use crate::context::RequestContext;

/// Page request forwarded to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

/// One collection read: pagination, filters, population and sort order.
///
/// `encode` emits the parts in a fixed order (pagination, filters,
/// populate, sort) and object keys alphabetically, so equal queries always
/// serialize to the same string.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pagination: Option<PageRequest>,
    filters: Option<Value>,
    populate: Option<Value>,
    sort: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paginate(mut self, page: u32, page_size: u32) -> Self {
        self.pagination = Some(PageRequest { page, page_size });
        self
    }

    /// Merges one top-level filter key into the existing tree, replacing
    /// any previous predicate under the same key.
    pub fn filter(mut self, key: &str, predicate: Value) -> Self {
        let mut tree = match self.filters.take() {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        tree.insert(key.to_string(), predicate);
        self.filters = Some(Value::Object(tree));
        self
    }

    pub fn populate(mut self, populate: Value) -> Self {
        self.populate = Some(populate);
        self
    }

    pub fn sort(mut self, order: &str) -> Self {
        self.sort.push(order.to_string());
        self
    }

    /// Pins the query to one organization, replacing any caller-supplied
    /// organization predicate. Every scoped read passes through here, so a
    /// caller cannot widen its tenant scope.
    pub fn scoped_to(self, ctx: &RequestContext) -> Self {
        self.filter(
            "organization",
            json!({ "id": { "$eq": ctx.organization_id } }),
        )
    }

    /// Renders the query string without a leading `?`; empty when nothing
    /// was set.
    pub fn encode(&self) -> String {
        let mut pairs: Vec<(String, String)> = Vec::new();
        if let Some(page) = &self.pagination {
            pairs.push(("pagination[page]".to_string(), page.page.to_string()));
            pairs.push(("pagination[pageSize]".to_string(), page.page_size.to_string()));
        }
        if let Some(filters) = &self.filters {
            flatten("filters", filters, &mut pairs);
        }
        if let Some(populate) = &self.populate {
            flatten("populate", populate, &mut pairs);
        }
        for (index, order) in self.sort.iter().enumerate() {
            pairs.push((format!("sort[{index}]"), order.clone()));
        }

        pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Depth-first bracket flattening: objects nest as `[key]`, arrays as
/// `[index]`, leaves become the pair's value. Nulls are omitted entirely.
fn flatten(prefix: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten(&format!("{prefix}[{key}]"), child, pairs);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten(&format!("{prefix}[{index}]"), child, pairs);
            }
        }
        Value::Null => {}
        Value::String(text) => pairs.push((prefix.to_string(), text.clone())),
        other => pairs.push((prefix.to_string(), other.to_string())),
    }
}
