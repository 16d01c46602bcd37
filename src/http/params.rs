//! Unified request parameters.
//!
//! Query-string and body values land in one namespace. Query values are
//! parsed first; body values never overwrite a key that is already present.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde_json::{Map, Value};

/// Merged query and body parameters, plus the raw parsed body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Map<String, Value>,
    body: Option<Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// The parsed request body, if one was sent.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add a query-string pair. Repeated keys collect into an array.
    pub fn append_query(&mut self, key: &str, value: &str) {
        let value = Value::String(value.to_string());
        match self.values.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.values.insert(key.to_string(), value);
            }
        }
    }

    /// Merge body fields without overriding existing keys.
    pub fn merge_body_fields(&mut self, fields: &Map<String, Value>) {
        for (key, value) in fields {
            self.values
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }
}

impl<S> FromRequestParts<S> for Params
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Params>().cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repeated_query_keys_become_arrays() {
        let mut params = Params::new();
        params.append_query("tag", "a");
        params.append_query("tag", "b");
        params.append_query("tag", "c");
        params.append_query("page", "2");

        assert_eq!(params.get("tag"), Some(&json!(["a", "b", "c"])));
        assert_eq!(params.get_str("page"), Some("2"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn body_fields_do_not_override_query() {
        let mut params = Params::new();
        params.append_query("id", "from-query");
        let body = json!({"id": "from-body", "name": "widget"});
        params.merge_body_fields(body.as_object().unwrap());
        params.set_body(body.clone());

        assert_eq!(params.get_str("id"), Some("from-query"));
        assert_eq!(params.get_str("name"), Some("widget"));
        assert_eq!(params.body(), Some(&body));
    }
}
