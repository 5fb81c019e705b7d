//! Transport-neutral view of an incoming request

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The parts of a request that resolvers, scope functions and rights
/// callbacks may inspect.
///
/// Header names are stored lowercased. Repeated headers are joined with
/// `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// HTTP method (e.g., "GET")
    pub method: String,

    /// Request path without query string
    pub path: String,

    /// Path parameters captured by the router (e.g., `id` for `/orders/:id`)
    #[serde(default)]
    pub params: HashMap<String, String>,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    #[serde(default)]
    pub cookies: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add a path parameter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add a header, joining with any value already present
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.append_header(name.as_ref(), value.into());
        self
    }

    /// Add a cookie
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn append_header(&mut self, name: &str, value: String) {
        self.headers
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let request = RequestContext::new("GET", "/orders/42")
            .with_param("id", "42")
            .with_header("Authorization", "Bearer abc")
            .with_cookie("session", "s-1");

        assert_eq!(request.method, "GET");
        assert_eq!(request.param("id"), Some("42"));
        assert_eq!(request.header("authorization"), Some("Bearer abc"));
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer abc"));
        assert_eq!(request.cookie("session"), Some("s-1"));
        assert_eq!(request.param("missing"), None);
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let request = RequestContext::new("GET", "/")
            .with_header("Accept", "text/html")
            .with_header("accept", "application/json");

        assert_eq!(request.header("accept"), Some("text/html, application/json"));
    }
}
