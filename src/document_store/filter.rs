//! # Equality Filters
//!
//! Filters are conjunctions of field equality tests. Range queries and joins
//! are not supported by design of the catalog layout.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single `field == value` condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// Field to filter on
    pub field: String,

    /// Value the field must equal
    pub value: Value,
}

impl FilterExpr {
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }

    /// Check if a document matches this condition
    pub fn matches(&self, doc: &Value) -> bool {
        doc.get(&self.field)
            .map(|v| v == &self.value)
            .unwrap_or(false)
    }
}

/// Conjunction of equality conditions. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub exprs: Vec<FilterExpr>,
}

impl Filter {
    /// Create an empty (match-all) filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.exprs.push(FilterExpr::new(field, value.into()));
        self
    }

    /// Check if a document satisfies every condition
    pub fn matches(&self, doc: &Value) -> bool {
        self.exprs.iter().all(|expr| expr.matches(doc))
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(Filter::new().matches(&json!({"name": "anything"})));
        assert!(Filter::new().is_empty());
    }

    #[test]
    fn test_conjunction() {
        let doc = json!({"namespace": "acme", "name": "net"});

        assert!(Filter::new().eq("namespace", "acme").matches(&doc));
        assert!(Filter::new()
            .eq("namespace", "acme")
            .eq("name", "net")
            .matches(&doc));
        assert!(!Filter::new()
            .eq("namespace", "acme")
            .eq("name", "dns")
            .matches(&doc));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let doc = json!({"name": "net"});
        assert!(!Filter::new().eq("namespace", "acme").matches(&doc));
    }

    #[test]
    fn test_case_sensitive() {
        let doc = json!({"name": "Acme"});
        assert!(!Filter::new().eq("name", "acme").matches(&doc));
    }
}
