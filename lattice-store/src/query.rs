//! Search-query DSL
//!
//! The two query shapes the core needs from a document store: an exact
//! match on one field, and a match-any over several fields. Field paths
//! may be dotted (`confirm_deposit.transfer_id`).

use serde_json::{json, Value};

/// A single field/value match clause.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub field: String,
    pub value: Value,
}

impl MatchClause {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    fn matches(&self, doc: &Value) -> bool {
        lookup_path(doc, &self.field).is_some_and(|v| v == &self.value)
    }

    fn to_map(&self) -> serde_json::Map<String, Value> {
        let mut map = serde_json::Map::new();
        map.insert(self.field.clone(), self.value.clone());
        map
    }
}

/// Search query over a namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    /// Exact match on a single field.
    MatchPhrase(MatchClause),
    /// Match-any: at least `minimum_should_match` of the clauses hold.
    Bool {
        should: Vec<MatchClause>,
        minimum_should_match: usize,
    },
}

impl SearchQuery {
    /// Exact-match query on one field.
    pub fn match_phrase(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::MatchPhrase(MatchClause::new(field, value))
    }

    /// Match-any query: a document qualifies if at least one clause holds.
    pub fn any_of(should: Vec<MatchClause>) -> Self {
        Self::Bool {
            should,
            minimum_should_match: 1,
        }
    }

    /// Whether a document satisfies this query.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::MatchPhrase(clause) => clause.matches(doc),
            Self::Bool {
                should,
                minimum_should_match,
            } => {
                should.iter().filter(|c| c.matches(doc)).count() >= *minimum_should_match
            }
        }
    }

    /// The query rendered in the store's wire DSL. Remote backends send
    /// this verbatim; `MemoryStore` evaluates [`matches`](Self::matches)
    /// instead.
    pub fn to_query_dsl(&self) -> Value {
        match self {
            Self::MatchPhrase(clause) => json!({ "match_phrase": clause.to_map() }),
            Self::Bool {
                should,
                minimum_should_match,
            } => {
                let should: Vec<Value> = should
                    .iter()
                    .map(|c| json!({ "match": c.to_map() }))
                    .collect();
                json!({
                    "bool": {
                        "should": should,
                        "minimum_should_match": minimum_should_match,
                    }
                })
            }
        }
    }
}

/// Resolve a dotted field path against a JSON document.
fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |v, key| v.get(key))
}
