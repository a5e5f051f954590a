//! The raw request-supplied query specification.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// The loose mapping an HTTP query string or JSON body produces.
///
/// Recognized keys: `where`, `orderBy`, `limit`, `offset`, `with`,
/// `select`, `paginate`, `getter`, and the `query_<relation>` family.
/// Unrecognized keys are carried but never acted on. The spec is
/// immutable once handed to the compiler and stays owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuerySpec(Map<String, Json>);

impl QuerySpec {
    /// An empty spec; compiling it is a no-op that returns the query
    /// unexecuted.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a spec from any JSON value. Non-objects yield an empty spec:
    /// there is nothing safe to compile from them.
    pub fn from_json(json: Json) -> Self {
        match json {
            Json::Object(map) => Self(map),
            _ => Self(Map::new()),
        }
    }

    /// Insert a key, builder-style.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw access to one key.
    pub fn get(&self, key: &str) -> Option<&Json> {
        self.0.get(key)
    }

    /// The `getter` token, when present and a string.
    pub fn getter(&self) -> Option<&str> {
        self.0.get("getter").and_then(Json::as_str)
    }

    /// The modifier mapping for one relation, from its `query_<relation>`
    /// key.
    pub fn relation_modifiers(&self, relation: &str) -> Option<&Map<String, Json>> {
        self.0
            .get(&format!("query_{relation}"))
            .and_then(Json::as_object)
    }
}

impl From<Map<String, Json>> for QuerySpec {
    fn from(map: Map<String, Json>) -> Self {
        Self(map)
    }
}
