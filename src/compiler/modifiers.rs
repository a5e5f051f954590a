//! Per-relation modifier application.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::error::SiftResult;
use crate::normalize;
use crate::ops::{Operator, SortOrder};
use crate::query::Query;
use crate::value::Value;

/// The modifier mapping scoped to one relation branch, parsed from a
/// `query_<relation>` key. Structurally a small subset of the top-level
/// spec: `where`, `orderBy`, `limit`, `select`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierSet(Map<String, Json>);

impl ModifierSet {
    /// Wrap a raw modifier mapping.
    pub fn from_map(map: Map<String, Json>) -> Self {
        Self(map)
    }

    /// Whether any modifier key is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn get(&self, key: &str) -> Option<&Json> {
        self.0.get(key)
    }
}

/// Apply one relation's modifiers to its sub-query.
///
/// The `where` sub-scope is intentionally equality-only; the full
/// operator grammar belongs to the root ConditionSet. Columns stay
/// unqualified because the sub-query scope owns exactly one relation.
/// Unknown keys are ignored.
pub(crate) fn apply_modifiers<Q: Query>(query: &mut Q, modifiers: &ModifierSet) -> SiftResult<()> {
    if let Some(filters) = modifiers.get("where").and_then(Json::as_object) {
        for (column, value) in filters {
            let value = Value::from_json(&normalize::boolean(value.clone()));
            query.where_compare(column, Operator::Eq, value)?;
        }
    }
    if let Some(order) = modifiers.get("orderBy") {
        apply_order_by(query, order)?;
    }
    if let Some(limit) = modifiers.get("limit").and_then(normalize::integer) {
        query.limit(limit)?;
    }
    if let Some(select) = modifiers.get("select") {
        if let Some(columns) = column_list(select) {
            query.select(columns)?;
        }
    }
    Ok(())
}

/// Apply an `orderBy` value: a single `"column,direction"` or
/// `"column:direction"` string, or a list whose elements are
/// `[column, direction]` pairs (or bare such strings). Direction defaults
/// to ascending when omitted.
pub(crate) fn apply_order_by<Q: Query>(query: &mut Q, order: &Json) -> SiftResult<()> {
    match order {
        Json::String(s) => {
            if let Some((column, direction)) = split_order_token(s) {
                query.order_by(&column, direction)?;
            }
            Ok(())
        }
        Json::Array(entries) => {
            for entry in entries {
                match entry {
                    Json::Array(pair) if !pair.is_empty() => {
                        let Some(column) = pair[0].as_str() else {
                            continue;
                        };
                        let direction = pair
                            .get(1)
                            .and_then(Json::as_str)
                            .map(SortOrder::from_token)
                            .unwrap_or_default();
                        query.order_by(column, direction)?;
                    }
                    Json::String(s) => {
                        if let Some((column, direction)) = split_order_token(s) {
                            query.order_by(&column, direction)?;
                        }
                    }
                    _ => {}
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Split `"column,direction"` / `"column:direction"`; a bare column name
/// sorts ascending.
fn split_order_token(raw: &str) -> Option<(String, SortOrder)> {
    let mut parts = raw.splitn(2, [',', ':']);
    let column = parts.next()?.trim();
    if column.is_empty() {
        return None;
    }
    let direction = parts.next().map(SortOrder::from_token).unwrap_or_default();
    Some((column.to_string(), direction))
}

/// Normalize a `select` value into column names: comma-split when a
/// string, string elements when a list.
pub(crate) fn column_list(raw: &Json) -> Option<Vec<String>> {
    let columns: Vec<String> = match raw {
        Json::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        Json::Array(items) => items
            .iter()
            .filter_map(Json::as_str)
            .map(str::to_string)
            .collect(),
        _ => return None,
    };
    if columns.is_empty() { None } else { Some(columns) }
}
