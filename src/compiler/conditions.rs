//! Condition compilation: column → operator/operand predicates.

use serde_json::{Map, Value as Json};

use crate::diag::{Diagnostic, Diagnostics};
use crate::error::SiftResult;
use crate::normalize;
use crate::ops::{OpKind, Operator};
use crate::query::Query;
use crate::value::Value;

/// Apply one ConditionSet to `query`, qualifying every column with
/// `table` so predicates stay unambiguous inside joined or eager-loaded
/// scopes that share column names.
///
/// Malformed operands are diagnosed and that operator alone is skipped;
/// tokens outside the whitelist are ignored outright. Capability errors
/// propagate to the assembler boundary.
pub(crate) fn apply_conditions<Q: Query>(
    query: &mut Q,
    conditions: &Map<String, Json>,
    table: &str,
    diagnostics: &mut Diagnostics<'_>,
) -> SiftResult<()> {
    for (column, operand) in conditions {
        let qualified = format!("{table}.{column}");
        match operand {
            Json::Object(operators) => {
                for (token, raw) in operators {
                    apply_operator(query, &qualified, token, raw, diagnostics)?;
                }
            }
            scalar => {
                let value = Value::from_json(&normalize::boolean(scalar.clone()));
                query.where_compare(&qualified, Operator::Eq, value)?;
            }
        }
    }
    Ok(())
}

fn apply_operator<Q: Query>(
    query: &mut Q,
    column: &str,
    token: &str,
    raw: &Json,
    diagnostics: &mut Diagnostics<'_>,
) -> SiftResult<()> {
    let Some(kind) = OpKind::classify(token) else {
        // Outside the whitelist: no predicate, no diagnostic.
        return Ok(());
    };
    match kind {
        OpKind::Compare(op) => {
            query.where_compare(column, op, Value::from_json(raw))?;
        }
        OpKind::Membership { negated } => match normalize::to_list(raw) {
            Some(items) => {
                let values = items.iter().map(Value::from_json).collect();
                query.where_membership(column, values, negated)?;
            }
            None => diagnostics.record(
                Diagnostic::new("membership operand is not list-like; predicate skipped")
                    .with("column", column)
                    .with("operator", token)
                    .with("operand", raw.clone()),
            ),
        },
        OpKind::Range { negated } => match normalize::to_list(raw) {
            Some(items) if items.len() == 2 => {
                let low = Value::from_json(&items[0]);
                let high = Value::from_json(&items[1]);
                query.where_range(column, low, high, negated)?;
            }
            _ => diagnostics.record(
                Diagnostic::new("range operand is not a two-element list; predicate skipped")
                    .with("column", column)
                    .with("operator", token)
                    .with("operand", raw.clone()),
            ),
        },
    }
    Ok(())
}
