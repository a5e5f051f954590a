use std::cell::RefCell;

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::diag::{Diagnostic, DiagnosticSink, NullSink};
use crate::error::{SiftError, SiftResult};
use crate::ops::{Operator, SortOrder};
use crate::query::Query;
use crate::spec::QuerySpec;
use crate::value::Value;

// ========================================================================
// Recording fake
// ========================================================================

/// One observed capability call, in application order. Eager-loads carry
/// the calls made against their sub-query.
#[derive(Debug, Clone, PartialEq)]
enum Call {
    Compare {
        column: String,
        op: Operator,
        value: Value,
    },
    Membership {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Range {
        column: String,
        low: Value,
        high: Value,
        negated: bool,
    },
    OrderBy {
        column: String,
        order: SortOrder,
    },
    Limit(i64),
    Offset(i64),
    Select(Vec<String>),
    EagerLoad {
        relation: String,
        nested: Vec<Call>,
    },
    Paginate(Option<i64>),
    FetchFirst,
    FetchAll,
}

#[derive(Debug, Default)]
struct RecordingQuery {
    calls: Vec<Call>,
    fail_on: Option<&'static str>,
}

impl RecordingQuery {
    fn new() -> Self {
        Self::default()
    }

    /// A query whose named method errors, to simulate a capability fault.
    fn failing(step: &'static str) -> Self {
        Self {
            fail_on: Some(step),
            ..Self::default()
        }
    }

    fn trip(&self, step: &'static str) -> SiftResult<()> {
        if self.fail_on == Some(step) {
            Err(SiftError::capability(format!("{step} refused")))
        } else {
            Ok(())
        }
    }
}

impl Query for RecordingQuery {
    type Rows = String;

    fn where_compare(&mut self, column: &str, op: Operator, value: Value) -> SiftResult<()> {
        self.trip("where_compare")?;
        self.calls.push(Call::Compare {
            column: column.to_string(),
            op,
            value,
        });
        Ok(())
    }

    fn where_membership(
        &mut self,
        column: &str,
        values: Vec<Value>,
        negated: bool,
    ) -> SiftResult<()> {
        self.trip("where_membership")?;
        self.calls.push(Call::Membership {
            column: column.to_string(),
            values,
            negated,
        });
        Ok(())
    }

    fn where_range(
        &mut self,
        column: &str,
        low: Value,
        high: Value,
        negated: bool,
    ) -> SiftResult<()> {
        self.trip("where_range")?;
        self.calls.push(Call::Range {
            column: column.to_string(),
            low,
            high,
            negated,
        });
        Ok(())
    }

    fn order_by(&mut self, column: &str, order: SortOrder) -> SiftResult<()> {
        self.trip("order_by")?;
        self.calls.push(Call::OrderBy {
            column: column.to_string(),
            order,
        });
        Ok(())
    }

    fn limit(&mut self, n: i64) -> SiftResult<()> {
        self.trip("limit")?;
        self.calls.push(Call::Limit(n));
        Ok(())
    }

    fn offset(&mut self, n: i64) -> SiftResult<()> {
        self.trip("offset")?;
        self.calls.push(Call::Offset(n));
        Ok(())
    }

    fn select(&mut self, columns: Vec<String>) -> SiftResult<()> {
        self.trip("select")?;
        self.calls.push(Call::Select(columns));
        Ok(())
    }

    fn eager_load(
        &mut self,
        relation: &str,
        configure: &mut dyn FnMut(&mut Self) -> SiftResult<()>,
    ) -> SiftResult<()> {
        self.trip("eager_load")?;
        let mut nested = RecordingQuery {
            fail_on: self.fail_on,
            ..Self::default()
        };
        configure(&mut nested)?;
        self.calls.push(Call::EagerLoad {
            relation: relation.to_string(),
            nested: nested.calls,
        });
        Ok(())
    }

    fn paginate(&mut self, per_page: Option<i64>) -> SiftResult<String> {
        self.trip("paginate")?;
        self.calls.push(Call::Paginate(per_page));
        Ok(match per_page {
            Some(n) => format!("page:{n}"),
            None => "page:default".to_string(),
        })
    }

    fn fetch_first(&mut self) -> SiftResult<String> {
        self.trip("fetch_first")?;
        self.calls.push(Call::FetchFirst);
        Ok("first".to_string())
    }

    fn fetch_all(&mut self) -> SiftResult<String> {
        self.trip("fetch_all")?;
        self.calls.push(Call::FetchAll);
        Ok("all".to_string())
    }

    fn count(&mut self) -> SiftResult<i64> {
        self.trip("count")?;
        Ok(0)
    }
}

fn compile_against_users(raw: serde_json::Value) -> (RecordingQuery, Compilation<String>) {
    let spec = QuerySpec::from_json(raw);
    let mut query = RecordingQuery::new();
    let outcome = compile(&mut query, &spec, "users", &NullSink);
    (query, outcome)
}

// ========================================================================
// Direct methods
// ========================================================================

#[test]
fn test_where_order_limit_scenario() {
    let (query, outcome) = compile_against_users(json!({
        "where": { "status": "active" },
        "orderBy": "created_at:desc",
        "limit": 10,
    }));
    assert_eq!(
        query.calls,
        vec![
            Call::Compare {
                column: "users.status".to_string(),
                op: Operator::Eq,
                value: Value::String("active".to_string()),
            },
            Call::OrderBy {
                column: "created_at".to_string(),
                order: SortOrder::Desc,
            },
            Call::Limit(10),
        ]
    );
    // No getter, no paginate: the query comes back unexecuted and clean.
    assert_eq!(outcome, Compilation::Applied(Compiled::Unexecuted));
}

#[test]
fn test_two_operators_on_one_column_are_conjunctive() {
    let (query, outcome) = compile_against_users(json!({
        "where": { "age": { ">=": 18, "<": 65 } },
    }));
    // serde_json objects iterate in key order: "<" sorts before ">=".
    assert_eq!(
        query.calls,
        vec![
            Call::Compare {
                column: "users.age".to_string(),
                op: Operator::Lt,
                value: Value::Int(65),
            },
            Call::Compare {
                column: "users.age".to_string(),
                op: Operator::Gte,
                value: Value::Int(18),
            },
        ]
    );
    assert!(!outcome.is_partial());
}

#[test]
fn test_scalar_condition_normalizes_boolean_literals() {
    let (query, _) = compile_against_users(json!({
        "where": { "active": "true", "nickname": "maybe" },
    }));
    assert_eq!(
        query.calls,
        vec![
            Call::Compare {
                column: "users.active".to_string(),
                op: Operator::Eq,
                value: Value::Bool(true),
            },
            Call::Compare {
                column: "users.nickname".to_string(),
                op: Operator::Eq,
                value: Value::String("maybe".to_string()),
            },
        ]
    );
}

#[test]
fn test_unknown_operator_is_a_silent_noop() {
    let (query, outcome) = compile_against_users(json!({
        "where": { "role": { "regexp": "^adm", "sounds like": "admin" } },
    }));
    assert_eq!(query.calls, vec![]);
    // Not even a diagnostic: unknown tokens are forward-compatible no-ops.
    assert_eq!(outcome, Compilation::Applied(Compiled::Unexecuted));
}

#[test]
fn test_membership_operand_accepts_string_or_list() {
    let (query, _) = compile_against_users(json!({
        "where": {
            "id": { "whereIn": "1, 2, 3" },
            "role": { "whereNotIn": ["guest", "bot"] },
        },
    }));
    assert_eq!(
        query.calls,
        vec![
            Call::Membership {
                column: "users.id".to_string(),
                values: vec![
                    Value::String("1".to_string()),
                    Value::String("2".to_string()),
                    Value::String("3".to_string()),
                ],
                negated: false,
            },
            Call::Membership {
                column: "users.role".to_string(),
                values: vec![
                    Value::String("guest".to_string()),
                    Value::String("bot".to_string()),
                ],
                negated: true,
            },
        ]
    );
}

#[test]
fn test_range_operand_applies_with_exactly_two_elements() {
    let (query, outcome) = compile_against_users(json!({
        "where": {
            "age": { "whereBetween": "18, 65" },
            "score": { "whereNotBetween": [0, 10] },
        },
    }));
    assert_eq!(
        query.calls,
        vec![
            Call::Range {
                column: "users.age".to_string(),
                low: Value::String("18".to_string()),
                high: Value::String("65".to_string()),
                negated: false,
            },
            Call::Range {
                column: "users.score".to_string(),
                low: Value::Int(0),
                high: Value::Int(10),
                negated: true,
            },
        ]
    );
    assert!(!outcome.is_partial());
}

#[test]
fn test_malformed_range_skips_only_that_operator() {
    let (query, outcome) = compile_against_users(json!({
        "where": {
            "age": { "<": 65, "whereBetween": "18" },
            "status": "active",
        },
    }));
    // The bad range is dropped; the sibling operator and the next column
    // still compile.
    assert_eq!(
        query.calls,
        vec![
            Call::Compare {
                column: "users.age".to_string(),
                op: Operator::Lt,
                value: Value::Int(65),
            },
            Call::Compare {
                column: "users.status".to_string(),
                op: Operator::Eq,
                value: Value::String("active".to_string()),
            },
        ]
    );
    assert!(outcome.is_partial());
    assert_eq!(outcome.diagnostics().len(), 1);
    assert_eq!(
        outcome.diagnostics()[0].context.get("operator"),
        Some(&json!("whereBetween"))
    );
}

#[test]
fn test_three_element_range_is_rejected() {
    let (query, outcome) = compile_against_users(json!({
        "where": { "age": { "whereBetween": [18, 40, 65] } },
    }));
    assert_eq!(query.calls, vec![]);
    assert_eq!(outcome.diagnostics().len(), 1);
}

#[test]
fn test_non_list_membership_is_diagnosed() {
    let (query, outcome) = compile_against_users(json!({
        "where": { "id": { "whereIn": 5 } },
    }));
    assert_eq!(query.calls, vec![]);
    assert_eq!(outcome.diagnostics().len(), 1);
}

#[test]
fn test_order_by_pair_list_and_string_limit() {
    let (query, _) = compile_against_users(json!({
        "orderBy": [["name", "asc"], ["created_at", "desc"]],
        "limit": "25",
        "offset": 50,
    }));
    assert_eq!(
        query.calls,
        vec![
            Call::OrderBy {
                column: "name".to_string(),
                order: SortOrder::Asc,
            },
            Call::OrderBy {
                column: "created_at".to_string(),
                order: SortOrder::Desc,
            },
            Call::Limit(25),
            Call::Offset(50),
        ]
    );
}

#[test]
fn test_non_integer_limit_is_skipped_with_diagnostic() {
    let (query, outcome) = compile_against_users(json!({ "limit": "ten" }));
    assert_eq!(query.calls, vec![]);
    assert!(outcome.is_partial());
}

#[test]
fn test_where_that_is_not_a_mapping_is_skipped() {
    let (query, outcome) = compile_against_users(json!({ "where": "status=active" }));
    assert_eq!(query.calls, vec![]);
    assert_eq!(outcome.diagnostics().len(), 1);
}

// ========================================================================
// Relations and select
// ========================================================================

#[test]
fn test_relation_modifiers_apply_inside_the_branch() {
    let (query, outcome) = compile_against_users(json!({
        "with": "posts.comments",
        "query_posts": { "where": { "published": "true" }, "limit": 5 },
        "query_comments": { "orderBy": [["created_at", "desc"]] },
    }));
    assert_eq!(
        query.calls,
        vec![Call::EagerLoad {
            relation: "posts".to_string(),
            nested: vec![
                Call::Compare {
                    column: "published".to_string(),
                    op: Operator::Eq,
                    value: Value::Bool(true),
                },
                Call::Limit(5),
                Call::EagerLoad {
                    relation: "comments".to_string(),
                    nested: vec![Call::OrderBy {
                        column: "created_at".to_string(),
                        order: SortOrder::Desc,
                    }],
                },
            ],
        }]
    );
    assert!(!outcome.is_partial());
}

#[test]
fn test_bracket_syntax_loads_sibling_relations() {
    let (query, _) = compile_against_users(json!({
        "with": "posts[comments,likes]",
    }));
    assert_eq!(
        query.calls,
        vec![Call::EagerLoad {
            relation: "posts".to_string(),
            nested: vec![
                Call::EagerLoad {
                    relation: "comments".to_string(),
                    nested: vec![],
                },
                Call::EagerLoad {
                    relation: "likes".to_string(),
                    nested: vec![],
                },
            ],
        }]
    );
}

#[test]
fn test_modifier_select_projects_the_sub_query() {
    let (query, _) = compile_against_users(json!({
        "with": "posts",
        "query_posts": { "select": "id, title" },
    }));
    assert_eq!(
        query.calls,
        vec![Call::EagerLoad {
            relation: "posts".to_string(),
            nested: vec![Call::Select(vec!["id".to_string(), "title".to_string()])],
        }]
    );
}

#[test]
fn test_select_accepts_string_and_list() {
    let (query, _) = compile_against_users(json!({ "select": "id, name" }));
    assert_eq!(
        query.calls,
        vec![Call::Select(vec!["id".to_string(), "name".to_string()])]
    );

    let (query, _) = compile_against_users(json!({ "select": ["id", "email"] }));
    assert_eq!(
        query.calls,
        vec![Call::Select(vec!["id".to_string(), "email".to_string()])]
    );
}

#[test]
fn test_step_order_is_fixed() {
    let (query, _) = compile_against_users(json!({
        "select": "id",
        "with": "posts",
        "offset": 5,
        "limit": 10,
        "orderBy": "name",
        "where": { "active": "true" },
    }));
    // Input key order is irrelevant; the assembler always walks
    // where → orderBy → limit → offset → with → select.
    assert_eq!(
        query.calls,
        vec![
            Call::Compare {
                column: "users.active".to_string(),
                op: Operator::Eq,
                value: Value::Bool(true),
            },
            Call::OrderBy {
                column: "name".to_string(),
                order: SortOrder::Asc,
            },
            Call::Limit(10),
            Call::Offset(5),
            Call::EagerLoad {
                relation: "posts".to_string(),
                nested: vec![],
            },
            Call::Select(vec!["id".to_string()]),
        ]
    );
}

// ========================================================================
// Terminal actions
// ========================================================================

#[test]
fn test_paginate_executes_and_bypasses_getter() {
    let (query, outcome) = compile_against_users(json!({
        "paginate": 5,
        "getter": "get",
    }));
    assert_eq!(query.calls, vec![Call::Paginate(Some(5))]);
    assert_eq!(
        outcome,
        Compilation::Applied(Compiled::Fetched("page:5".to_string()))
    );
}

#[test]
fn test_non_numeric_paginate_uses_default_page_size() {
    let (query, outcome) = compile_against_users(json!({ "paginate": "yes" }));
    assert_eq!(query.calls, vec![Call::Paginate(None)]);
    assert_eq!(
        outcome,
        Compilation::Applied(Compiled::Fetched("page:default".to_string()))
    );
}

#[test]
fn test_getter_first_fetches_one() {
    let (query, outcome) = compile_against_users(json!({ "getter": "first" }));
    assert_eq!(query.calls, vec![Call::FetchFirst]);
    assert_eq!(
        outcome,
        Compilation::Applied(Compiled::Fetched("first".to_string()))
    );
}

#[test]
fn test_getter_get_fetches_all() {
    let (query, outcome) = compile_against_users(json!({ "getter": "get" }));
    assert_eq!(query.calls, vec![Call::FetchAll]);
    assert_eq!(
        outcome,
        Compilation::Applied(Compiled::Fetched("all".to_string()))
    );
}

#[test]
fn test_getter_count_falls_through_unexecuted() {
    let (query, outcome) = compile_against_users(json!({
        "where": { "status": "active" },
        "getter": "count",
    }));
    assert_eq!(query.calls.len(), 1);
    assert_eq!(outcome, Compilation::Applied(Compiled::Unexecuted));
}

#[test]
fn test_empty_spec_is_a_clean_noop() {
    let (query, outcome) = compile_against_users(json!({}));
    assert_eq!(query.calls, vec![]);
    assert_eq!(outcome, Compilation::Applied(Compiled::Unexecuted));
}

// ========================================================================
// Fault recovery
// ========================================================================

#[test]
fn test_capability_fault_keeps_the_partial_query() {
    let spec = QuerySpec::from_json(json!({
        "where": { "status": "active" },
        "orderBy": "name",
        "limit": 10,
    }));
    let mut query = RecordingQuery::failing("order_by");
    let outcome = compile(&mut query, &spec, "users", &NullSink);

    // The where predicate landed before the fault; limit never ran.
    assert_eq!(
        query.calls,
        vec![Call::Compare {
            column: "users.status".to_string(),
            op: Operator::Eq,
            value: Value::String("active".to_string()),
        }]
    );
    assert!(outcome.is_partial());
    assert_eq!(*outcome.compiled(), Compiled::Unexecuted);
    assert_eq!(
        outcome.diagnostics()[0].context.get("error"),
        Some(&json!("query capability error: order_by refused"))
    );
}

#[test]
fn test_fetch_fault_is_recovered_too() {
    let spec = QuerySpec::from_json(json!({ "getter": "get" }));
    let mut query = RecordingQuery::failing("fetch_all");
    let outcome = compile(&mut query, &spec, "users", &NullSink);
    assert!(outcome.is_partial());
    assert_eq!(*outcome.compiled(), Compiled::Unexecuted);
}

/// Sink that remembers every diagnostic it was handed.
#[derive(Default)]
struct CollectingSink {
    seen: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        self.seen.borrow_mut().push(diagnostic.clone());
    }
}

#[test]
fn test_sink_receives_each_diagnostic_as_recorded() {
    let spec = QuerySpec::from_json(json!({
        "where": { "age": { "whereBetween": "18" } },
        "limit": "ten",
    }));
    let mut query = RecordingQuery::new();
    let sink = CollectingSink::default();
    let outcome = compile(&mut query, &spec, "users", &sink);

    let seen = sink.seen.into_inner();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen.as_slice(), outcome.diagnostics());
}
