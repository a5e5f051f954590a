//! The query assembler: one best-effort pass over a [`QuerySpec`].
//!
//! Steps run in a fixed order — `where`, `orderBy`, `limit`, `offset`,
//! `with`, `select`, `paginate`, `getter` — each only when its key is
//! present. Compilation never fails: malformed input is skipped with a
//! diagnostic, and a capability fault ends the pass with whatever state
//! the borrowed query already holds.

mod conditions;
mod modifiers;
mod relations;

#[cfg(test)]
mod tests;

pub use modifiers::ModifierSet;
pub use relations::RelationNode;

use crate::diag::{Diagnostic, DiagnosticSink, Diagnostics};
use crate::error::SiftResult;
use crate::normalize;
use crate::ops::Getter;
use crate::query::Query;
use crate::spec::QuerySpec;

/// What one compilation left behind.
#[derive(Debug, Clone, PartialEq)]
pub enum Compiled<R> {
    /// A terminal action ran and materialized rows.
    Fetched(R),
    /// No terminal action ran; the borrowed query holds the configured
    /// state and the caller may chain further.
    Unexecuted,
}

/// Outcome of [`compile`]. Never an error: worst case the query reflects
/// less filtering than requested, and the diagnostics say why.
#[derive(Debug, Clone, PartialEq)]
pub enum Compilation<R> {
    /// Every requested step applied cleanly.
    Applied(Compiled<R>),
    /// Best-effort result: some input was skipped or a capability call
    /// failed partway through.
    PartiallyApplied(Compiled<R>, Vec<Diagnostic>),
}

impl<R> Compilation<R> {
    /// The compiled result, regardless of completeness.
    pub fn compiled(&self) -> &Compiled<R> {
        match self {
            Compilation::Applied(compiled) | Compilation::PartiallyApplied(compiled, _) => compiled,
        }
    }

    /// Diagnostics recorded during compilation; empty when fully applied.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Compilation::Applied(_) => &[],
            Compilation::PartiallyApplied(_, diagnostics) => diagnostics,
        }
    }

    /// Whether anything was skipped or cut short.
    pub fn is_partial(&self) -> bool {
        matches!(self, Compilation::PartiallyApplied(..))
    }
}

/// Compile `spec` against the borrowed `query`, qualifying condition
/// columns with `table`.
///
/// Diagnostics are forwarded to `sink` as they are recorded and returned
/// inside the [`Compilation`] as well. See the module docs for the step
/// order and failure policy.
pub fn compile<Q: Query>(
    query: &mut Q,
    spec: &QuerySpec,
    table: &str,
    sink: &dyn DiagnosticSink,
) -> Compilation<Q::Rows> {
    let mut diagnostics = Diagnostics::new(sink);
    let compiled = match run(query, spec, table, &mut diagnostics) {
        Ok(compiled) => compiled,
        Err(error) => {
            diagnostics.record(
                Diagnostic::new("capability fault; returning the partially built query")
                    .with("error", error.to_string()),
            );
            Compiled::Unexecuted
        }
    };
    let recorded = diagnostics.into_recorded();
    if recorded.is_empty() {
        Compilation::Applied(compiled)
    } else {
        Compilation::PartiallyApplied(compiled, recorded)
    }
}

fn run<Q: Query>(
    query: &mut Q,
    spec: &QuerySpec,
    table: &str,
    diagnostics: &mut Diagnostics<'_>,
) -> SiftResult<Compiled<Q::Rows>> {
    if let Some(raw) = spec.get("where") {
        match raw.as_object() {
            Some(set) => conditions::apply_conditions(query, set, table, diagnostics)?,
            None => diagnostics.record(
                Diagnostic::new("where clause is not a mapping; skipped").with("where", raw.clone()),
            ),
        }
    }

    if let Some(order) = spec.get("orderBy") {
        modifiers::apply_order_by(query, order)?;
    }

    if let Some(raw) = spec.get("limit") {
        match normalize::integer(raw) {
            Some(n) => query.limit(n)?,
            None => diagnostics.record(
                Diagnostic::new("limit is not an integer; skipped").with("limit", raw.clone()),
            ),
        }
    }

    if let Some(raw) = spec.get("offset") {
        match normalize::integer(raw) {
            Some(n) => query.offset(n)?,
            None => diagnostics.record(
                Diagnostic::new("offset is not an integer; skipped").with("offset", raw.clone()),
            ),
        }
    }

    if let Some(raw) = spec.get("with") {
        let nodes = relations::build_relation_tree(raw, spec, diagnostics);
        relations::attach_relations(query, &nodes)?;
    }

    if let Some(raw) = spec.get("select") {
        match modifiers::column_list(raw) {
            Some(columns) => query.select(columns)?,
            None => diagnostics.record(
                Diagnostic::new("select is not a column list; skipped").with("select", raw.clone()),
            ),
        }
    }

    // A paginated fetch is terminal and wins over any getter.
    if let Some(raw) = spec.get("paginate") {
        return Ok(Compiled::Fetched(query.paginate(normalize::integer(raw))?));
    }

    if let Some(token) = spec.getter() {
        return match Getter::from_token(token) {
            Some(Getter::First) => Ok(Compiled::Fetched(query.fetch_first()?)),
            Some(Getter::Get) => Ok(Compiled::Fetched(query.fetch_all()?)),
            // Tokens outside {first, get} — `count` included — hand the
            // query back unexecuted; see DESIGN.md.
            None => Ok(Compiled::Unexecuted),
        };
    }

    Ok(Compiled::Unexecuted)
}
