//! The Query capability consumed by the compiler.

use crate::error::SiftResult;
use crate::ops::{Operator, SortOrder};
use crate::value::Value;

/// The mutable query-construction capability the compiler configures.
///
/// Implemented by the caller over its storage engine; the compiler borrows
/// it for the duration of one [`compile`](crate::compiler::compile) call
/// and never owns it. Mutating and fetching calls return `Result` so a
/// capability fault surfaces as a value the assembler can recover from,
/// never as a panic.
pub trait Query {
    /// Materialized result of a fetch action.
    type Rows;

    /// Apply `column <op> value`.
    fn where_compare(&mut self, column: &str, op: Operator, value: Value) -> SiftResult<()>;

    /// Apply `column [NOT] IN values`.
    fn where_membership(
        &mut self,
        column: &str,
        values: Vec<Value>,
        negated: bool,
    ) -> SiftResult<()>;

    /// Apply `column [NOT] BETWEEN low AND high`.
    fn where_range(
        &mut self,
        column: &str,
        low: Value,
        high: Value,
        negated: bool,
    ) -> SiftResult<()>;

    /// Order results by a column.
    fn order_by(&mut self, column: &str, order: SortOrder) -> SiftResult<()>;

    /// Cap the number of results.
    fn limit(&mut self, n: i64) -> SiftResult<()>;

    /// Skip the first `n` results.
    fn offset(&mut self, n: i64) -> SiftResult<()>;

    /// Restrict the projection to the given columns.
    fn select(&mut self, columns: Vec<String>) -> SiftResult<()>;

    /// Attach a nested eager-load for `relation`, configuring its
    /// sub-query through the callback. The relation name is opaque to the
    /// compiler; resolution belongs to the implementation's model layer.
    fn eager_load(
        &mut self,
        relation: &str,
        configure: &mut dyn FnMut(&mut Self) -> SiftResult<()>,
    ) -> SiftResult<()>;

    /// Execute a paginated fetch. `per_page: None` requests the
    /// implementation's default page size.
    fn paginate(&mut self, per_page: Option<i64>) -> SiftResult<Self::Rows>;

    /// Fetch a single row.
    fn fetch_first(&mut self) -> SiftResult<Self::Rows>;

    /// Fetch all matching rows.
    fn fetch_all(&mut self) -> SiftResult<Self::Rows>;

    /// Count matching rows. Part of the capability contract for callers
    /// that chain on an unexecuted query; no `getter` token currently
    /// reaches it (see DESIGN.md).
    fn count(&mut self) -> SiftResult<i64>;
}
