//! # reqsift — request-to-query compilation
//!
//! reqsift turns the loose filter/sort/pagination/relation mapping an
//! HTTP query string or JSON body produces into structured calls against
//! a caller-supplied [`Query`](crate::query::Query) capability, including
//! recursive eager-loading with per-relation modifiers.
//!
//! ## Quick example
//!
//! ```rust,ignore
//! use reqsift::prelude::*;
//!
//! let spec = QuerySpec::from_json(serde_json::json!({
//!     "where": { "status": "active", "age": { ">=": "18", "<": "65" } },
//!     "orderBy": "created_at:desc",
//!     "with": "posts.comments",
//!     "query_posts": { "where": { "published": "true" }, "limit": 5 },
//!     "limit": "10",
//! }));
//!
//! // `query` is the caller's Query implementation, borrowed for the call.
//! let outcome = compile(&mut query, &spec, "users", &TracingSink);
//! ```
//!
//! ## Best-effort by design
//!
//! Compilation never returns an error. Malformed pieces of the input are
//! skipped and diagnosed, operator tokens outside the whitelist are
//! ignored outright, and a capability fault ends the pass with whatever
//! the query already holds — returning too little filtering beats
//! crashing the endpoint.

pub mod compiler;
pub mod diag;
pub mod error;
pub mod normalize;
pub mod ops;
pub mod query;
pub mod spec;
pub mod value;

pub use compiler::{Compilation, Compiled, ModifierSet, RelationNode, compile};

pub mod prelude {
    pub use crate::compiler::{Compilation, Compiled, ModifierSet, RelationNode, compile};
    pub use crate::diag::{Diagnostic, DiagnosticSink, NullSink, TracingSink};
    pub use crate::error::{SiftError, SiftResult};
    pub use crate::ops::{Getter, OpKind, Operator, SortOrder};
    pub use crate::query::Query;
    pub use crate::spec::QuerySpec;
    pub use crate::value::Value;
}
