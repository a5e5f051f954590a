//! Diagnostics for best-effort compilation.
//!
//! Recoverable problems (malformed operands, capability faults) are
//! reported here instead of failing the compile. The sink is one-way:
//! its signature gives implementations no way to interrupt the compiler.

use serde_json::{Map, Value as Json};

/// A single recoverable problem observed during compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Human-readable description of what was skipped and why.
    pub message: String,
    /// Structured context: column, operator, offending operand.
    pub context: Map<String, Json>,
}

impl Diagnostic {
    /// Create a diagnostic with an empty context.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Map::new(),
        }
    }

    /// Attach a context field.
    pub fn with(mut self, key: &str, value: impl Into<Json>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.context.is_empty() {
            write!(f, " (")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// One-way reporting channel for diagnostics.
pub trait DiagnosticSink {
    /// Deliver one diagnostic. Must not panic; there is nowhere for a
    /// failure to go.
    fn report(&self, diagnostic: &Diagnostic);
}

/// Reports each diagnostic as a warn-level tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        let context = Json::Object(diagnostic.context.clone());
        tracing::warn!(%context, "{}", diagnostic.message);
    }
}

/// Discards every diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: &Diagnostic) {}
}

/// Accumulates the diagnostics of one compilation, forwarding each to the
/// caller's sink as it is recorded.
pub(crate) struct Diagnostics<'a> {
    sink: &'a dyn DiagnosticSink,
    recorded: Vec<Diagnostic>,
}

impl<'a> Diagnostics<'a> {
    pub(crate) fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            sink,
            recorded: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, diagnostic: Diagnostic) {
        self.sink.report(&diagnostic);
        self.recorded.push(diagnostic);
    }

    pub(crate) fn into_recorded(self) -> Vec<Diagnostic> {
        self.recorded
    }
}
