//! The operator whitelist and related token enums.
//!
//! Operator tokens arrive as untrusted strings. They are classified
//! against a fixed enum table before any predicate is applied; a token
//! outside the whitelist maps to `None` and the compiler moves on. That
//! silence is a security boundary, not a parse failure.

use serde::{Deserialize, Serialize};

/// Whitelisted single-value comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// Pattern match (LIKE)
    Like,
    /// Negated pattern match (NOT LIKE)
    NotLike,
}

impl Operator {
    /// The symbol a capability would render for this operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// How a whitelisted operator token binds its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Single-value comparison, operand used as-is.
    Compare(Operator),
    /// Set membership, operand normalized to a list.
    Membership { negated: bool },
    /// Range, operand normalized to exactly two elements.
    Range { negated: bool },
}

impl OpKind {
    /// Classify a raw operator token against the whitelist.
    ///
    /// Unknown tokens are `None`: the compiler ignores them without a
    /// diagnostic, treating them as forward-compatible no-ops.
    pub fn classify(token: &str) -> Option<OpKind> {
        let kind = match token {
            "=" => OpKind::Compare(Operator::Eq),
            "!=" => OpKind::Compare(Operator::Ne),
            ">" => OpKind::Compare(Operator::Gt),
            ">=" => OpKind::Compare(Operator::Gte),
            "<" => OpKind::Compare(Operator::Lt),
            "<=" => OpKind::Compare(Operator::Lte),
            "like" => OpKind::Compare(Operator::Like),
            "not like" => OpKind::Compare(Operator::NotLike),
            "whereIn" => OpKind::Membership { negated: false },
            "whereNotIn" => OpKind::Membership { negated: true },
            "whereBetween" => OpKind::Range { negated: false },
            "whereNotBetween" => OpKind::Range { negated: true },
            _ => return None,
        };
        Some(kind)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a direction token; anything that is not `desc` sorts
    /// ascending, matching the "direction defaults to ascending" rule.
    pub fn from_token(token: &str) -> SortOrder {
        if token.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// Terminal fetch actions recognized from the `getter` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Getter {
    /// Fetch a single row.
    First,
    /// Fetch all matching rows.
    Get,
}

impl Getter {
    /// Parse a getter token. Anything outside {`first`, `get`} is `None`
    /// and the query is handed back unexecuted.
    pub fn from_token(token: &str) -> Option<Getter> {
        match token {
            "first" => Some(Getter::First),
            "get" => Some(Getter::Get),
            _ => None,
        }
    }
}
