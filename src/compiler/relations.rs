//! Relation-path parsing and the eager-load tree.
//!
//! # Path syntax
//!
//! ```text
//! posts.comments.author     dot chain: one child per level
//! posts[comments,likes]     bracket fan-out: sibling leaf children
//! posts[comments&likes]     `&` is an accepted sibling separator
//! ```
//!
//! Dot chains are the canonical form; brackets are the legacy alternate
//! and allow no nesting inside. The tree is built eagerly and a separate
//! materialization pass mutates the query, so construction and execution
//! stay decoupled.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    multi::separated_list1,
    sequence::delimited,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::modifiers::{ModifierSet, apply_modifiers};
use crate::diag::{Diagnostic, Diagnostics};
use crate::error::SiftResult;
use crate::normalize;
use crate::query::Query;
use crate::spec::QuerySpec;

/// One branch of the eager-load tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationNode {
    /// Relation name, opaque to the compiler; the capability's model
    /// layer resolves it.
    pub name: String,
    /// Nested relations loaded under this branch.
    pub children: Vec<RelationNode>,
    /// Modifiers from the spec's `query_<name>` key, if present.
    pub modifiers: Option<ModifierSet>,
}

/// Build the eager-load tree from the raw `with` input.
///
/// `raw` may be a comma-delimited string or a list of path strings; a
/// single bare path is accepted as-is. Paths that do not parse are
/// diagnosed and skipped. Duplicate base relations are deliberately not
/// merged; repeated eager-loads compose however the capability decides.
pub(crate) fn build_relation_tree(
    raw: &Json,
    spec: &QuerySpec,
    diagnostics: &mut Diagnostics<'_>,
) -> Vec<RelationNode> {
    // Bracket interiors contain commas, so a comma-split would tear
    // "a[b,c]" apart. Only split strings that carry no brackets.
    let paths = match raw {
        Json::String(s) if s.contains('[') => vec![raw.clone()],
        _ => normalize::to_list(raw).unwrap_or_else(|| vec![raw.clone()]),
    };

    let mut nodes = Vec::new();
    for path in &paths {
        let Some(text) = path.as_str() else {
            diagnostics.record(
                Diagnostic::new("relation path is not a string; branch skipped")
                    .with("path", path.clone()),
            );
            continue;
        };
        match parse_path(text) {
            Some(ParsedPath::Chain(segments)) => nodes.push(chain_node(&segments, spec)),
            Some(ParsedPath::Fanout { base, children }) => {
                nodes.push(fanout_node(base, &children, spec))
            }
            None => diagnostics.record(
                Diagnostic::new("unparseable relation path; branch skipped").with("path", text),
            ),
        }
    }
    nodes
}

/// Walk the tree, attaching each branch as an eager-load on `query` and
/// applying the branch's modifiers inside the capability's configurator
/// before recursing into its children.
pub(crate) fn attach_relations<Q: Query>(query: &mut Q, nodes: &[RelationNode]) -> SiftResult<()> {
    for node in nodes {
        attach_node(query, node)?;
    }
    Ok(())
}

fn attach_node<Q: Query>(query: &mut Q, node: &RelationNode) -> SiftResult<()> {
    query.eager_load(&node.name, &mut |sub| {
        if let Some(modifiers) = &node.modifiers {
            apply_modifiers(sub, modifiers)?;
        }
        attach_relations(sub, &node.children)
    })
}

enum ParsedPath<'a> {
    Chain(Vec<&'a str>),
    Fanout { base: &'a str, children: Vec<&'a str> },
}

fn parse_path(input: &str) -> Option<ParsedPath<'_>> {
    let input = input.trim();
    // A bare identifier also parses as a one-element chain, so the more
    // specific bracket shape must be tried first. Dot chains stay
    // canonical: `[` never appears in one.
    if let Ok(("", (base, children))) = bracket_path(input) {
        return Some(ParsedPath::Fanout { base, children });
    }
    if let Ok(("", segments)) = dot_chain(input) {
        return Some(ParsedPath::Chain(segments));
    }
    None
}

/// Relation name: alphanumerics and `_`.
fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn padded_identifier(input: &str) -> IResult<&str, &str> {
    delimited(multispace0, identifier, multispace0)(input)
}

/// `a.b.c` — strictly linear chain.
fn dot_chain(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(char('.'), identifier)(input)
}

/// `a[b,c]` / `a[b&c]` — base with sibling leaf children.
fn bracket_path(input: &str) -> IResult<&str, (&str, Vec<&str>)> {
    let (input, base) = identifier(input)?;
    let (input, children) = delimited(
        char('['),
        separated_list1(alt((char(','), char('&'))), padded_identifier),
        char(']'),
    )(input)?;
    Ok((input, (base, children)))
}

fn chain_node(segments: &[&str], spec: &QuerySpec) -> RelationNode {
    // separated_list1 guarantees at least one segment.
    let (last, parents) = segments.split_last().unwrap();
    let mut node = leaf(last, spec);
    for name in parents.iter().rev() {
        node = RelationNode {
            name: (*name).to_string(),
            children: vec![node],
            modifiers: lookup_modifiers(spec, name),
        };
    }
    node
}

fn fanout_node(base: &str, children: &[&str], spec: &QuerySpec) -> RelationNode {
    RelationNode {
        name: base.to_string(),
        children: children.iter().map(|name| leaf(name, spec)).collect(),
        modifiers: lookup_modifiers(spec, base),
    }
}

fn leaf(name: &str, spec: &QuerySpec) -> RelationNode {
    RelationNode {
        name: name.to_string(),
        children: Vec::new(),
        modifiers: lookup_modifiers(spec, name),
    }
}

fn lookup_modifiers(spec: &QuerySpec, name: &str) -> Option<ModifierSet> {
    spec.relation_modifiers(name)
        .map(|map| ModifierSet::from_map(map.clone()))
}
