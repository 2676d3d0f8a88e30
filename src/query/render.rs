//! Text rendering for query trees.
//!
//! Layout rules:
//! * root header args are `func`, order clauses, then `first`/`offset`;
//! * `@cascade` and `@groupby` follow the header parentheses;
//! * a single simple filter stays on the header line, anything else becomes
//!   a multi-line `@filter(` block with `AND`/`OR` separators;
//! * children are indented two spaces deeper than their parent.

use tracing::{trace, warn};

use crate::query::ast::{FilterEntry, QueryNode, Selection};

const STEP: &str = "  ";

/// Whether a block without children still gets a `{ }` body.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Body {
    Always,
    WhenChildren,
}

impl QueryNode {
    /// Renders this node as a single-block document named after its
    /// effective name.
    pub fn query(&self) -> String {
        build(std::slice::from_ref(self))
    }
}

/// Composes several top-level blocks into one document, separated by a
/// blank line.
pub fn build(blocks: &[QueryNode]) -> String {
    let mut out = String::from("{\n");
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if block.is_condition() {
            render_condition(&mut out, block, STEP);
        } else {
            render_block(&mut out, block, block.effective_name(), STEP, Body::Always);
        }
    }
    out.push('}');
    trace!(blocks = blocks.len(), bytes = out.len(), "rendered query");
    out
}

fn root_function_clause(node: &QueryNode) -> Option<String> {
    let funcs = node
        .filters
        .iter()
        .filter(|f| matches!(f, FilterEntry::Func(_)))
        .count();
    if funcs > 1 {
        warn!(
            block = node.key(),
            count = funcs,
            "multiple root functions set; the last one is used"
        );
    }
    node.root_function().map(|f| format!("func: {f}"))
}

fn pagination(node: &QueryNode) -> impl Iterator<Item = String> {
    let first = node.first.map(|n| format!("first: {n}"));
    let offset = node.offset.map(|n| format!("offset: {n}"));
    first.into_iter().chain(offset)
}

fn directives(node: &QueryNode) -> String {
    let mut out = String::new();
    if node.cascade {
        out.push_str(" @cascade");
    }
    if let Some(field) = node.group_by.as_deref() {
        out.push_str(&format!(" @groupby({field})"));
    }
    out
}

/// Renders a top-level block at `indent`.
pub(crate) fn render_block(
    out: &mut String,
    node: &QueryNode,
    block_name: &str,
    indent: &str,
    body: Body,
) {
    let mut args: Vec<String> = root_function_clause(node).into_iter().collect();
    args.extend(node.order.iter().map(|o| o.render()));
    args.extend(pagination(node));

    let prefix = node
        .block_var
        .as_deref()
        .map(|v| format!("{v} as "))
        .unwrap_or_default();
    let head = format!(
        "{indent}{prefix}{block_name}({}){}",
        args.join(", "),
        directives(node)
    );
    let has_body = body == Body::Always || !node.children.is_empty();
    write_filtered_head(out, node, &head, indent, has_body);
    if has_body {
        render_fields(out, node, &format!("{indent}{STEP}"));
        out.push_str(&format!("{indent}}}\n"));
    }
}

/// Writes `head` followed by the filter clause and, when `open` is set, the
/// opening brace of the body.
fn write_filtered_head(out: &mut String, node: &QueryNode, head: &str, indent: &str, open: bool) {
    let filters: Vec<&FilterEntry> = node.predicate_filters().collect();
    let brace = if open { " {" } else { "" };
    match filters.as_slice() {
        [] => out.push_str(&format!("{head}{brace}\n")),
        [FilterEntry::Pred(expr)] => out.push_str(&format!("{head} @filter({expr}){brace}\n")),
        entries => {
            out.push_str(&format!("{head}\n{indent}@filter(\n"));
            let inner = format!("{indent}{STEP}");
            for (i, entry) in entries.iter().enumerate() {
                let and = if i > 0 { "AND " } else { "" };
                match entry {
                    FilterEntry::Or(group) => {
                        out.push_str(&format!("{inner}{and}(\n"));
                        for (j, expr) in group.iter().enumerate() {
                            let or = if j > 0 { "OR " } else { "" };
                            out.push_str(&format!("{inner}{STEP}{or}{expr}\n"));
                        }
                        out.push_str(&format!("{inner})\n"));
                    }
                    FilterEntry::Pred(expr) | FilterEntry::Func(expr) => {
                        out.push_str(&format!("{inner}{and}{expr}\n"));
                    }
                }
            }
            out.push_str(&format!("{indent}){brace}\n"));
        }
    }
}

/// Single-line filter used by inline selections: `a AND (b OR c)`.
fn inline_filter(node: &QueryNode) -> String {
    let parts: Vec<String> = node
        .predicate_filters()
        .map(|entry| match entry {
            FilterEntry::Or(group) => {
                let exprs: Vec<&str> = group.iter().map(|e| e.as_str()).collect();
                format!("({})", exprs.join(" OR "))
            }
            FilterEntry::Pred(expr) | FilterEntry::Func(expr) => expr.to_string(),
        })
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" @filter({})", parts.join(" AND "))
    }
}

pub(crate) fn render_fields(out: &mut String, node: &QueryNode, indent: &str) {
    for child in node.children.iter() {
        match child {
            Selection::Field(field) => out.push_str(&format!("{indent}{field}\n")),
            Selection::Node(nested) => render_nested(out, nested, indent),
        }
    }
}

fn render_nested(out: &mut String, node: &QueryNode, indent: &str) {
    let prefix = node
        .var_name
        .as_deref()
        .map(|v| format!("{v} as "))
        .unwrap_or_default();
    let mut args: Vec<String> = node.order.iter().map(|o| o.render()).collect();
    args.extend(pagination(node));
    let args = if args.is_empty() {
        String::new()
    } else {
        format!("({})", args.join(", "))
    };
    let head = format!("{indent}{prefix}{}{args}{}", node.key(), directives(node));

    if node.inline {
        let fields: Vec<&str> = node
            .children
            .iter()
            .filter_map(|c| match c {
                Selection::Field(f) => Some(f.as_str()),
                Selection::Node(_) => None,
            })
            .collect();
        out.push_str(&format!(
            "{head}{} {{ {} }}\n",
            inline_filter(node),
            fields.join(" ")
        ));
        return;
    }

    write_filtered_head(out, node, &head, indent, true);
    render_fields(out, node, &format!("{indent}{STEP}"));
    out.push_str(&format!("{indent}}}\n"));
}

fn render_condition(out: &mut String, node: &QueryNode, indent: &str) {
    let func = root_function_clause(node).unwrap_or_default();
    let cond = node.cond_var.as_deref().unwrap_or_default();
    out.push_str(&format!("{indent}{cond} as {}({func})\n", node.key()));
}
