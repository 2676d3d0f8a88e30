//! N-quad triples and the mutation/upsert document builders.

use std::fmt;

use tracing::{debug, trace};

use crate::error::Result;
use crate::mutation::descriptor::{FieldDescriptor, TYPE_PREDICATE};
use crate::mutation::entity::{blank_node_name, Entity};
use crate::query::ast::QueryNode;
use crate::query::filter::{FilterExpr, Operand};
use crate::query::render::{render_block, Body};

/// Subject of a triple.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Subject {
    /// Blank node `_:name`.
    Blank(String),
    /// Upsert variable reference `uid(name)`.
    Var(String),
    /// Concrete node `<0x1>`.
    Uid(String),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Blank(name) => write!(f, "_:{name}"),
            Subject::Var(name) => write!(f, "uid({name})"),
            Subject::Uid(uid) => write!(f, "<{uid}>"),
        }
    }
}

/// Object of a triple.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Object {
    /// Already rendered literal, quotes included when needed.
    Literal(String),
    /// Value variable `val(name)`.
    Val(String),
    /// Edge to another node.
    Node(Subject),
    /// `*`, every value of the predicate.
    Wildcard,
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Literal(text) => f.write_str(text),
            Object::Val(var) => write!(f, "val({var})"),
            Object::Node(subject) => subject.fmt(f),
            Object::Wildcard => f.write_str("*"),
        }
    }
}

/// Whether a triple is added or removed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TripleOp {
    /// Goes in the `set` block.
    Set,
    /// Goes in the `delete` block.
    Delete,
}

/// One `subject <predicate> object .` statement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Triple {
    /// Subject node.
    pub subject: Subject,
    /// Predicate name, rendered in angle brackets.
    pub predicate: String,
    /// Object value or node.
    pub object: Object,
    /// Set or delete.
    pub op: TripleOp,
}

impl Triple {
    /// Set triple on an upsert variable: `uid(var) <p> value .`.
    /// Strings are quoted, numbers and booleans are not.
    pub fn set(var: &str, predicate: &str, value: impl Into<Operand>) -> Self {
        Self {
            subject: Subject::Var(var.to_owned()),
            predicate: predicate.to_owned(),
            object: Object::Literal(value.into().render()),
            op: TripleOp::Set,
        }
    }

    /// Set triple copying a value variable: `uid(var) <p> val(value_var) .`.
    pub fn set_val(var: &str, predicate: &str, value_var: &str) -> Self {
        Self {
            subject: Subject::Var(var.to_owned()),
            predicate: predicate.to_owned(),
            object: Object::Val(value_var.to_owned()),
            op: TripleOp::Set,
        }
    }

    /// Wildcard delete: `uid(var) <p> * .`.
    pub fn delete(var: &str, predicate: &str) -> Self {
        Self {
            subject: Subject::Var(var.to_owned()),
            predicate: predicate.to_owned(),
            object: Object::Wildcard,
            op: TripleOp::Delete,
        }
    }

    pub(crate) fn quoted(subject: Subject, predicate: &str, text: &str) -> Self {
        Self {
            subject,
            predicate: predicate.to_owned(),
            object: Object::Literal(format!("\"{text}\"")),
            op: TripleOp::Set,
        }
    }

    pub(crate) fn link(subject: Subject, predicate: &str, target: Subject) -> Self {
        Self {
            subject,
            predicate: predicate.to_owned(),
            object: Object::Node(target),
            op: TripleOp::Set,
        }
    }

    pub(crate) fn wildcard(subject: Subject, predicate: &str) -> Self {
        Self {
            subject,
            predicate: predicate.to_owned(),
            object: Object::Wildcard,
            op: TripleOp::Delete,
        }
    }

    /// Type triple `subject <dgraph.type> "T" .`.
    pub(crate) fn type_of(subject: Subject, type_name: &str) -> Self {
        Self::quoted(subject, TYPE_PREDICATE, type_name)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {} .", self.subject, self.predicate, self.object)
    }
}

/// Renders the quoted text of one field, or `None` when it is zero.
pub(crate) fn field_text(entity: &dyn Entity, field: &FieldDescriptor) -> Result<Option<String>> {
    let value = entity.field(field.field);
    if value.is_zero() {
        return Ok(None);
    }
    value.render(field.field, field.is_json()).map(Some)
}

/// Value triples for every non-zero scalar field except the identifier:
/// text and JSON fields first, then the rest, each in declaration order.
pub(crate) fn value_triples(entity: &dyn Entity, subject: &Subject) -> Result<Vec<Triple>> {
    let descriptor = entity.descriptor();
    let scalars = descriptor.value_fields().filter(|f| !f.kind.is_nested());
    let (text, other): (Vec<_>, Vec<_>) = scalars.partition(|f| f.is_text_like());
    let mut triples = Vec::new();
    for field in text.into_iter().chain(other) {
        if let Some(text) = field_text(entity, field)? {
            triples.push(Triple::quoted(subject.clone(), &field.predicate, &text));
        }
    }
    Ok(triples)
}

fn push_lines<'a>(out: &mut String, indent: &str, triples: impl IntoIterator<Item = &'a Triple>) {
    for triple in triples {
        out.push_str(&format!("{indent}{triple}\n"));
    }
}

/// Simple insert document for one entity.
///
/// ```text
/// {
///   set {
///     _:user <name> "Alice" .
///     _:user <dgraph.type> "User" .
///   }
/// }
/// ```
pub fn mutation(entity: &dyn Entity) -> Result<String> {
    entity.descriptor().require_identifier()?;
    let subject = Subject::Blank(blank_node_name(entity));
    let mut triples = value_triples(entity, &subject)?;
    triples.push(Triple::type_of(subject, entity.dgraph_type()));

    let mut out = String::from("{\n  set {\n");
    push_lines(&mut out, "    ", &triples);
    out.push_str("  }\n}");
    trace!(type_name = entity.dgraph_type(), triples = triples.len(), "built mutation");
    Ok(out)
}

/// Set triples on `uid(var)` for the requested predicates, in the order
/// given. Unknown predicates, nested fields and zero values are skipped.
fn targeted_triples(entity: &dyn Entity, var: &str, fields: &[&str]) -> Result<Vec<Triple>> {
    let descriptor = entity.descriptor();
    let mut triples = Vec::new();
    for predicate in fields {
        let Some(field) = descriptor.by_predicate(predicate) else {
            debug!(predicate, type_name = descriptor.type_name(), "skipping unknown predicate");
            continue;
        };
        if field.kind.is_nested() {
            continue;
        }
        if let Some(text) = field_text(entity, field)? {
            triples.push(Triple::quoted(
                Subject::Var(var.to_owned()),
                &field.predicate,
                &text,
            ));
        }
    }
    Ok(triples)
}

fn set_block(out: &mut String, triples: &[Triple]) {
    out.push_str("    set {\n");
    push_lines(out, "      ", triples);
    out.push_str("    }\n");
}

/// Upsert that updates `fields` on the nodes matched by `match_expr`. The
/// match variable is the entity's blank-node stem.
pub fn upsert(entity: &dyn Entity, match_expr: &FilterExpr, fields: &[&str]) -> Result<String> {
    let var = blank_node_name(entity);
    let triples = targeted_triples(entity, &var, fields)?;

    let mut out = String::from("upsert {\n  query {\n");
    out.push_str(&format!("    {var} as var(func: {match_expr})\n"));
    out.push_str("  }\n  mutation {\n");
    set_block(&mut out, &triples);
    out.push_str("  }\n}");
    Ok(out)
}

/// Upsert whose query is a full named block rendered from `node`; the node
/// selects the variable (`var_ref as uid`) the set triples target.
pub fn upsert_with_query(
    query_name: &str,
    node: &QueryNode,
    var_ref: &str,
    entity: &dyn Entity,
    fields: &[&str],
) -> Result<String> {
    let triples = targeted_triples(entity, var_ref, fields)?;

    let mut out = String::from("upsert {\n  query {\n");
    render_block(&mut out, node, query_name, "    ", Body::Always);
    out.push_str("  }\n\n  mutation {\n");
    set_block(&mut out, &triples);
    out.push_str("  }\n}");
    Ok(out)
}

/// Upsert built from explicit triples. Set triples come before delete
/// triples. When `node` carries a block variable its query renders as
/// `v as var(...)`, with a body only if it selects something; otherwise it
/// renders as a block named `query_name`.
pub fn upsert_block(query_name: &str, node: &QueryNode, triples: &[Triple]) -> String {
    let mut out = String::from("upsert {\n  query {\n");
    if node.block_var_name().is_some() {
        render_block(&mut out, node, "var", "    ", Body::WhenChildren);
    } else {
        render_block(&mut out, node, query_name, "    ", Body::Always);
    }
    out.push_str("  }\n\n  mutation {\n");

    let (sets, deletes): (Vec<&Triple>, Vec<&Triple>) =
        triples.iter().partition(|t| t.op == TripleOp::Set);
    if !sets.is_empty() {
        out.push_str("    set {\n");
        push_lines(&mut out, "      ", sets);
        out.push_str("    }\n");
    }
    if !deletes.is_empty() {
        out.push_str("    delete {\n");
        push_lines(&mut out, "      ", deletes);
        out.push_str("    }\n");
    }
    out.push_str("  }\n}");
    out
}

/// Upsert that deletes every value of `fields` on the nodes matched by
/// `match_expr`.
pub fn upsert_delete(var: &str, match_expr: &FilterExpr, fields: &[&str]) -> String {
    let mut out = String::from("upsert {\n  query {\n");
    out.push_str(&format!("    {var} as var(func: {match_expr})\n"));
    out.push_str("  }\n\n  mutation {\n    delete {\n");
    let triples = fields.iter().map(|p| Triple::delete(var, p));
    for triple in triples {
        out.push_str(&format!("      {triple}\n"));
    }
    out.push_str("    }\n  }\n}");
    out
}
