//! Conditional upsert planning.
//!
//! [`parse_mutation`] picks one of three cases from two facts about the
//! entity: whether any field is tagged `unique` and whether its uid is set.
//!
//! | case                | unique | uid   |
//! |---------------------|--------|-------|
//! | `Insert`            | no     | any   |
//! | `ConditionalInsert` | yes    | empty |
//! | `ConditionalUpdate` | yes    | set   |

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DqlError, Result};
use crate::mutation::descriptor::FieldDescriptor;
use crate::mutation::entity::{blank_node_name, Entity, FieldValue};
use crate::mutation::graph::serialize_graph;
use crate::mutation::triple::{field_text, mutation, Subject, Triple};
use crate::query::filter;

/// Upsert strategy chosen for an entity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum UpsertCase {
    /// Plain insert, no duplicate check.
    Insert,
    /// Insert guarded against existing nodes with the same unique values.
    ConditionalInsert,
    /// Update of an existing node, guarded against unique collisions.
    ConditionalUpdate,
}

impl UpsertCase {
    /// Chooses the case from whether the type has unique fields and the
    /// current identifier value.
    pub fn select(has_unique: bool, uid: &str) -> Self {
        match (has_unique, uid.is_empty()) {
            (false, _) => UpsertCase::Insert,
            (true, true) => UpsertCase::ConditionalInsert,
            (true, false) => UpsertCase::ConditionalUpdate,
        }
    }
}

/// One mutation of an upsert request.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    /// N-quads to add.
    pub set_nquads: String,
    /// N-quads to remove.
    pub del_nquads: String,
    /// `@if(...)` guard, empty for none.
    pub cond: String,
}

/// Everything a backend needs to run an entity upsert.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UpsertPlan {
    /// Selected case.
    pub case: UpsertCase,
    /// Query binding the guard variables, empty for plain inserts.
    pub query: String,
    /// Mutations to run against the query.
    pub mutations: Vec<Mutation>,
    /// Blank-node stem of the root entity.
    pub blank_node: String,
}

/// Predicates of the fields tagged `unique`, in declaration order.
pub fn unique_fields(entity: &dyn Entity) -> Vec<String> {
    entity
        .descriptor()
        .unique_fields()
        .map(|f| f.predicate.clone())
        .collect()
}

fn current_uid(entity: &dyn Entity) -> Result<String> {
    let identifier = entity.descriptor().require_identifier()?;
    match entity.field(identifier.field) {
        FieldValue::Text(uid) => Ok(uid.to_owned()),
        _ => Err(DqlError::Shape {
            op: "parse_mutation",
            expected: "a string uid field",
        }),
    }
}

/// `eq(predicate, "value")` for every unique field that holds a value.
fn unique_conditions(entity: &dyn Entity) -> Result<Vec<String>> {
    let mut conditions = Vec::new();
    for field in entity.descriptor().unique_fields() {
        if let Some(text) = field_text(entity, field)? {
            conditions.push(filter::eq(field.predicate.as_str(), text).to_string());
        }
    }
    Ok(conditions)
}

/// Builds the query and mutations that upsert `entity`.
///
/// `deep` controls whether nested entities are serialized on insert.
pub fn parse_mutation(entity: &dyn Entity, deep: bool) -> Result<UpsertPlan> {
    let descriptor = entity.descriptor();
    let uid = current_uid(entity)?;
    let case = UpsertCase::select(descriptor.has_unique(), &uid);
    let blank_node = blank_node_name(entity);
    debug!(type_name = entity.dgraph_type(), ?case, deep, "planning upsert");

    let (query, body) = match case {
        UpsertCase::Insert => {
            let set_nquads = if descriptor.has_nested() {
                serialize_graph(entity, &blank_node, deep)?
            } else {
                mutation(entity)?
            };
            (
                String::new(),
                Mutation {
                    set_nquads,
                    ..Mutation::default()
                },
            )
        }
        UpsertCase::ConditionalInsert => conditional_insert(entity, &blank_node, deep)?,
        UpsertCase::ConditionalUpdate => conditional_update(entity, &uid)?,
    };

    Ok(UpsertPlan {
        case,
        query,
        mutations: vec![body],
        blank_node,
    })
}

fn conditional_insert(
    entity: &dyn Entity,
    blank_node: &str,
    deep: bool,
) -> Result<(String, Mutation)> {
    let type_name = entity.dgraph_type();
    let conditions = unique_conditions(entity)?;

    let mut query = format!("{{\n  v as var(func: type({type_name}))\n");
    if !conditions.is_empty() {
        query.push_str(&format!("    @filter({})\n", conditions.join(" OR ")));
    }
    query.push('}');

    let mutation = Mutation {
        set_nquads: serialize_graph(entity, blank_node, deep)?,
        del_nquads: String::new(),
        cond: "@if(eq(len(v), 0))".to_owned(),
    };
    Ok((query, mutation))
}

fn conditional_update(entity: &dyn Entity, uid: &str) -> Result<(String, Mutation)> {
    let type_name = entity.dgraph_type();
    let conditions = unique_conditions(entity)?;

    let mut query = format!(
        "{{\n  u as var(func: uid({uid})) @filter(type({type_name}))\n\n  v as var(func: type({type_name}))\n"
    );
    match conditions.as_slice() {
        [] => {}
        [single] => query.push_str(&format!(
            "    @filter(\n      {single} AND NOT uid({uid})\n    )\n"
        )),
        many => query.push_str(&format!(
            "\t@filter(\n\t  ({})\n\t  AND NOT uid({uid})\n\t)\n",
            many.join(" OR ")
        )),
    }
    query.push('}');

    let subject = Subject::Uid(uid.to_owned());
    let mut sets = Vec::new();
    let mut plain_zeros: Vec<&FieldDescriptor> = Vec::new();
    let mut unique_zeros: Vec<&FieldDescriptor> = Vec::new();
    for field in entity.descriptor().value_fields() {
        if entity.field(field.field).is_zero() {
            if field.unique {
                unique_zeros.push(field);
            } else {
                plain_zeros.push(field);
            }
            continue;
        }
        if field.kind.is_nested() {
            continue;
        }
        if let Some(text) = field_text(entity, field)? {
            sets.push(Triple::quoted(subject.clone(), &field.predicate, &text));
        }
    }
    let deletes: Vec<Triple> = plain_zeros
        .into_iter()
        .chain(unique_zeros)
        .map(|f| Triple::wildcard(subject.clone(), &f.predicate))
        .collect();

    let join = |triples: &[Triple]| {
        triples
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    };
    let mutation = Mutation {
        set_nquads: join(&sets),
        del_nquads: join(&deletes),
        cond: "@if(eq(len(v), 0) AND eq(len(u), 1))".to_owned(),
    };
    Ok((query, mutation))
}
