//! Nested entity graphs: N-quad emission and uid write-back.
//!
//! Blank-node names follow one rule in both directions. The root uses its
//! type stem; a single nested entity uses its predicate; the i-th item of a
//! collection uses the predicate followed by `i`. The same names key the
//! uid map returned by a backend after the mutation commits.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::{DqlError, Result};
use crate::mutation::entity::{blank_node_name, Entity, FieldSlot, FieldValue};
use crate::mutation::triple::{value_triples, Subject, Triple};

/// Serializes `entity` as the blank node `_:blank_node`.
///
/// Own values come first (text and JSON, then other scalars), then the type
/// triple. With `deep` set every nested entity is linked and then emitted
/// recursively, in field order. A nested entity that already has a uid is
/// linked as `<uid>` and not emitted again. Lines are joined with `\n`
/// without a trailing newline.
pub fn serialize_graph(entity: &dyn Entity, blank_node: &str, deep: bool) -> Result<String> {
    let mut triples = Vec::new();
    emit(entity, blank_node, deep, &mut triples)?;
    trace!(
        type_name = entity.dgraph_type(),
        deep,
        triples = triples.len(),
        "serialized graph"
    );
    Ok(triples
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n"))
}

fn existing_uid(entity: &dyn Entity) -> Option<String> {
    let identifier = entity.descriptor().identifier()?;
    match entity.field(identifier.field) {
        FieldValue::Text(uid) if !uid.is_empty() => Some(uid.to_owned()),
        _ => None,
    }
}

fn emit(entity: &dyn Entity, blank_node: &str, deep: bool, out: &mut Vec<Triple>) -> Result<()> {
    let subject = Subject::Blank(blank_node.to_owned());
    out.extend(value_triples(entity, &subject)?);
    out.push(Triple::type_of(subject.clone(), entity.dgraph_type()));
    if !deep {
        return Ok(());
    }

    let mut pending: Vec<(String, &dyn Entity)> = Vec::new();
    for field in entity.descriptor().fields() {
        let items: Vec<(String, &dyn Entity)> = match entity.field(field.field) {
            FieldValue::Node(Some(child)) => vec![(field.predicate.clone(), child)],
            FieldValue::Nodes(children) => children
                .into_iter()
                .enumerate()
                .map(|(i, child)| (format!("{}{i}", field.predicate), child))
                .collect(),
            _ => continue,
        };
        for (name, child) in items {
            match existing_uid(child) {
                Some(uid) => out.push(Triple::link(
                    subject.clone(),
                    &field.predicate,
                    Subject::Uid(uid),
                )),
                None => {
                    out.push(Triple::link(
                        subject.clone(),
                        &field.predicate,
                        Subject::Blank(name.clone()),
                    ));
                    pending.push((name, child));
                }
            }
        }
    }
    for (name, child) in pending {
        emit(child, &name, deep, out)?;
    }
    Ok(())
}

/// Writes `uid` into the entity's identifier field.
pub fn set_uid(entity: &mut dyn Entity, uid: &str) -> Result<()> {
    let identifier = entity.descriptor().require_identifier()?;
    match entity.field_mut(identifier.field) {
        FieldSlot::Text(slot) => {
            *slot = uid.to_owned();
            Ok(())
        }
        _ => Err(DqlError::UnsettableField {
            field: identifier.field.to_owned(),
        }),
    }
}

/// Writes assigned uids back into an entity graph. The root is keyed by its
/// blank-node stem, nested entities by the names [`serialize_graph`] gives
/// them. Entities whose key is missing are left untouched; nested entities
/// without an identifier field are skipped.
pub fn set_uids(entity: &mut dyn Entity, uids: &HashMap<String, String>) -> Result<()> {
    if let Some(uid) = uids.get(&blank_node_name(entity)) {
        set_uid(entity, uid)?;
    }
    write_nested(entity, uids)
}

fn assign(child: &mut dyn Entity, key: &str, uids: &HashMap<String, String>) -> Result<()> {
    if let Some(uid) = uids.get(key) {
        if child.descriptor().identifier().is_some() {
            set_uid(child, uid)?;
        } else {
            debug!(key, type_name = child.dgraph_type(), "nested entity has no uid field");
        }
    }
    write_nested(child, uids)
}

fn write_nested(entity: &mut dyn Entity, uids: &HashMap<String, String>) -> Result<()> {
    let descriptor = entity.descriptor();
    for field in descriptor.fields().iter().filter(|f| f.kind.is_nested()) {
        match entity.field_mut(field.field) {
            FieldSlot::Node(Some(child)) => assign(child, &field.predicate, uids)?,
            FieldSlot::Nodes(children) => {
                for (i, child) in children.into_iter().enumerate() {
                    assign(child, &format!("{}{i}", field.predicate), uids)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}
