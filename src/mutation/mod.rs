#![forbid(unsafe_code)]

//! Mutation generation from registered entities.
//!
//! Entities opt in through [`entity!`](crate::entity). From there
//! [`mutation`], [`upsert`] and friends render standalone documents, while
//! [`parse_mutation`] plans the conditional upsert a client runs.

/// Field tag parsing and per-type metadata.
pub mod descriptor;

/// The [`Entity`] trait, field value views and the registration macro.
pub mod entity;

/// Nested graph serialization and uid write-back.
pub mod graph;

/// Triples and upsert document builders.
pub mod triple;

/// Three-case upsert planning.
pub mod upsert;

pub use descriptor::{
    parse_tag, EntityDescriptor, FieldDescriptor, FieldTag, ParsedTag, TYPE_PREDICATE,
    UID_PREDICATE,
};
pub use entity::{blank_node_name, Entity, FieldSlot, FieldType, FieldValue, Json, ValueKind};
pub use graph::{serialize_graph, set_uid, set_uids};
pub use triple::{
    mutation, upsert, upsert_block, upsert_delete, upsert_with_query, Object, Subject, Triple,
    TripleOp,
};
pub use upsert::{parse_mutation, unique_fields, Mutation, UpsertCase, UpsertPlan};
