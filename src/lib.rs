//! Query and mutation text generation for Dgraph-style graph databases.
//!
//! * [`query`] builds immutable query trees and renders them to query text.
//! * [`mutation`] turns registered entities into N-quad mutations, targeted
//!   upserts and three-case conditional upsert plans.
//! * [`client`] runs those plans through a pluggable [`client::Backend`] and
//!   writes assigned uids back into the entities.
//!
//! ```
//! use dqlkit::query::QueryNode;
//!
//! let q = QueryNode::new()
//!     .type_("Person")
//!     .gt("age", 18)
//!     .select(["uid", "name"])
//!     .name("people");
//! assert_eq!(
//!     q.query(),
//!     "{\n  people(func: type(Person)) @filter(gt(age, 18)) {\n    uid\n    name\n  }\n}"
//! );
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod mutation;
pub mod query;

pub use client::{Backend, Client, ClientConfig, MutateOptions};
pub use error::{DqlError, Result};
pub use mutation::{parse_mutation, Entity, Json, UpsertCase, UpsertPlan};
pub use query::{filter, FilterExpr, QueryNode};
