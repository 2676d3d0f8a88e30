#![forbid(unsafe_code)]

//! Query construction and rendering.
//!
//! Queries are assembled from immutable [`QueryNode`] values whose filters are
//! built with the constructors in [`filter`], then rendered to query text.

/// Immutable query tree types.
///
/// Defines nodes, selections, order clauses and filter entries.
pub mod ast;

/// Fluent builder methods on [`QueryNode`].
pub mod builder;

/// Filter expression constructors.
///
/// Pure functions returning pre-rendered comparison and predicate text.
pub mod filter;

/// Query text rendering.
///
/// Turns query trees into single- or multi-block documents.
pub mod render;

pub use ast::{FilterEntry, OrderClause, OrderDir, QueryNode, Selection};
pub use builder::{expand_all_block, EXPAND_ALL};
pub use filter::{FilterExpr, Key, Operand, UidTarget};
pub use render::build;
