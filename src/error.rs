//! Error taxonomy shared by the mutation generator and the client façade.
//!
//! Query builders never fail. Everything that inspects an entity or talks to
//! a backend returns [`Result`], and callers can branch on
//! [`DqlError::is_conflict`] to tell a logical conflict apart from a
//! programmer error.

use thiserror::Error;

use crate::client::config::ConfigError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DqlError>;

/// Errors produced while generating mutations or driving a backend.
#[derive(Debug, Error)]
pub enum DqlError {
    /// The value does not have the shape the operation expects.
    #[error("{op} expects {expected}")]
    Shape {
        /// Operation that rejected the value.
        op: &'static str,
        /// Human readable description of the expected shape.
        expected: &'static str,
    },
    /// The entity has no field mapped to the `uid` predicate.
    #[error("entity {type_name} has no field tagged \"uid\"")]
    MissingIdentifierField {
        /// Declared type name of the entity.
        type_name: String,
    },
    /// A JSON-tagged field could not be encoded.
    #[error("failed to marshal field {field} as JSON: {source}")]
    FieldSerialization {
        /// Rust field name.
        field: String,
        /// Underlying encoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The identifier field exists but cannot receive a string.
    #[error("uid field {field:?} is not settable")]
    UnsettableField {
        /// Rust field name.
        field: String,
    },
    /// The conditional insert guard did not fire.
    #[error("mutate failed: duplicated {blank_node}")]
    DuplicateConditionFailed {
        /// Blank-node key missing from the response.
        blank_node: String,
    },
    /// The execution backend reported a failure.
    #[error("backend: {0}")]
    Backend(String),
    /// A query response could not be decoded.
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    /// The response held no rows for the requested block.
    #[error("empty result for block {block}")]
    EmptyResult {
        /// Block name looked up in the response.
        block: String,
    },
    /// Client configuration is invalid.
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
}

impl DqlError {
    /// Returns true for backend-reported logical conflicts (as opposed to
    /// malformed input).
    pub fn is_conflict(&self) -> bool {
        matches!(self, DqlError::DuplicateConditionFailed { .. })
    }

    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            DqlError::Shape { .. } => "Shape",
            DqlError::MissingIdentifierField { .. } => "MissingIdentifierField",
            DqlError::FieldSerialization { .. } => "FieldSerialization",
            DqlError::UnsettableField { .. } => "UnsettableField",
            DqlError::DuplicateConditionFailed { .. } => "DuplicateConditionFailed",
            DqlError::Backend(_) => "Backend",
            DqlError::Decode(_) => "Decode",
            DqlError::EmptyResult { .. } => "EmptyResult",
            DqlError::Config(_) => "Config",
        }
    }

    pub(crate) fn missing_uid(type_name: impl Into<String>) -> Self {
        DqlError::MissingIdentifierField {
            type_name: type_name.into(),
        }
    }
}
