//! Field tag parsing and per-type field metadata.
//!
//! A descriptor is built once per entity type (the [`entity!`](crate::entity)
//! macro memoizes it in a `OnceLock`) and reused by every mutation builder.

use crate::error::{DqlError, Result};
use crate::mutation::entity::ValueKind;

/// Predicate that marks the identifier field.
pub const UID_PREDICATE: &str = "uid";

/// Predicate carrying the type name of every inserted node.
pub const TYPE_PREDICATE: &str = "dgraph.type";

/// Raw registration entry for one field.
#[derive(Clone, Copy, Debug)]
pub struct FieldTag {
    /// Rust field name.
    pub field: &'static str,
    /// Tag text, `predicate[,json][,unique]` or `-`.
    pub tag: &'static str,
    /// Kind derived from the field's type.
    pub kind: ValueKind,
}

/// Parsed tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParsedTag<'a> {
    /// Predicate name; the field name when the tag leaves it empty.
    pub predicate: &'a str,
    /// Value is stored JSON-encoded.
    pub json: bool,
    /// Value must be unique among nodes of the type.
    pub unique: bool,
}

/// Parses `predicate[,option]*`. Returns `None` for excluded fields (`-`).
/// Unknown options are ignored.
pub fn parse_tag<'a>(tag: &'a str, field: &'a str) -> Option<ParsedTag<'a>> {
    if tag == "-" {
        return None;
    }
    let mut parts = tag.split(',');
    let predicate = match parts.next().map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => field,
    };
    let mut parsed = ParsedTag {
        predicate,
        json: false,
        unique: false,
    };
    for option in parts {
        match option.trim() {
            "json" => parsed.json = true,
            "unique" => parsed.unique = true,
            _ => {}
        }
    }
    Some(parsed)
}

/// Metadata for one mapped field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldDescriptor {
    /// Rust field name.
    pub field: &'static str,
    /// Predicate the field maps to.
    pub predicate: String,
    /// Value category.
    pub kind: ValueKind,
    /// Participates in duplicate detection.
    pub unique: bool,
}

impl FieldDescriptor {
    /// True when the value is JSON-encoded before quoting.
    pub fn is_json(&self) -> bool {
        self.kind == ValueKind::Json
    }

    /// True for text and JSON fields, which are emitted before scalars.
    pub fn is_text_like(&self) -> bool {
        matches!(self.kind, ValueKind::Text | ValueKind::Json)
    }

    /// True for the identifier field.
    pub fn is_identifier(&self) -> bool {
        self.predicate == UID_PREDICATE
    }
}

/// Ordered field metadata for one entity type.
#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    identifier: Option<usize>,
}

impl EntityDescriptor {
    /// Builds the descriptor from registration entries in declaration order.
    /// Excluded fields are dropped; the first field mapped to `uid` becomes
    /// the identifier. A `json` option on a nested field is ignored.
    pub fn from_tags(type_name: &'static str, tags: &[FieldTag]) -> Self {
        let fields: Vec<FieldDescriptor> = tags
            .iter()
            .filter_map(|entry| {
                let parsed = parse_tag(entry.tag, entry.field)?;
                let kind = if parsed.json && !entry.kind.is_nested() {
                    ValueKind::Json
                } else {
                    entry.kind
                };
                Some(FieldDescriptor {
                    field: entry.field,
                    predicate: parsed.predicate.to_owned(),
                    kind,
                    unique: parsed.unique,
                })
            })
            .collect();
        let identifier = fields.iter().position(FieldDescriptor::is_identifier);
        tracing::debug!(
            type_name,
            fields = fields.len(),
            has_identifier = identifier.is_some(),
            "registered entity"
        );
        Self {
            type_name,
            fields,
            identifier,
        }
    }

    /// Declared type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Mapped fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The identifier field, if one is mapped.
    pub fn identifier(&self) -> Option<&FieldDescriptor> {
        self.identifier.map(|i| &self.fields[i])
    }

    /// The identifier field, or [`DqlError::MissingIdentifierField`].
    pub fn require_identifier(&self) -> Result<&FieldDescriptor> {
        self.identifier()
            .ok_or_else(|| DqlError::missing_uid(self.type_name))
    }

    /// Fields other than the identifier, in declaration order.
    pub fn value_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.is_identifier())
    }

    /// Fields tagged `unique`, in declaration order.
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.unique)
    }

    /// True when at least one field is tagged `unique`.
    pub fn has_unique(&self) -> bool {
        self.unique_fields().next().is_some()
    }

    /// True when at least one field holds nested entities.
    pub fn has_nested(&self) -> bool {
        self.fields.iter().any(|f| f.kind.is_nested())
    }

    /// Looks up a field by predicate name.
    pub fn by_predicate(&self, predicate: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.predicate == predicate)
    }
}
