//! Entity registration.
//!
//! Types that take part in mutations implement [`Entity`], normally through
//! the [`entity!`](crate::entity) macro. The macro records each mapped field
//! with its tag and lets the field's Rust type pick its [`ValueKind`] via
//! [`FieldType`].

use serde::Serialize;

use crate::error::{DqlError, Result};
use crate::mutation::descriptor::EntityDescriptor;

/// Value category of a mapped field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueKind {
    /// String-like value, emitted in the first pass.
    Text,
    /// Numeric or boolean value, emitted in the second pass.
    Scalar,
    /// Value JSON-encoded before quoting, emitted in the first pass.
    Json,
    /// Optional nested entity.
    Node,
    /// Collection of nested entities.
    Nodes,
}

impl ValueKind {
    /// True for nested entity fields.
    pub fn is_nested(self) -> bool {
        matches!(self, ValueKind::Node | ValueKind::Nodes)
    }
}

/// Borrowed view of one field's current value.
pub enum FieldValue<'a> {
    /// String value.
    Text(&'a str),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Pre-encoded JSON value, or the encoder failure.
    Json(serde_json::Result<serde_json::Value>),
    /// Optional nested entity.
    Node(Option<&'a dyn Entity>),
    /// Nested entities in order.
    Nodes(Vec<&'a dyn Entity>),
    /// The entity does not expose this field.
    Absent,
}

impl FieldValue<'_> {
    /// Zero values are skipped on insert and deleted on update.
    ///
    /// Floats are zero only for positive `0.0`. JSON values count as zero
    /// when they encode to `null`, `0`, `false`, `""`, `[]` or `{}`.
    /// Encoder failures are never zero so they surface as errors.
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Int(v) => *v == 0,
            FieldValue::UInt(v) => *v == 0,
            FieldValue::Float(v) => v.to_bits() == 0,
            FieldValue::Bool(v) => !*v,
            FieldValue::Json(Ok(value)) => match value {
                serde_json::Value::Null => true,
                serde_json::Value::Bool(b) => !b,
                serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f.to_bits() == 0),
                serde_json::Value::String(s) => s.is_empty(),
                serde_json::Value::Array(items) => items.is_empty(),
                serde_json::Value::Object(map) => map.is_empty(),
            },
            FieldValue::Json(Err(_)) => false,
            FieldValue::Node(node) => node.is_none(),
            FieldValue::Nodes(nodes) => nodes.is_empty(),
            FieldValue::Absent => true,
        }
    }

    /// Renders the value as the text placed between the quotes of an
    /// N-quad. JSON values (and any value of a `json`-tagged field) are
    /// encoded and their quotes escaped.
    pub fn render(self, field: &str, json: bool) -> Result<String> {
        if json {
            let encoded = match self {
                FieldValue::Json(value) => value.and_then(|v| serde_json::to_string(&v)),
                FieldValue::Text(s) => serde_json::to_string(s),
                FieldValue::Int(v) => serde_json::to_string(&v),
                FieldValue::UInt(v) => serde_json::to_string(&v),
                FieldValue::Float(v) => serde_json::to_string(&v),
                FieldValue::Bool(v) => serde_json::to_string(&v),
                FieldValue::Node(_) | FieldValue::Nodes(_) | FieldValue::Absent => {
                    return Err(DqlError::Shape {
                        op: "render",
                        expected: "a scalar or JSON field",
                    })
                }
            };
            let encoded = encoded.map_err(|source| DqlError::FieldSerialization {
                field: field.to_owned(),
                source,
            })?;
            return Ok(encoded.replace('"', "\\\""));
        }
        match self {
            FieldValue::Text(s) => Ok(s.to_owned()),
            FieldValue::Int(v) => Ok(v.to_string()),
            FieldValue::UInt(v) => Ok(v.to_string()),
            FieldValue::Float(v) => Ok(v.to_string()),
            FieldValue::Bool(v) => Ok(v.to_string()),
            FieldValue::Json(_) => self.render(field, true),
            FieldValue::Node(_) | FieldValue::Nodes(_) | FieldValue::Absent => {
                Err(DqlError::Shape {
                    op: "render",
                    expected: "a scalar or JSON field",
                })
            }
        }
    }
}

/// Mutable access to a field, used to write identifiers back.
pub enum FieldSlot<'a> {
    /// String field that can receive a uid.
    Text(&'a mut String),
    /// Optional nested entity.
    Node(Option<&'a mut dyn Entity>),
    /// Nested entities in order.
    Nodes(Vec<&'a mut dyn Entity>),
    /// Field cannot be written through this interface.
    Fixed,
}

/// Data entity that can be turned into N-quads.
///
/// Object safe so nested entity graphs can be walked through `&dyn Entity`.
pub trait Entity {
    /// Field metadata, built once per type.
    fn descriptor(&self) -> &'static EntityDescriptor;

    /// Optional replacement for the declared type name. Used for the
    /// `dgraph.type` value and the blank-node stem.
    fn type_override(&self) -> Option<&str> {
        None
    }

    /// Reads a mapped field by its Rust name.
    fn field(&self, name: &str) -> FieldValue<'_>;

    /// Mutable access to a mapped field by its Rust name.
    fn field_mut(&mut self, name: &str) -> FieldSlot<'_>;

    /// Emitted type name: the override, or the declared name.
    fn dgraph_type(&self) -> &str {
        match self.type_override() {
            Some(name) => name,
            None => self.descriptor().type_name(),
        }
    }
}

/// Lower-cased type name used as the blank-node stem and response key.
pub fn blank_node_name(entity: &dyn Entity) -> String {
    entity.dgraph_type().to_lowercase()
}

/// Maps a Rust field type to its [`ValueKind`] and value accessors.
pub trait FieldType {
    /// Kind reported to the descriptor.
    const KIND: ValueKind;

    /// Borrowed view of the value.
    fn read(&self) -> FieldValue<'_>;

    /// Mutable view of the value.
    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Fixed
    }
}

/// Returns the kind of a field from a reference to it. Used by
/// [`entity!`](crate::entity).
pub fn kind_of<T: FieldType>(_: &T) -> ValueKind {
    T::KIND
}

impl FieldType for String {
    const KIND: ValueKind = ValueKind::Text;

    fn read(&self) -> FieldValue<'_> {
        FieldValue::Text(self)
    }

    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Text(self)
    }
}

macro_rules! scalar_field {
    ($variant:ident as $wide:ty: $($ty:ty),*) => {
        $(
            impl FieldType for $ty {
                const KIND: ValueKind = ValueKind::Scalar;

                fn read(&self) -> FieldValue<'_> {
                    FieldValue::$variant(*self as $wide)
                }
            }
        )*
    };
}

scalar_field!(Int as i64: i8, i16, i32, i64, isize);
scalar_field!(UInt as u64: u8, u16, u32, u64, usize);
scalar_field!(Float as f64: f32, f64);

impl FieldType for bool {
    const KIND: ValueKind = ValueKind::Scalar;

    fn read(&self) -> FieldValue<'_> {
        FieldValue::Bool(*self)
    }
}

/// Wrapper for fields stored as JSON-encoded strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T: Serialize> FieldType for Json<T> {
    const KIND: ValueKind = ValueKind::Json;

    fn read(&self) -> FieldValue<'_> {
        FieldValue::Json(serde_json::to_value(&self.0))
    }
}

impl<E: Entity> FieldType for Option<Box<E>> {
    const KIND: ValueKind = ValueKind::Node;

    fn read(&self) -> FieldValue<'_> {
        FieldValue::Node(self.as_deref().map(|e| e as &dyn Entity))
    }

    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Node(self.as_deref_mut().map(|e| e as &mut dyn Entity))
    }
}

impl<E: Entity> FieldType for Vec<E> {
    const KIND: ValueKind = ValueKind::Nodes;

    fn read(&self) -> FieldValue<'_> {
        FieldValue::Nodes(self.iter().map(|e| e as &dyn Entity).collect())
    }

    fn slot(&mut self) -> FieldSlot<'_> {
        FieldSlot::Nodes(self.iter_mut().map(|e| e as &mut dyn Entity).collect())
    }
}

/// Implements [`Entity`] for a struct from a field → tag table.
///
/// Tag grammar is `predicate[,option]*` with options `json` and `unique`;
/// `"-"` excludes a field and an empty predicate falls back to the field
/// name. Exactly one field should map to `uid`.
///
/// ```
/// use dqlkit::entity;
///
/// #[derive(Default)]
/// struct User {
///     uid: String,
///     name: String,
///     age: i64,
///     email: String,
/// }
///
/// entity!(User {
///     uid => "uid",
///     name => "name",
///     age => "age",
///     email => "email,unique",
/// });
/// ```
///
/// An override type name goes after `as`: `entity!(UserRow as "User" { ... })`.
#[macro_export]
macro_rules! entity {
    ($ty:ident $(as $type_name:literal)? { $($field:ident => $tag:literal),* $(,)? }) => {
        impl $crate::mutation::Entity for $ty {
            fn descriptor(&self) -> &'static $crate::mutation::EntityDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<$crate::mutation::EntityDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    $crate::mutation::EntityDescriptor::from_tags(
                        stringify!($ty),
                        &[$(
                            $crate::mutation::FieldTag {
                                field: stringify!($field),
                                tag: $tag,
                                kind: $crate::mutation::entity::kind_of(&self.$field),
                            }
                        ),*],
                    )
                })
            }

            $(
                fn type_override(&self) -> ::std::option::Option<&str> {
                    ::std::option::Option::Some($type_name)
                }
            )?

            #[allow(unused_variables)]
            fn field(&self, name: &str) -> $crate::mutation::FieldValue<'_> {
                $(
                    if name == stringify!($field) {
                        return $crate::mutation::FieldType::read(&self.$field);
                    }
                )*
                $crate::mutation::FieldValue::Absent
            }

            #[allow(unused_variables)]
            fn field_mut(&mut self, name: &str) -> $crate::mutation::FieldSlot<'_> {
                $(
                    if name == stringify!($field) {
                        return $crate::mutation::FieldType::slot(&mut self.$field);
                    }
                )*
                $crate::mutation::FieldSlot::Fixed
            }
        }
    };
}
