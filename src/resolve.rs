//! Field resolution - reading a generated field's value from an instance.
//!
//! Generated fields are named in `camelCase`; each carries the `snake_case`
//! key it was generated from, and lookups use that key verbatim. An instance
//! is inspected once to pick where keys are looked up, in this order:
//!
//! 1. the instance is itself a mapping;
//! 2. it embeds a mapping payload;
//! 3. it embeds a structured document, whose own mapping is used;
//! 4. otherwise the key is read as an attribute of the instance.
//!
//! A missing key yields the caller's default. A mapping resolved for a
//! list-typed field is lowered to entry records.

use serde_json::{Map, Value};
use tracing::debug;

use crate::entries::lower_for;
use crate::output::{GeneratedField, ObjectType, OutputType, UnionType};
use crate::types::DocumentKind;

/// Field used to tag projected union values with their member type.
pub const TYPENAME_KEY: &str = "__typename";

/// A structured configuration document with its own keyed storage.
pub trait ConfigDocument {
    fn kind(&self) -> DocumentKind;

    /// The document's raw keyed data.
    fn doc(&self) -> &Map<String, Value>;
}

/// Plain in-memory configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub kind: DocumentKind,
    pub doc: Map<String, Value>,
}

impl Document {
    pub fn new(kind: DocumentKind, doc: Map<String, Value>) -> Self {
        Self { kind, doc }
    }

    /// Wrap a JSON value; `None` unless it is an object.
    pub fn from_value(kind: DocumentKind, value: Value) -> Option<Self> {
        match value {
            Value::Object(doc) => Some(Self::new(kind, doc)),
            _ => None,
        }
    }
}

impl ConfigDocument for Document {
    fn kind(&self) -> DocumentKind {
        self.kind
    }

    fn doc(&self) -> &Map<String, Value> {
        &self.doc
    }
}

/// Payload embedded in an instance.
#[derive(Clone, Copy)]
pub enum Payload<'a> {
    Mapping(&'a Map<String, Value>),
    Document(&'a dyn ConfigDocument),
}

/// Something generated fields can be resolved against.
///
/// Implementors provide whichever capabilities match their shape; the
/// defaults report "not available".
pub trait Resolvable {
    /// The instance itself as a mapping.
    fn as_mapping(&self) -> Option<&Map<String, Value>> {
        None
    }

    /// An embedded payload.
    fn data(&self) -> Option<Payload<'_>> {
        None
    }

    /// Read an attribute by its `snake_case` name.
    fn attribute(&self, _name: &str) -> Option<Value> {
        None
    }
}

impl Resolvable for Map<String, Value> {
    fn as_mapping(&self) -> Option<&Map<String, Value>> {
        Some(self)
    }
}

impl Resolvable for Value {
    fn as_mapping(&self) -> Option<&Map<String, Value>> {
        self.as_object()
    }
}

impl Resolvable for Document {
    fn data(&self) -> Option<Payload<'_>> {
        Some(Payload::Document(self))
    }
}

/// An instance carrying its data as an embedded payload.
#[derive(Clone, Copy)]
pub struct Embedded<'a> {
    payload: Payload<'a>,
}

impl<'a> Embedded<'a> {
    pub fn mapping(map: &'a Map<String, Value>) -> Self {
        Self {
            payload: Payload::Mapping(map),
        }
    }

    pub fn document(document: &'a dyn ConfigDocument) -> Self {
        Self {
            payload: Payload::Document(document),
        }
    }
}

impl Resolvable for Embedded<'_> {
    fn data(&self) -> Option<Payload<'_>> {
        Some(self.payload)
    }
}

/// Resolve one generated field against `instance`.
///
/// Returns `default` when the field's source key is absent; a present
/// `null` is returned as is.
pub fn resolve_field(field: &GeneratedField, instance: &dyn Resolvable, default: Value) -> Value {
    let key = field.source_key();
    let raw = match Source::of(instance) {
        Source::Mapping(map) => map.get(key).cloned(),
        Source::Attributes(instance) => instance.attribute(key),
    };
    match raw {
        Some(value) => lower_for(&field.ty, value),
        None => default,
    }
}

/// Resolve a generated field, defaulting to `null`.
pub fn resolve(field: &GeneratedField, instance: &dyn Resolvable) -> Value {
    resolve_field(field, instance, Value::Null)
}

/// Resolve every field of `object` against `instance`, recursing into
/// nested objects, lists and unions.
///
/// Union values are tagged with [`TYPENAME_KEY`]; a union value matching no
/// member projects to `null`.
pub fn project(object: &ObjectType, instance: &dyn Resolvable) -> Map<String, Value> {
    object
        .fields
        .iter()
        .map(|field| {
            let value = project_value(&field.ty, resolve(field, instance));
            (field.name.clone(), value)
        })
        .collect()
}

/// Pick the union member describing `value`.
///
/// A member whose discriminator key is present wins. When members declare
/// discriminators and none match, the member without one is the fallback.
/// Otherwise the first member whose required fields are all present wins.
pub fn select_member<'u>(union: &'u UnionType, value: &Map<String, Value>) -> Option<&'u ObjectType> {
    let members = || union.members.iter().map(|m| &**m);

    if let Some(member) = members().find(|m| {
        m.discriminator
            .as_ref()
            .is_some_and(|key| value.contains_key(key))
    }) {
        return Some(member);
    }
    if members().any(|m| m.discriminator.is_some()) {
        return members().find(|m| m.discriminator.is_none());
    }
    members().find(|m| {
        m.fields
            .iter()
            .filter(|f| f.required)
            .all(|f| value.contains_key(f.source_key()))
    })
}

// --- Internal implementation ---

/// Where keys are looked up, chosen once per resolution.
enum Source<'a> {
    Mapping(&'a Map<String, Value>),
    Attributes(&'a dyn Resolvable),
}

impl<'a> Source<'a> {
    fn of(instance: &'a dyn Resolvable) -> Self {
        if let Some(map) = instance.as_mapping() {
            return Source::Mapping(map);
        }
        match instance.data() {
            Some(Payload::Mapping(map)) => Source::Mapping(map),
            Some(Payload::Document(document)) => Source::Mapping(document.doc()),
            None => Source::Attributes(instance),
        }
    }
}

fn project_value(ty: &OutputType, value: Value) -> Value {
    match (ty, value) {
        (OutputType::Scalar(_), value) => value,
        (OutputType::Object(object), Value::Object(map)) => Value::Object(project(object, &map)),
        (OutputType::Union(union), Value::Object(map)) => match select_member(union, &map) {
            Some(member) => {
                let mut projected = Map::new();
                projected.insert(TYPENAME_KEY.to_string(), Value::String(member.name.clone()));
                projected.extend(project(member, &map));
                Value::Object(projected)
            }
            None => {
                debug!(union = %union.name, "value matches no union member");
                Value::Null
            }
        },
        (OutputType::List(element), Value::Array(items)) => Value::Array(
            items
                .into_iter()
                .map(|item| project_value(element, lower_for(element, item)))
                .collect(),
        ),
        (_, value) => value,
    }
}
