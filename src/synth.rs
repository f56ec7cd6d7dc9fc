//! Type synthesis - walks a schema tree and its documentation tree and
//! produces API types.
//!
//! Every nested construct is named by appending the capitalized field name
//! to its parent's name (`ServiceConfiguration` -> `ServiceConfigurationLogging`),
//! so names are unique across a tree without a counter. Named types are kept
//! in a [`Registry`] owned by the [`TypeSynthesizer`]; a name is generated at
//! most once per synthesizer and later requests return the cached instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::docs::{DocEntry, DocTree, MAP_KEY_TERM};
use crate::entries::entry_record;
use crate::error::{DocError, SynthError};
use crate::naming::{first_upper, snake_to_camel};
use crate::output::{GeneratedField, NamedType, ObjectType, OutputScalar, OutputType, UnionType};
use crate::progress::ProgressStep;
use crate::types::{
    DocumentCatalog, DocumentDefinition, DocumentKind, ScalarKind, SchemaNode, SynthOptions,
    Validator, SYSTEM_KEY_PREFIX,
};

/// Kind of a non-fatal synthesis advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    /// Field skipped because it has no documentation.
    Undocumented,
    /// Union of different scalars degraded to the generic scalar.
    ScalarUnion,
    /// `any` field exposed as untyped JSON.
    Untyped,
}

/// A non-fatal finding recorded during synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    /// Generated name of the affected field.
    pub path: String,
    pub kind: AdvisoryKind,
    pub message: String,
}

/// Generated types by name, plus the entry-record cache.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    types: IndexMap<String, NamedType>,
    /// Entry records keyed by value-type fragment.
    entries: HashMap<String, Arc<ObjectType>>,
    advisories: Vec<Advisory>,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    /// Types in registration order (dependencies before dependents).
    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            types: self.types.len(),
            advisories: self.advisories.len(),
        }
    }

    /// Drop everything registered since `checkpoint`.
    fn rollback(&mut self, checkpoint: Checkpoint) {
        debug!(
            discarded = self.types.len() - checkpoint.types,
            "rolling back failed synthesis run"
        );
        self.types.truncate(checkpoint.types);
        self.advisories.truncate(checkpoint.advisories);
        let types = &self.types;
        self.entries.retain(|_, record| types.contains_key(&record.name));
    }

    fn register_object(&mut self, object: ObjectType) -> Arc<ObjectType> {
        let object = Arc::new(object);
        self.types
            .insert(object.name.clone(), NamedType::Object(Arc::clone(&object)));
        object
    }

    fn register_union(&mut self, union: UnionType) -> Arc<UnionType> {
        let union = Arc::new(union);
        self.types
            .insert(union.name.clone(), NamedType::Union(Arc::clone(&union)));
        union
    }

    fn cached_object(&self, name: &str) -> Result<Option<Arc<ObjectType>>, SynthError> {
        match self.types.get(name) {
            None => Ok(None),
            Some(NamedType::Object(object)) => Ok(Some(Arc::clone(object))),
            Some(NamedType::Union(_)) => Err(SynthError::conversion(
                name,
                "name is already used by a union type",
            )),
        }
    }

    fn cached_union(&self, name: &str) -> Result<Option<Arc<UnionType>>, SynthError> {
        match self.types.get(name) {
            None => Ok(None),
            Some(NamedType::Union(union)) => Ok(Some(Arc::clone(union))),
            Some(NamedType::Object(_)) => Err(SynthError::conversion(
                name,
                "name is already used by an object type",
            )),
        }
    }
}

/// Registry sizes at the start of a top-level run. Types are only ever
/// appended, so truncating to these sizes undoes the run.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    types: usize,
    advisories: usize,
}

/// Generates API types for the documents of a catalog.
///
/// The registry sits behind one lock held for a whole synthesis run, so
/// concurrent first requests for the same document generate it once; the
/// other callers wait and receive the cached type.
#[derive(Debug)]
pub struct TypeSynthesizer<C> {
    catalog: C,
    options: SynthOptions,
    registry: Mutex<Registry>,
}

impl<C: DocumentCatalog> TypeSynthesizer<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_options(catalog, SynthOptions::default())
    }

    pub fn with_options(catalog: C, options: SynthOptions) -> Self {
        Self {
            catalog,
            options,
            registry: Mutex::new(Registry::default()),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn options(&self) -> &SynthOptions {
        &self.options
    }

    /// Generate (or fetch) the object type of one document definition.
    ///
    /// Documents referenced by the definition's schema are generated from
    /// the catalog as needed.
    ///
    /// # Errors
    ///
    /// Returns `SynthError` if any node of the tree cannot be converted.
    /// Nothing generated during a failed call stays in the registry.
    pub fn synthesize(&self, definition: &DocumentDefinition) -> Result<Arc<ObjectType>, SynthError> {
        let mut registry = self.lock();
        let checkpoint = registry.checkpoint();
        let result = Walk::new(&self.catalog, &self.options, &mut registry).definition(definition);
        if result.is_err() {
            registry.rollback(checkpoint);
        }
        result
    }

    /// Generate (or fetch) the API type of a document kind.
    ///
    /// A kind with one definition yields its object type; a kind with
    /// several variants yields a union named after the kind.
    pub fn document_type(&self, kind: DocumentKind) -> Result<OutputType, SynthError> {
        let mut registry = self.lock();
        let checkpoint = registry.checkpoint();
        let result =
            Walk::new(&self.catalog, &self.options, &mut registry).document(kind.type_name(), kind);
        if result.is_err() {
            registry.rollback(checkpoint);
        }
        result
    }

    /// Generate every kind in the catalog, reporting progress per kind.
    ///
    /// The final step has `is_end` set; a failure is reported as an error
    /// step before the error is returned.
    pub fn synthesize_catalog<F>(&self, mut on_progress: F) -> Result<Vec<OutputType>, SynthError>
    where
        F: FnMut(ProgressStep),
    {
        let kinds = self.catalog.kinds();
        let steps = kinds.len() as u32;
        let mut generated = Vec::with_capacity(kinds.len());

        for (current, kind) in kinds.into_iter().enumerate() {
            let current = current as u32;
            on_progress(ProgressStep::new(
                steps,
                current,
                format!("Generating {kind} types..."),
            ));
            match self.document_type(kind) {
                Ok(ty) => generated.push(ty),
                Err(err) => {
                    on_progress(ProgressStep::error(steps, current, err.to_string()));
                    return Err(err);
                }
            }
        }

        let count = self.lock().len();
        on_progress(ProgressStep::end(
            steps,
            steps,
            format!("Generated {count} types"),
        ));
        Ok(generated)
    }

    /// Look up a generated type by name.
    pub fn lookup(&self, name: &str) -> Option<NamedType> {
        self.lock().get(name).cloned()
    }

    /// Snapshot of all generated types in registration order.
    pub fn types(&self) -> Vec<NamedType> {
        self.lock().types().cloned().collect()
    }

    /// Snapshot of the advisories recorded so far.
    pub fn advisories(&self) -> Vec<Advisory> {
        self.lock().advisories().to_vec()
    }

    // A panic mid-run leaves only fully built types registered.
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// --- Internal implementation ---

/// One synthesis run over a locked registry.
struct Walk<'a, C> {
    catalog: &'a C,
    options: &'a SynthOptions,
    registry: &'a mut Registry,
    /// Top-level documents currently being generated.
    in_progress: Vec<String>,
}

impl<'a, C: DocumentCatalog> Walk<'a, C> {
    fn new(catalog: &'a C, options: &'a SynthOptions, registry: &'a mut Registry) -> Self {
        Self {
            catalog,
            options,
            registry,
            in_progress: Vec::new(),
        }
    }

    fn definition(&mut self, definition: &DocumentDefinition) -> Result<Arc<ObjectType>, SynthError> {
        let name = definition.name.as_str();
        if let Some(existing) = self.registry.cached_object(name)? {
            return Ok(existing);
        }
        if self.in_progress.iter().any(|n| n == name) {
            return Err(SynthError::conversion(
                name,
                format!(
                    "cyclic document reference: {} -> {name}",
                    self.in_progress.join(" -> ")
                ),
            ));
        }
        let SchemaNode::Object(fields) = &definition.schema else {
            return Err(SynthError::conversion(
                name,
                "only objects are allowed as top-level document schemas",
            ));
        };

        info!(name, kind = %definition.kind, "generating API type");
        self.in_progress.push(name.to_string());
        let generated = self.fields(name, fields, &definition.docs, &definition.skip_fields);
        self.in_progress.pop();

        Ok(self.registry.register_object(ObjectType {
            name: name.to_string(),
            description: definition.description.clone(),
            fields: non_empty(name, generated?)?,
            discriminator: definition.discriminator.clone(),
        }))
    }

    fn document(&mut self, path: &str, kind: DocumentKind) -> Result<OutputType, SynthError> {
        let catalog = self.catalog;
        match catalog.definitions(kind) {
            [] => Err(SynthError::conversion(
                path,
                format!("no document definition for kind '{kind}'"),
            )),
            [single] => self.definition(single).map(OutputType::Object),
            variants => self.variants(kind, variants).map(OutputType::Union),
        }
    }

    fn variants(
        &mut self,
        kind: DocumentKind,
        variants: &[DocumentDefinition],
    ) -> Result<Arc<UnionType>, SynthError> {
        let name = kind.type_name();
        if let Some(existing) = self.registry.cached_union(name)? {
            return Ok(existing);
        }
        let members = variants
            .iter()
            .map(|variant| self.definition(variant))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.registry.register_union(UnionType {
            name: name.to_string(),
            description: None,
            members,
        }))
    }

    fn fields(
        &mut self,
        parent: &str,
        fields: &IndexMap<String, SchemaNode>,
        docs: &DocTree,
        skip: &[String],
    ) -> Result<Vec<GeneratedField>, SynthError> {
        let mut generated: Vec<GeneratedField> = Vec::new();
        for (key, node) in fields {
            let name = snake_to_camel(key);
            if name.starts_with(SYSTEM_KEY_PREFIX) || skip.iter().any(|s| s == key) {
                continue;
            }
            let path = format!("{parent}{}", first_upper(&name));
            let Some(doc) = docs.get(key) else {
                self.advise(
                    path,
                    AdvisoryKind::Undocumented,
                    format!("skipped {key}, it was not documented"),
                );
                continue;
            };

            if let Some(clash) = generated.iter().find(|f| f.name == name) {
                return Err(SynthError::conversion(
                    &path,
                    format!("{key} and {} both generate the field {name}", clash.source),
                ));
            }

            let (required, node) = match node {
                SchemaNode::Optional(inner) => (false, inner.as_ref()),
                other => (true, other),
            };
            generated.push(GeneratedField {
                ty: self.ty(&path, node, Some(doc))?,
                name,
                source: key.clone(),
                required,
                description: doc.description().map(str::to_owned),
            });
        }
        Ok(generated)
    }

    fn ty(&mut self, path: &str, node: &SchemaNode, doc: Option<&DocEntry>) -> Result<OutputType, SynthError> {
        match node {
            SchemaNode::Scalar(kind) => Ok(OutputType::Scalar(self.scalar(path, *kind))),
            SchemaNode::Optional(inner) => self.ty(path, inner, doc),
            SchemaNode::Union(alternatives) => self.union(path, alternatives, doc),
            SchemaNode::Object(fields) => {
                let Some(DocEntry::Nested { text, fields: docs }) = doc else {
                    return Err(SynthError::Documentation {
                        path: path.to_string(),
                        source: DocError::MissingDefinitionList,
                    });
                };
                self.object(path, text.clone(), fields, docs)
                    .map(OutputType::Object)
            }
            SchemaNode::List(element) => Ok(OutputType::list(self.ty(path, element, doc)?)),
            SchemaNode::StringKeyedMap(value) => self.entry_list(path, value, doc),
            SchemaNode::TypeReference(kind) => self.document(path, *kind),
            SchemaNode::Validated(validator) => match validator {
                Validator::DocReference { target } => self.document(path, *target),
                Validator::Alternatives { alternatives } => self.union(path, alternatives, doc),
                Validator::Custom { name } => Err(SynthError::UnsupportedValidator {
                    path: path.to_string(),
                    validator: name.clone(),
                }),
            },
        }
    }

    fn scalar(&mut self, path: &str, kind: ScalarKind) -> OutputScalar {
        match kind {
            ScalarKind::String => OutputScalar::String,
            ScalarKind::Integer => OutputScalar::Int,
            ScalarKind::Float => OutputScalar::Float,
            ScalarKind::Boolean => OutputScalar::Boolean,
            ScalarKind::Any => {
                self.advise(
                    path.to_string(),
                    AdvisoryKind::Untyped,
                    format!("{path} was any. This field will be available as JSON only."),
                );
                OutputScalar::Json
            }
        }
    }

    fn object(
        &mut self,
        name: &str,
        description: Option<String>,
        fields: &IndexMap<String, SchemaNode>,
        docs: &DocTree,
    ) -> Result<Arc<ObjectType>, SynthError> {
        if let Some(existing) = self.registry.cached_object(name)? {
            return Ok(existing);
        }
        let fields = non_empty(name, self.fields(name, fields, docs, &[])?)?;
        Ok(self.registry.register_object(ObjectType {
            name: name.to_string(),
            description,
            fields,
            discriminator: None,
        }))
    }

    fn entry_list(&mut self, path: &str, value: &SchemaNode, doc: Option<&DocEntry>) -> Result<OutputType, SynthError> {
        let value_doc = match doc {
            Some(DocEntry::Nested { fields, .. }) => match fields.get(MAP_KEY_TERM) {
                Some(entry) => Some(entry),
                None => {
                    return Err(SynthError::conversion(
                        path,
                        format!("mapping documentation must describe its values under {MAP_KEY_TERM}"),
                    ))
                }
            },
            other => other,
        };
        let value_ty = self.ty(path, value, value_doc)?;
        Ok(OutputType::list(OutputType::Object(self.entry(value_ty)?)))
    }

    fn entry(&mut self, value: OutputType) -> Result<Arc<ObjectType>, SynthError> {
        let fragment = value.name_fragment();
        if let Some(existing) = self.registry.entries.get(&fragment) {
            return Ok(Arc::clone(existing));
        }
        let record = entry_record(value);
        if self.registry.types.contains_key(&record.name) {
            return Err(SynthError::conversion(
                &record.name,
                "entry record name collides with a generated type",
            ));
        }
        let record = self.registry.register_object(record);
        self.registry.entries.insert(fragment, Arc::clone(&record));
        Ok(record)
    }

    fn union(
        &mut self,
        path: &str,
        alternatives: &[SchemaNode],
        doc: Option<&DocEntry>,
    ) -> Result<OutputType, SynthError> {
        if let Some(existing) = self.registry.cached_union(path)? {
            return Ok(OutputType::Union(existing));
        }
        if alternatives.is_empty() {
            return Err(SynthError::conversion(path, "union has no alternatives"));
        }

        let mut types = Vec::with_capacity(alternatives.len());
        for (i, alternative) in alternatives.iter().enumerate() {
            let alternative_path = format!("{path}Alternative{}", i + 1);
            types.push(self.ty(&alternative_path, alternative, doc)?);
        }

        let scalars: Vec<OutputScalar> = types
            .iter()
            .filter_map(|t| match t {
                OutputType::Scalar(scalar) => Some(*scalar),
                _ => None,
            })
            .collect();

        if scalars.len() == types.len() {
            let first = scalars[0];
            if scalars.iter().all(|s| *s == first) {
                return Ok(OutputType::Scalar(first));
            }
            if self.options.strict_unions {
                return Err(SynthError::AmbiguousUnion {
                    path: path.to_string(),
                });
            }
            self.advise(
                path.to_string(),
                AdvisoryKind::ScalarUnion,
                format!("{path} can be multiple different scalars. This is not recommended."),
            );
            return Ok(OutputType::Scalar(OutputScalar::Generic));
        }
        if !scalars.is_empty() {
            return Err(SynthError::MixedUnion {
                path: path.to_string(),
            });
        }

        let mut members: Vec<Arc<ObjectType>> = Vec::new();
        for ty in types {
            let candidates = match ty {
                OutputType::Object(object) => vec![object],
                // Unions cannot nest; flatten into this one.
                OutputType::Union(union) => union.members.clone(),
                OutputType::List(_) | OutputType::Scalar(_) => {
                    return Err(SynthError::conversion(
                        path,
                        "lists cannot be union alternatives",
                    ))
                }
            };
            for candidate in candidates {
                if !members.iter().any(|m| Arc::ptr_eq(m, &candidate)) {
                    members.push(candidate);
                }
            }
        }

        Ok(OutputType::Union(self.registry.register_union(UnionType {
            name: path.to_string(),
            description: doc.and_then(DocEntry::description).map(str::to_owned),
            members,
        })))
    }

    fn advise(&mut self, path: String, kind: AdvisoryKind, message: String) {
        debug!(path = %path, ?kind, "{message}");
        self.registry.advisories.push(Advisory {
            path,
            kind,
            message,
        });
    }
}

/// Objects must expose at least one field.
fn non_empty(name: &str, fields: Vec<GeneratedField>) -> Result<Vec<GeneratedField>, SynthError> {
    if fields.is_empty() {
        return Err(SynthError::conversion(
            name,
            "object has no documented fields to generate",
        ));
    }
    Ok(fields)
}
