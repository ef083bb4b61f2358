//! Type-name table
//!
//! A [`Catalog`] maps provider type names to compiled schemas. Every
//! registered resource contributes two entries: a `_manifest` type and a
//! `_data_source` type, both sharing one [`CompiledSchema`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::compiler::CompiledSchema;
use crate::error::{CoreError, Result};
use crate::resource::{ResourceSchema, TypeVariant};

/// Default type-name prefix
pub const DEFAULT_TYPE_PREFIX: &str = "k8s";

/// Maximum edit distance for "did you mean" suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

#[derive(Debug, Clone)]
pub struct Catalog {
    prefix: String,
    manifests: BTreeMap<String, Arc<CompiledSchema>>,
    data_sources: BTreeMap<String, Arc<CompiledSchema>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(DEFAULT_TYPE_PREFIX)
    }
}

impl Catalog {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            manifests: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        }
    }

    /// Build a catalog from a list of schemas, failing on the first defect
    pub fn from_schemas(
        prefix: impl Into<String>,
        schemas: impl IntoIterator<Item = ResourceSchema>,
    ) -> Result<Self> {
        let mut catalog = Self::new(prefix);
        for schema in schemas {
            catalog.register(schema)?;
        }
        Ok(catalog)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Compile and register a schema under both type names
    ///
    /// Returns the manifest type name.
    pub fn register(&mut self, schema: ResourceSchema) -> Result<String> {
        let manifest_name = schema.type_name(&self.prefix, TypeVariant::Manifest);
        let data_source_name = schema.type_name(&self.prefix, TypeVariant::DataSource);

        if self.manifests.contains_key(&manifest_name) {
            return Err(CoreError::DuplicateResourceType {
                type_name: manifest_name,
            });
        }

        let compiled = CompiledSchema::compile_shared(schema)?;
        self.manifests
            .insert(manifest_name.clone(), Arc::clone(&compiled));
        self.data_sources.insert(data_source_name, compiled);

        tracing::debug!(type_name = %manifest_name, "registered resource type");
        Ok(manifest_name)
    }

    /// Look up a manifest type
    pub fn manifest(&self, type_name: &str) -> Result<&Arc<CompiledSchema>> {
        self.manifests
            .get(type_name)
            .ok_or_else(|| self.unknown(type_name))
    }

    /// Look up a data source type
    pub fn data_source(&self, type_name: &str) -> Result<&Arc<CompiledSchema>> {
        self.data_sources
            .get(type_name)
            .ok_or_else(|| self.unknown(type_name))
    }

    pub fn manifest_types(&self) -> impl Iterator<Item = &str> {
        self.manifests.keys().map(String::as_str)
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }

    /// Every distinct compiled schema, in manifest type-name order
    pub fn schemas(&self) -> impl Iterator<Item = &Arc<CompiledSchema>> {
        self.manifests.values()
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    /// Recompile every registered schema and compare with the stored one
    ///
    /// Fails with [`CoreError::SchemaDefect`] when compilation is not
    /// deterministic for some kind.
    pub fn self_check(&self) -> Result<()> {
        for (type_name, compiled) in &self.manifests {
            let again = CompiledSchema::compile(compiled.resource().clone())?;
            if again != **compiled {
                return Err(CoreError::SchemaDefect {
                    kind: type_name.clone(),
                    defects: vec!["compiling twice produced different trees".to_string()],
                });
            }
        }
        Ok(())
    }

    fn unknown(&self, type_name: &str) -> CoreError {
        let suggestion = self
            .manifests
            .keys()
            .chain(self.data_sources.keys())
            .map(|candidate| (strsim::levenshtein(type_name, candidate), candidate))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance);

        CoreError::UnknownResourceType {
            type_name: type_name.to_string(),
            help: suggestion.map(|(_, candidate)| format!("did you mean '{}'?", candidate)),
        }
    }
}
