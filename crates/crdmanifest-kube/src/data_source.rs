//! Data source variant: fetch, decode, render
//!
//! The live object goes through the same record shape as caller
//! configuration, so anything the schema does not declare (`status`,
//! `metadata.uid`, `metadata.managedFields`, ...) never reaches the manifest.

use serde_json::Value as JsonValue;
use std::sync::Arc;

use crdmanifest_core::{Catalog, CompiledSchema, Record, RenderedOutput, render};

use crate::error::{KubeError, Result};
use crate::reader::{LiveReader, ObjectRef};

pub struct DataSource<R> {
    schema: Arc<CompiledSchema>,
    reader: R,
}

impl<R: LiveReader> DataSource<R> {
    pub fn new(schema: Arc<CompiledSchema>, reader: R) -> Self {
        Self { schema, reader }
    }

    /// Look up a `_data_source` type in the catalog
    pub fn from_catalog(catalog: &Catalog, type_name: &str, reader: R) -> Result<Self> {
        let schema = catalog.data_source(type_name)?;
        Ok(Self::new(Arc::clone(schema), reader))
    }

    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    /// Reference to the object a read would fetch
    ///
    /// `namespace` is required for namespaced kinds and ignored otherwise.
    pub fn object_ref(&self, namespace: Option<&str>, name: &str) -> Result<ObjectRef> {
        let resource = self.schema.resource();
        let object = ObjectRef::for_resource(resource, name);

        if !resource.is_namespaced() {
            return Ok(object);
        }
        match namespace {
            Some(ns) if !ns.is_empty() => Ok(object.in_namespace(ns)),
            _ => Err(KubeError::MissingNamespace {
                kind: resource.kind.clone(),
            }),
        }
    }

    /// Fetch the live object and render it
    ///
    /// A missing object yields `KubeError::NotFound` and no output.
    pub async fn read(&self, namespace: Option<&str>, name: &str) -> Result<RenderedOutput> {
        let object = self.object_ref(namespace, name)?;
        let live = self.reader.fetch(&object).await?;
        self.render_live(&live)
    }

    /// Fetch and render, returning the state object (`metadata` + `id` + `yaml`)
    pub async fn read_state(&self, namespace: Option<&str>, name: &str) -> Result<JsonValue> {
        let output = self.read(namespace, name).await?;

        let mut metadata = serde_json::Map::new();
        metadata.insert("name".to_string(), JsonValue::from(name));
        if let Some(ns) = namespace.filter(|_| self.schema.resource().is_namespaced()) {
            metadata.insert("namespace".to_string(), JsonValue::from(ns));
        }
        let config = serde_json::json!({ "metadata": metadata });

        Ok(output.into_state(&config))
    }

    /// Decode a raw live object through the schema's shape and render it
    pub fn render_live(&self, live: &JsonValue) -> Result<RenderedOutput> {
        let record = Record::decode(self.schema.shape(), live)?;
        Ok(render::render_record(&self.schema, &record)?)
    }
}
