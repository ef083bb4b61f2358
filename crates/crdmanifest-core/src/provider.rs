//! Host boundary
//!
//! The plugin host addresses every operation by type name. A [`Provider`]
//! owns the [`Catalog`] it was built with and never consults global state.

use serde_json::Value as JsonValue;

use crate::catalog::Catalog;
use crate::compiler::{Attribute, CompiledSchema};
use crate::error::Result;
use crate::render::{self, RenderedOutput};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Provider {
    catalog: Catalog,
}

impl Provider {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Attribute tree for a manifest or data source type
    pub fn describe_type(&self, type_name: &str) -> Result<&[Attribute]> {
        self.schema(type_name).map(|schema| schema.attributes())
    }

    /// Attribute tree as JSON, the form handed to the host
    pub fn describe_type_json(&self, type_name: &str) -> Result<JsonValue> {
        let attributes = self.describe_type(type_name)?;
        Ok(serde_json::to_value(attributes)?)
    }

    /// Validate and render configuration for a manifest type
    pub fn render(&self, type_name: &str, config: &JsonValue) -> Result<String> {
        self.render_output(type_name, config)
            .map(|output| output.yaml)
    }

    /// Validate and render, returning the full state object (`config` + `id` + `yaml`)
    pub fn state(&self, type_name: &str, config: &JsonValue) -> Result<JsonValue> {
        let output = self.render_output(type_name, config)?;
        Ok(output.into_state(config))
    }

    /// Validate configuration without rendering
    pub fn validate(&self, type_name: &str, config: &JsonValue) -> Result<()> {
        self.catalog
            .manifest(type_name)?
            .validate(config)
            .into_result()
    }

    fn render_output(&self, type_name: &str, config: &JsonValue) -> Result<RenderedOutput> {
        let schema = self.catalog.manifest(type_name)?;
        render::render_config(schema, config)
    }

    /// Compiled schema behind either variant of a type name
    pub fn schema(&self, type_name: &str) -> Result<&Arc<CompiledSchema>> {
        self.catalog
            .manifest(type_name)
            .or_else(|_| self.catalog.data_source(type_name))
    }
}
