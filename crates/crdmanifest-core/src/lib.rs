//! crdmanifest core - Kubernetes custom resource schemas compiled to
//! presentation attributes and rendered to YAML manifests
//!
//! This crate provides:
//! - `FieldSpec`: declarative field trees, one per resource kind
//! - `CompiledSchema`: record shape, attribute tree and validator built from one declaration
//! - `Record`: decoded values with omit-empty semantics
//! - `render`: manifest rendering with fixed identity
//! - `Catalog` / `Provider`: the explicit type-name table and host boundary
//! - `CrdParser`: CustomResourceDefinition import

pub mod catalog;
pub mod compiler;
pub mod config;
pub mod crd;
pub mod error;
pub mod field;
pub mod kinds;
pub mod names;
pub mod provider;
pub mod record;
pub mod render;
pub mod resource;
pub mod validation;

pub use catalog::{Catalog, DEFAULT_TYPE_PREFIX};
pub use compiler::{
    Attribute, AttributeType, CompiledSchema, RecordShape, ShapeKind, Validator, compile_attribute,
};
pub use config::ProviderConfig;
pub use crd::CrdParser;
pub use error::{CoreError, Result, ValidationErrorInfo};
pub use field::{Bound, Constraints, FieldKind, FieldSpec, Primitive};
pub use provider::Provider;
pub use record::{FieldValue, Record};
pub use render::{RenderedManifest, RenderedOutput, render, render_config, render_record};
pub use resource::{ResourceSchema, Scope, TypeVariant};
pub use validation::{SchemaValidator, ValidationResult};
