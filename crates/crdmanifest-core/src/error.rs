//! Core error types

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    #[error("configuration is invalid: {}", summarize(errors))]
    #[diagnostic(
        code(crdmanifest::validation),
        help("correct the attributes listed above and retry")
    )]
    Validation { errors: Vec<ValidationErrorInfo> },

    #[error("manifest marshaling error: YAML marshaling failed: {source}")]
    #[diagnostic(code(crdmanifest::render::marshal))]
    Marshal {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown resource type '{type_name}'")]
    #[diagnostic(code(crdmanifest::catalog::unknown_type))]
    UnknownResourceType {
        type_name: String,
        #[help]
        help: Option<String>,
    },

    #[error("resource type '{type_name}' is registered twice")]
    #[diagnostic(code(crdmanifest::catalog::duplicate_type))]
    DuplicateResourceType { type_name: String },

    #[error("schema defect in {kind}: {}", defects.join("; "))]
    #[diagnostic(
        code(crdmanifest::schema::defect),
        help("this is a bug in the schema declaration, not in the supplied configuration")
    )]
    SchemaDefect { kind: String, defects: Vec<String> },

    #[error("value at '{path}' does not fit its declared shape: {message}")]
    #[diagnostic(code(crdmanifest::record::shape_mismatch))]
    ShapeMismatch { path: String, message: String },

    #[error("invalid CustomResourceDefinition: {message}")]
    #[diagnostic(code(crdmanifest::crd::invalid))]
    InvalidCrd { message: String },

    #[error("invalid schema: {message}")]
    #[diagnostic(code(crdmanifest::schema::invalid))]
    InvalidSchema { message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(crdmanifest::config::invalid))]
    InvalidConfig { message: String },

    #[error("Failed to parse YAML: {0}")]
    #[diagnostic(code(crdmanifest::yaml))]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    #[diagnostic(code(crdmanifest::json))]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(crdmanifest::io))]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Validation errors carried by this error, empty for every other variant
    pub fn validation_errors(&self) -> &[ValidationErrorInfo] {
        match self {
            Self::Validation { errors } => errors,
            _ => &[],
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// A single configuration diagnostic
///
/// `path` is the dotted attribute path (`metadata.name`, `spec.routes.0.port`)
/// and `rule` the constraint keyword that was violated (`minLength`,
/// `maximum`, `required`, `pattern`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrorInfo {
    pub path: String,
    pub rule: String,
    pub message: String,
}

impl std::fmt::Display for ValidationErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.rule)
    }
}

fn summarize(errors: &[ValidationErrorInfo]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, CoreError>;
