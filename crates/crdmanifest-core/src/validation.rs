//! Configuration validation
//!
//! Attribute trees are converted to a draft-07 JSON Schema once, at compile
//! time, and validated with `jsonschema`. Optional attributes also accept
//! `null`, which is how hosts send unset values. Nested objects reject unknown
//! attributes; the root accepts anything besides its declared attributes so
//! that caller-supplied `apiVersion`/`kind`/`yaml` are ignored rather than
//! rejected.

use jsonschema::error::ValidationErrorKind;
use serde_json::{Map, Value as JsonValue};

use crate::compiler::{Attribute, AttributeType, Validator};
use crate::error::{CoreError, Result, ValidationErrorInfo};

/// Result of schema validation
#[derive(Debug)]
pub struct ValidationResult {
    /// Whether the values are valid
    pub is_valid: bool,
    /// Validation errors
    pub errors: Vec<ValidationErrorInfo>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
        }
    }

    /// Create a failed validation result with errors
    pub fn failure(errors: Vec<ValidationErrorInfo>) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(CoreError::Validation {
                errors: self.errors,
            })
        }
    }
}

/// Schema validator with cached compiled schema
pub struct SchemaValidator {
    json_schema: JsonValue,
    compiled: jsonschema::Validator,
}

impl SchemaValidator {
    /// Build the validator for a set of root attributes
    pub fn new(attributes: &[Attribute]) -> Result<Self> {
        let json_schema = to_json_schema(attributes);
        let compiled =
            jsonschema::validator_for(&json_schema).map_err(|e| CoreError::InvalidSchema {
                message: format!("Invalid schema: {}", e),
            })?;

        Ok(Self {
            json_schema,
            compiled,
        })
    }

    /// The generated JSON Schema
    pub fn json_schema(&self) -> &JsonValue {
        &self.json_schema
    }

    /// Validate values against the schema
    pub fn validate(&self, values: &JsonValue) -> ValidationResult {
        if self.compiled.is_valid(values) {
            return ValidationResult::success();
        }

        let errors = self
            .compiled
            .iter_errors(values)
            .map(|e| error_info(&e))
            .collect();

        ValidationResult::failure(errors)
    }
}

/// Root JSON Schema for a set of attributes; computed attributes are skipped
pub fn to_json_schema(attributes: &[Attribute]) -> JsonValue {
    let mut schema = Map::new();

    schema.insert(
        "$schema".into(),
        JsonValue::String("http://json-schema.org/draft-07/schema#".into()),
    );
    schema.insert("type".into(), JsonValue::String("object".into()));

    let (properties, required) = properties_schema(attributes);
    schema.insert("properties".into(), properties);
    if !required.is_empty() {
        schema.insert("required".into(), required_list(required));
    }

    JsonValue::Object(schema)
}

fn properties_schema(attributes: &[Attribute]) -> (JsonValue, Vec<String>) {
    let mut props = Map::new();
    let mut required = Vec::new();

    for attr in attributes.iter().filter(|a| !a.computed) {
        props.insert(attr.name.clone(), attribute_schema(attr, !attr.required));
        if attr.required {
            required.push(attr.name.clone());
        }
    }

    (JsonValue::Object(props), required)
}

fn required_list(names: Vec<String>) -> JsonValue {
    JsonValue::Array(names.into_iter().map(JsonValue::String).collect())
}

fn attribute_schema(attr: &Attribute, nullable: bool) -> JsonValue {
    let mut json = Map::new();

    let types: &[&str] = match &attr.ty {
        AttributeType::String => &["string"],
        AttributeType::Int64 => &["integer"],
        AttributeType::Float64 => &["number"],
        AttributeType::Bool => &["boolean"],
        AttributeType::IntOrString => &["integer", "string"],
        // JSON Schema has no "any", omit type
        AttributeType::Dynamic => &[],
        AttributeType::List { element } => {
            // list elements are never null
            json.insert("items".into(), attribute_schema(element, false));
            &["array"]
        }
        AttributeType::Map { keys, values } => {
            let mut key_schema = Map::new();
            apply_validators(&mut key_schema, keys, false);
            if !key_schema.is_empty() {
                json.insert("propertyNames".into(), JsonValue::Object(key_schema));
            }

            let mut value_schema = Map::new();
            value_schema.insert("type".into(), JsonValue::String("string".into()));
            apply_validators(&mut value_schema, values, false);
            json.insert(
                "additionalProperties".into(),
                JsonValue::Object(value_schema),
            );
            &["object"]
        }
        AttributeType::Object { attributes } => {
            let (properties, required) = properties_schema(attributes);
            json.insert("properties".into(), properties);
            if !required.is_empty() {
                json.insert("required".into(), required_list(required));
            }
            json.insert("additionalProperties".into(), JsonValue::Bool(false));
            &["object"]
        }
    };

    if !types.is_empty() {
        json.insert("type".into(), type_keyword(types, nullable));
    }
    if let Some(desc) = &attr.description {
        json.insert("description".into(), JsonValue::String(desc.clone()));
    }
    apply_validators(&mut json, &attr.validators, nullable);

    // integers decode as i64
    if matches!(attr.ty, AttributeType::Int64 | AttributeType::IntOrString) {
        json.entry("minimum").or_insert_with(|| JsonValue::from(i64::MIN));
        json.entry("maximum").or_insert_with(|| JsonValue::from(i64::MAX));
    }

    JsonValue::Object(json)
}

fn type_keyword(types: &[&str], nullable: bool) -> JsonValue {
    if types.len() == 1 && !nullable {
        return JsonValue::String(types[0].to_string());
    }
    let mut all: Vec<JsonValue> = types.iter().map(|t| JsonValue::from(*t)).collect();
    if nullable {
        all.push(JsonValue::from("null"));
    }
    JsonValue::Array(all)
}

fn apply_validators(json: &mut Map<String, JsonValue>, validators: &[Validator], nullable: bool) {
    for validator in validators {
        match validator {
            Validator::LengthAtLeast(n) => {
                json.insert("minLength".into(), JsonValue::from(*n));
            }
            Validator::LengthAtMost(n) => {
                json.insert("maxLength".into(), JsonValue::from(*n));
            }
            Validator::AtLeast(b) => {
                json.insert("minimum".into(), b.to_json());
            }
            Validator::AtMost(b) => {
                json.insert("maximum".into(), b.to_json());
            }
            Validator::Between(min, max) => {
                json.insert("minimum".into(), min.to_json());
                json.insert("maximum".into(), max.to_json());
            }
            Validator::RegexMatches(p) => {
                json.insert("pattern".into(), JsonValue::String(p.clone()));
            }
            Validator::OneOf(values) => {
                let mut allowed: Vec<JsonValue> =
                    values.iter().cloned().map(JsonValue::String).collect();
                if nullable {
                    allowed.push(JsonValue::Null);
                }
                json.insert("enum".into(), JsonValue::Array(allowed));
            }
            Validator::SizeAtLeast(n) => {
                json.insert("minItems".into(), JsonValue::from(*n));
            }
            Validator::SizeAtMost(n) => {
                json.insert("maxItems".into(), JsonValue::from(*n));
            }
        }
    }
}

/// Map a `jsonschema` error to a path-named diagnostic
fn error_info(error: &jsonschema::ValidationError) -> ValidationErrorInfo {
    let schema_path = error.schema_path.to_string();
    let rule = schema_path
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("schema")
        .to_string();

    let mut path = pointer_to_path(&error.instance_path.to_string());
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            if let Some(name) = property.as_str() {
                path = join_path(&path, name);
            }
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            if let [only] = unexpected.as_slice() {
                path = join_path(&path, only);
            }
        }
        _ => {}
    }

    ValidationErrorInfo {
        path: if path.is_empty() {
            "(root)".to_string()
        } else {
            path
        },
        rule,
        message: format_validation_error(error),
    }
}

/// `/spec/routes/0/port` -> `spec.routes.0.port`
fn pointer_to_path(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}.{}", parent, child)
    }
}

/// Format a validation error into a user-friendly message
fn format_validation_error(error: &jsonschema::ValidationError) -> String {
    let msg = error.to_string();

    // Clean up common patterns for better readability
    msg.replace('"', "'")
}
