//! CustomResourceDefinition import
//!
//! Reads CRD manifests and produces one [`ResourceSchema`] per served
//! version, translating the structural `openAPIV3Schema` of `spec` into
//! field declarations:
//!
//! | OpenAPI                                   | FieldSpec                   |
//! |-------------------------------------------|-----------------------------|
//! | `string` (+ length, pattern, enum)        | string                      |
//! | `integer` (+ minimum/maximum, int32)      | integer                     |
//! | `number`                                  | number                      |
//! | `boolean`                                 | boolean                     |
//! | `x-kubernetes-int-or-string`              | int-or-string               |
//! | `array` with `items`                      | list                        |
//! | `object` with `properties`                | nested object               |
//! | `object` with string `additionalProperties` | map                       |
//! | anything else                             | free-form json              |
//!
//! Every spec field is imported as optional, regardless of `required`.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::field::{Bound, Constraints, FieldSpec};
use crate::resource::{ResourceSchema, Scope};

/// Parser for CRD YAML manifests
pub struct CrdParser;

impl CrdParser {
    /// Parse every CRD in a (possibly multi-document) YAML stream
    ///
    /// Documents that are not CustomResourceDefinitions are skipped.
    pub fn parse(yaml: &str) -> Result<Vec<ResourceSchema>> {
        let mut schemas = Vec::new();

        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value = Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            let kind = value.get("kind").and_then(Value::as_str);
            if kind != Some("CustomResourceDefinition") {
                let kind = kind.unwrap_or("<none>");
                tracing::debug!(kind, "skipping non-CRD document");
                continue;
            }
            schemas.extend(Self::parse_value(&value)?);
        }

        Ok(schemas)
    }

    pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<ResourceSchema>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            CoreError::InvalidCrd { message } => CoreError::InvalidCrd {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// Parse from a serde_json::Value (useful for dynamic objects)
    pub fn parse_value(value: &Value) -> Result<Vec<ResourceSchema>> {
        // Validate it's a CRD
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("Missing 'kind' field"))?;

        if kind != "CustomResourceDefinition" {
            return Err(invalid(format!(
                "Expected CustomResourceDefinition, got {}",
                kind
            )));
        }

        let spec = value
            .get("spec")
            .ok_or_else(|| invalid("Missing 'spec' field"))?;

        let group = spec
            .get("group")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("Missing 'spec.group' field"))?
            .to_string();

        let scope = match spec.get("scope").and_then(Value::as_str) {
            Some("Cluster") => Scope::Cluster,
            _ => Scope::Namespaced,
        };

        let names = spec
            .get("names")
            .ok_or_else(|| invalid("Missing 'spec.names' field"))?;
        let crd_kind = names
            .get("kind")
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| invalid("Missing 'spec.names.kind' field"))?;
        let plural = names
            .get("plural")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| invalid("Missing 'spec.names.plural' field"))?;

        let versions = spec
            .get("versions")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("Missing 'spec.versions' array"))?;

        let mut schemas = Vec::new();
        for version in versions {
            let name = version
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid("Version missing 'name' field"))?;

            let served = version
                .get("served")
                .and_then(Value::as_bool)
                .unwrap_or(true);
            if !served {
                tracing::debug!(kind = crd_kind, version = name, "skipping unserved version");
                continue;
            }

            let root = version.get("schema").and_then(|s| s.get("openAPIV3Schema"));
            let spec_schema = root
                .and_then(|r| r.get("properties"))
                .and_then(|p| p.get("spec"));

            let spec_fields = spec_schema
                .map(|s| parse_properties(s, &format!("{}.{}.spec", crd_kind, name)))
                .unwrap_or_default();

            let mut schema = ResourceSchema::new(group.clone(), name, crd_kind)
                .with_plural(plural)
                .with_scope(scope)
                .with_spec(spec_fields);
            if let Some(desc) = root
                .and_then(|r| r.get("description"))
                .and_then(Value::as_str)
            {
                schema = schema.with_description(desc);
            }
            schemas.push(schema);
        }

        Ok(schemas)
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidCrd {
        message: message.into(),
    }
}

/// Children of an object schema, in key order
fn parse_properties(schema: &Value, path: &str) -> Vec<FieldSpec> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| parse_field(k, v, &format!("{}.{}", path, k)))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a single schema property (recursive)
fn parse_field(name: &str, prop: &Value, path: &str) -> FieldSpec {
    let flag = |key: &str| prop.get(key).and_then(Value::as_bool).unwrap_or(false);

    let field = if flag("x-kubernetes-int-or-string") {
        FieldSpec::int_or_string(name)
    } else {
        match prop.get("type").and_then(Value::as_str) {
            Some("string") => {
                FieldSpec::string(name).with_constraints(string_constraints(prop, path))
            }
            Some("integer") => {
                FieldSpec::integer(name).with_constraints(integer_constraints(prop))
            }
            Some("number") => FieldSpec::number(name).with_constraints(Constraints {
                minimum: prop.get("minimum").and_then(Value::as_f64).map(Bound::Float),
                maximum: prop.get("maximum").and_then(Value::as_f64).map(Bound::Float),
                ..Default::default()
            }),
            Some("boolean") => FieldSpec::boolean(name),
            Some("array") => match prop.get("items") {
                Some(items) => {
                    let element = parse_field("item", items, &format!("{}[]", path));
                    FieldSpec::list(name, element).with_constraints(Constraints {
                        min_items: prop.get("minItems").and_then(Value::as_u64),
                        max_items: prop.get("maxItems").and_then(Value::as_u64),
                        ..Default::default()
                    })
                }
                None => {
                    tracing::warn!(path, "array without items, importing as free-form json");
                    FieldSpec::json(name)
                }
            },
            Some("object") | None => parse_object(name, prop, path),
            Some(other) => {
                tracing::warn!(path, ty = other, "unsupported type, importing as free-form json");
                FieldSpec::json(name)
            }
        }
    };

    match prop.get("description").and_then(Value::as_str) {
        Some(d) => field.describe(d),
        None => field,
    }
}

fn parse_object(name: &str, prop: &Value, path: &str) -> FieldSpec {
    let has_properties = prop
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| !p.is_empty());

    if has_properties {
        if prop
            .get("x-kubernetes-preserve-unknown-fields")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            tracing::warn!(path, "unknown fields beside declared properties are dropped");
        }
        return FieldSpec::object(name, parse_properties(prop, path));
    }

    if let Some(additional) = prop.get("additionalProperties")
        && additional.get("type").and_then(Value::as_str) == Some("string")
        && !additional
            .get("x-kubernetes-int-or-string")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    {
        return FieldSpec::map_with(
            name,
            Constraints::default(),
            string_constraints(additional, path),
        );
    }

    FieldSpec::json(name)
}

fn string_constraints(prop: &Value, path: &str) -> Constraints {
    let pattern = prop.get("pattern").and_then(Value::as_str).and_then(|p| {
        match regex::Regex::new(p) {
            Ok(_) => Some(p.to_string()),
            Err(e) => {
                tracing::warn!(path, pattern = p, error = %e, "dropping unsupported pattern");
                None
            }
        }
    });

    Constraints {
        min_length: prop.get("minLength").and_then(Value::as_u64),
        max_length: prop.get("maxLength").and_then(Value::as_u64),
        pattern,
        one_of: prop.get("enum").and_then(Value::as_array).map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        }),
        ..Default::default()
    }
    .without_empty_enum()
}

fn integer_constraints(prop: &Value) -> Constraints {
    let (format_min, format_max) = match prop.get("format").and_then(Value::as_str) {
        Some("int32") => (Some(i64::from(i32::MIN)), Some(i64::from(i32::MAX))),
        _ => (None, None),
    };

    Constraints {
        minimum: prop
            .get("minimum")
            .and_then(Value::as_i64)
            .or(format_min)
            .map(Bound::Int),
        maximum: prop
            .get("maximum")
            .and_then(Value::as_i64)
            .or(format_max)
            .map(Bound::Int),
        ..Default::default()
    }
}

impl FieldSpec {
    fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

impl Constraints {
    // enums of non-string values cannot be expressed on a string field
    fn without_empty_enum(mut self) -> Self {
        if self.one_of.as_ref().is_some_and(Vec::is_empty) {
            self.one_of = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldKind, Primitive};

    const SAMPLE_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  scope: Namespaced
  names:
    kind: Widget
    plural: widgets
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          description: A widget.
          type: object
          properties:
            spec:
              type: object
              required: [size]
              properties:
                size:
                  type: string
                  enum: [small, large]
                replicas:
                  type: integer
                  format: int32
                  minimum: 0
                port:
                  x-kubernetes-int-or-string: true
                hosts:
                  type: array
                  maxItems: 4
                  items:
                    type: string
                    minLength: 1
                selector:
                  type: object
                  additionalProperties:
                    type: string
                template:
                  type: object
                  x-kubernetes-preserve-unknown-fields: true
                tls:
                  type: object
                  properties:
                    secretName:
                      type: string
            status:
              type: object
    - name: v1alpha1
      served: false
      storage: false
"#;

    #[test]
    fn test_parse_crd() {
        let schemas = CrdParser::parse(SAMPLE_CRD).unwrap();
        assert_eq!(schemas.len(), 1);

        let schema = &schemas[0];
        assert_eq!(schema.api_version(), "example.com/v1");
        assert_eq!(schema.kind, "Widget");
        assert_eq!(schema.plural, "widgets");
        assert_eq!(schema.scope, Scope::Namespaced);
        assert_eq!(schema.description.as_deref(), Some("A widget."));
        assert!(schema.check().is_ok());
    }

    #[test]
    fn test_field_translation() {
        let schemas = CrdParser::parse(SAMPLE_CRD).unwrap();
        let spec = schemas[0].spec_field();

        let size = spec.get_nested("size").unwrap();
        assert!(!size.required, "spec fields are always optional");
        assert_eq!(
            size.constraints.one_of,
            Some(vec!["small".to_string(), "large".to_string()])
        );

        let replicas = spec.get_nested("replicas").unwrap();
        assert_eq!(replicas.constraints.minimum, Some(Bound::Int(0)));
        assert_eq!(replicas.constraints.maximum, Some(Bound::Int(2_147_483_647)));

        assert_eq!(
            spec.get_nested("port").unwrap().kind,
            FieldKind::Primitive(Primitive::IntOrString)
        );

        let hosts = spec.get_nested("hosts").unwrap();
        assert_eq!(hosts.constraints.max_items, Some(4));
        match &hosts.kind {
            FieldKind::List(element) => assert_eq!(element.constraints.min_length, Some(1)),
            other => panic!("expected list, got {other:?}"),
        }

        assert!(matches!(
            spec.get_nested("selector").unwrap().kind,
            FieldKind::Map { .. }
        ));
        assert_eq!(
            spec.get_nested("template").unwrap().kind,
            FieldKind::Primitive(Primitive::Json)
        );
        assert!(spec.get_nested("tls.secretName").is_some());
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let schemas = CrdParser::parse(SAMPLE_CRD).unwrap();
        let spec = schemas[0].spec_field();
        let FieldKind::Object(children) = &spec.kind else {
            panic!("expected object, got {:?}", spec.kind);
        };

        let names: Vec<_> = children.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["size", "replicas", "port", "hosts", "selector", "template", "tls"]
        );
    }

    #[test]
    fn test_multi_document_stream() {
        let yaml = format!(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\n---\n{}",
            SAMPLE_CRD
        );
        let schemas = CrdParser::parse(&yaml).unwrap();
        assert_eq!(schemas.len(), 1);
    }

    #[test]
    fn test_cluster_scope() {
        let yaml = SAMPLE_CRD.replace("scope: Namespaced", "scope: Cluster");
        let schemas = CrdParser::parse(&yaml).unwrap();
        assert_eq!(schemas[0].scope, Scope::Cluster);
    }

    #[test]
    fn test_missing_group() {
        let yaml = SAMPLE_CRD.replace("  group: example.com\n", "");
        let err = CrdParser::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("spec.group"));
    }

    #[test]
    fn test_parse_value_rejects_other_kinds() {
        let value = serde_json::json!({"kind": "Deployment"});
        let err = CrdParser::parse_value(&value).unwrap_err();
        assert!(err.to_string().contains("Expected CustomResourceDefinition"));
    }
}
