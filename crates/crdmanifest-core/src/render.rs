//! Manifest rendering
//!
//! The rendered document always starts with the schema's own `apiVersion` and
//! `kind`, followed by `metadata` and, when anything in it is set, `spec`.
//! Whatever identity the caller supplied is ignored.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::compiler::CompiledSchema;
use crate::error::{CoreError, Result};
use crate::record::{FieldValue, Record};

/// Identity plus record, ready to serialize
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<Record>,
}

impl RenderedManifest {
    /// Pair a decoded root record with the schema's identity
    pub fn new(schema: &CompiledSchema, record: &Record) -> Result<Self> {
        let resource = schema.resource();

        let metadata = match record.get("metadata") {
            Some(FieldValue::Object(m)) => m.clone(),
            _ => {
                return Err(CoreError::ShapeMismatch {
                    path: "metadata".to_string(),
                    message: "record has no metadata".to_string(),
                });
            }
        };
        let spec = match record.get("spec") {
            Some(FieldValue::Object(s)) => Some(s.clone()),
            None => None,
            Some(_) => {
                return Err(CoreError::ShapeMismatch {
                    path: "spec".to_string(),
                    message: "spec is not an object".to_string(),
                });
            }
        };

        Ok(Self {
            api_version: resource.api_version(),
            kind: resource.kind.clone(),
            metadata,
            spec,
        })
    }

    /// `namespace/name` for namespaced objects, `name` otherwise
    pub fn id(&self) -> String {
        let name = self
            .metadata
            .get("name")
            .and_then(FieldValue::as_str)
            .unwrap_or_default();
        match self.metadata.get("namespace").and_then(FieldValue::as_str) {
            Some(ns) => format!("{}/{}", ns, name),
            None => name.to_string(),
        }
    }

    /// Serialize to a YAML document
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|source| CoreError::Marshal { source })
    }
}

/// Render a record that has already passed validation
pub fn render(schema: &CompiledSchema, record: &Record) -> Result<String> {
    render_record(schema, record).map(|output| output.yaml)
}

/// Validate caller configuration, decode it and render it
pub fn render_config(schema: &CompiledSchema, config: &JsonValue) -> Result<RenderedOutput> {
    schema.validate(config).into_result()?;
    let record = Record::decode(schema.shape(), config)?;
    render_record(schema, &record)
}

/// Render a decoded record into the computed outputs
pub fn render_record(schema: &CompiledSchema, record: &Record) -> Result<RenderedOutput> {
    let manifest = RenderedManifest::new(schema, record)?;
    let yaml = manifest.to_yaml()?;
    let id = manifest.id();

    tracing::debug!(
        kind = %manifest.kind,
        id = %id,
        bytes = yaml.len(),
        "rendered manifest"
    );

    Ok(RenderedOutput { id, yaml })
}

/// Computed attributes produced by a render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedOutput {
    pub id: String,
    pub yaml: String,
}

impl RenderedOutput {
    /// Merge the outputs into a state object: the input plus `id` and `yaml`
    pub fn into_state(self, config: &JsonValue) -> JsonValue {
        let mut state = match config {
            JsonValue::Object(obj) => obj.clone(),
            _ => serde_json::Map::new(),
        };
        state.insert("id".to_string(), JsonValue::String(self.id));
        state.insert("yaml".to_string(), JsonValue::String(self.yaml));
        JsonValue::Object(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;
    use crate::resource::{ResourceSchema, Scope};
    use serde_json::json;

    fn schema() -> CompiledSchema {
        CompiledSchema::compile(
            ResourceSchema::new("gateway.solo.io", "v1", "RouteOption").with_spec(vec![
                FieldSpec::string("hostRewrite").min_length(1),
                FieldSpec::string("prefixRewrite"),
                FieldSpec::object(
                    "retries",
                    vec![
                        FieldSpec::string("retryOn"),
                        FieldSpec::integer("numRetries").between(0, 4_294_967_295),
                    ],
                ),
            ]),
        )
        .unwrap()
    }

    #[test]
    fn test_render_scenario() {
        let schema = schema();
        let output = render_config(
            &schema,
            &json!({
                "metadata": {"name": "some", "namespace": "somewhere"},
                "spec": {"hostRewrite": "example.com"}
            }),
        )
        .unwrap();

        insta::assert_snapshot!(output.yaml, @r"
        apiVersion: gateway.solo.io/v1
        kind: RouteOption
        metadata:
          name: some
          namespace: somewhere
        spec:
          hostRewrite: example.com
        ");
        assert_eq!(output.id, "somewhere/some");
    }

    #[test]
    fn test_identity_cannot_be_overridden() {
        let schema = schema();
        let output = render_config(
            &schema,
            &json!({
                "apiVersion": "evil.example.com/v9",
                "kind": "Pwned",
                "metadata": {"name": "some", "namespace": "somewhere"}
            }),
        )
        .unwrap();

        let parsed: JsonValue = serde_yaml::from_str(&output.yaml).unwrap();
        assert_eq!(parsed["apiVersion"], "gateway.solo.io/v1");
        assert_eq!(parsed["kind"], "RouteOption");
    }

    #[test]
    fn test_spec_omitted_when_nothing_set() {
        let schema = schema();
        let output = render_config(
            &schema,
            &json!({
                "metadata": {"name": "some", "namespace": "somewhere", "labels": {}},
                "spec": {"retries": {"retryOn": null}}
            }),
        )
        .unwrap();

        let parsed: JsonValue = serde_yaml::from_str(&output.yaml).unwrap();
        let obj = parsed.as_object().unwrap();
        assert!(!obj.contains_key("spec"));
        assert!(!parsed["metadata"].as_object().unwrap().contains_key("labels"));
        assert!(!output.yaml.contains("null"));
    }

    #[test]
    fn test_key_order_follows_declaration() {
        let schema = schema();
        let output = render_config(
            &schema,
            &json!({
                "spec": {"retries": {"numRetries": 3, "retryOn": "connect-failure"}, "prefixRewrite": "/v2"},
                "metadata": {
                    "annotations": {"b": "second", "a": "first"},
                    "namespace": "somewhere",
                    "name": "some"
                }
            }),
        )
        .unwrap();

        insta::assert_snapshot!(output.yaml, @r"
        apiVersion: gateway.solo.io/v1
        kind: RouteOption
        metadata:
          name: some
          namespace: somewhere
          annotations:
            a: first
            b: second
        spec:
          prefixRewrite: /v2
          retries:
            retryOn: connect-failure
            numRetries: 3
        ");
    }

    #[test]
    fn test_validation_precedes_render() {
        let schema = schema();
        let err = render_config(
            &schema,
            &json!({
                "metadata": {"name": "some", "namespace": "somewhere"},
                "spec": {"hostRewrite": ""}
            }),
        )
        .unwrap_err();

        let errors = err.validation_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "spec.hostRewrite");
        assert_eq!(errors[0].rule, "minLength");
    }

    #[test]
    fn test_missing_metadata_is_a_shape_error() {
        let schema = schema();
        let err = render(&schema, &Record::new()).unwrap_err();
        assert!(matches!(err, CoreError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_cluster_scoped_id() {
        let schema = CompiledSchema::compile(
            ResourceSchema::new("cert-manager.io", "v1", "ClusterIssuer").with_scope(Scope::Cluster),
        )
        .unwrap();

        let output = render_config(&schema, &json!({"metadata": {"name": "letsencrypt"}})).unwrap();
        assert_eq!(output.id, "letsencrypt");
    }

    #[test]
    fn test_into_state() {
        let output = RenderedOutput {
            id: "ns/a".into(),
            yaml: "kind: X\n".into(),
        };
        let state = output.into_state(&json!({"metadata": {"name": "a"}, "yaml": "stale"}));

        assert_eq!(state["id"], "ns/a");
        assert_eq!(state["yaml"], "kind: X\n");
        assert_eq!(state["metadata"]["name"], "a");
    }
}
