//! Resource schemas: identity plus the `metadata` / `spec` field tree

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::field::{Constraints, FieldKind, FieldSpec, check_siblings};
use crate::names;

/// Resource scope - whether objects live in a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum Scope {
    #[default]
    Namespaced,
    Cluster,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Namespaced => write!(f, "Namespaced"),
            Self::Cluster => write!(f, "Cluster"),
        }
    }
}

/// Which host-facing variant a type name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeVariant {
    /// Renders caller configuration
    Manifest,
    /// Reads the live object and renders it
    DataSource,
}

impl TypeVariant {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::DataSource => "data_source",
        }
    }
}

/// Field tree and fixed identity of one CRD kind/version
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    /// API group (`gateway.solo.io`, empty for the core group)
    pub group: String,
    /// API version (`v1`)
    pub version: String,
    /// Kind (`RouteOption`)
    pub kind: String,
    /// Plural resource name used by the API server (`routeoptions`)
    pub plural: String,
    pub scope: Scope,
    pub description: Option<String>,
    /// Children of `spec`; every one of them optional
    pub spec: Vec<FieldSpec>,
}

impl ResourceSchema {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        let kind = kind.into();
        let plural = format!("{}s", kind.to_lowercase());
        Self {
            group: group.into(),
            version: version.into(),
            kind,
            plural,
            scope: Scope::Namespaced,
            description: None,
            spec: Vec::new(),
        }
    }

    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = plural.into();
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_spec(mut self, fields: Vec<FieldSpec>) -> Self {
        self.spec = fields;
        self
    }

    /// `group/version`, or just the version for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn is_namespaced(&self) -> bool {
        self.scope == Scope::Namespaced
    }

    /// The standard `metadata` object
    ///
    /// `name` (and `namespace` for namespaced kinds) is required and must follow
    /// Kubernetes naming; labels and annotations are string maps with
    /// Kubernetes key syntax.
    pub fn metadata_field(&self) -> FieldSpec {
        let mut children = vec![
            FieldSpec::string("name")
                .required()
                .min_length(1)
                .max_length(names::RFC_1123_SUBDOMAIN_MAX_LENGTH)
                .pattern(names::rfc_1123_subdomain_pattern())
                .describe("Unique name of the object within its namespace."),
        ];

        if self.is_namespaced() {
            children.push(
                FieldSpec::string("namespace")
                    .required()
                    .min_length(1)
                    .max_length(names::RFC_1123_LABEL_MAX_LENGTH)
                    .pattern(names::rfc_1123_label_pattern())
                    .describe("Namespace the object lives in."),
            );
        }

        children.push(
            FieldSpec::map_with(
                "labels",
                names::qualified_key_constraints(),
                Constraints {
                    max_length: Some(names::LABEL_VALUE_MAX_LENGTH),
                    pattern: Some(names::label_value_pattern()),
                    ..Default::default()
                },
            )
            .describe("Map of string keys and values used to organize and select objects."),
        );
        children.push(
            FieldSpec::map_with(
                "annotations",
                names::qualified_key_constraints(),
                Constraints::default(),
            )
            .describe("Unstructured key value map stored with the object."),
        );

        FieldSpec::object("metadata", children)
            .required()
            .describe("Standard object metadata.")
    }

    /// The `spec` object; never required
    pub fn spec_field(&self) -> FieldSpec {
        let field = FieldSpec::object("spec", self.spec.clone());
        match &self.description {
            Some(d) => field.describe(d.clone()),
            None => field,
        }
    }

    /// Root of the field tree: `metadata` then `spec`
    pub fn root_fields(&self) -> Vec<FieldSpec> {
        vec![self.metadata_field(), self.spec_field()]
    }

    /// Host-facing type name
    ///
    /// `k8s` + `gateway.solo.io` + `RouteOption` + `v1` gives
    /// `k8s_gateway_solo_io_route_option_v1_manifest`.
    pub fn type_name(&self, prefix: &str, variant: TypeVariant) -> String {
        let mut parts = Vec::with_capacity(5);
        if !prefix.is_empty() {
            parts.push(prefix.to_string());
        }
        if !self.group.is_empty() {
            parts.push(self.group.replace(['.', '-'], "_"));
        }
        parts.push(snake_case(&self.kind));
        parts.push(self.version.replace(['.', '-'], "_"));
        parts.push(variant.suffix().to_string());
        parts.join("_")
    }

    /// Report every declaration defect, as a single [`CoreError::SchemaDefect`]
    pub fn check(&self) -> Result<()> {
        let mut defects = Vec::new();

        if self.version.is_empty() {
            defects.push("empty version".to_string());
        }
        if self.kind.is_empty() {
            defects.push("empty kind".to_string());
        }
        if self.plural.is_empty() {
            defects.push("empty plural".to_string());
        }
        flag_required_under_spec(&self.spec_field(), "spec", &mut defects);
        check_siblings("", &self.root_fields(), &mut defects);

        if defects.is_empty() {
            Ok(())
        } else {
            Err(CoreError::SchemaDefect {
                kind: format!("{} {}", self.api_version(), self.kind),
                defects,
            })
        }
    }
}

/// Everything below `spec`, list elements included, must be optional
fn flag_required_under_spec(field: &FieldSpec, path: &str, defects: &mut Vec<String>) {
    match &field.kind {
        FieldKind::Object(children) => {
            for child in children {
                let child_path = format!("{}.{}", path, child.name);
                if child.required {
                    defects.push(format!("{}: spec fields are always optional", child_path));
                }
                flag_required_under_spec(child, &child_path, defects);
            }
        }
        FieldKind::List(element) => {
            flag_required_under_spec(element, &format!("{}[]", path), defects)
        }
        FieldKind::Primitive(_) | FieldKind::Map { .. } => {}
    }
}

/// `RouteOption` -> `route_option`, `HTTPRoute` -> `http_route`
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|j| chars[j]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None => false,
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                Some(_) => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '-' || c == '.' {
            out.push('_');
        } else {
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_option() -> ResourceSchema {
        ResourceSchema::new("gateway.solo.io", "v1", "RouteOption")
            .with_spec(vec![FieldSpec::string("hostRewrite").min_length(1)])
    }

    #[test]
    fn test_api_version() {
        assert_eq!(route_option().api_version(), "gateway.solo.io/v1");
        assert_eq!(ResourceSchema::new("", "v1", "ConfigMap").api_version(), "v1");
    }

    #[test]
    fn test_default_plural() {
        assert_eq!(route_option().plural, "routeoptions");
        assert_eq!(
            route_option().with_plural("routeopts").plural,
            "routeopts"
        );
    }

    #[test]
    fn test_type_name() {
        let schema = route_option();
        assert_eq!(
            schema.type_name("k8s", TypeVariant::Manifest),
            "k8s_gateway_solo_io_route_option_v1_manifest"
        );
        assert_eq!(
            schema.type_name("k8s", TypeVariant::DataSource),
            "k8s_gateway_solo_io_route_option_v1_data_source"
        );

        let core = ResourceSchema::new("", "v1", "ConfigMap");
        assert_eq!(core.type_name("", TypeVariant::Manifest), "config_map_v1_manifest");

        let beta = ResourceSchema::new("cert-manager.io", "v1beta1", "ClusterIssuer");
        assert_eq!(
            beta.type_name("k8s", TypeVariant::Manifest),
            "k8s_cert_manager_io_cluster_issuer_v1beta1_manifest"
        );
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("RouteOption"), "route_option");
        assert_eq!(snake_case("HTTPRoute"), "http_route");
        assert_eq!(snake_case("VirtualHostOption"), "virtual_host_option");
        assert_eq!(snake_case("Kafka"), "kafka");
        assert_eq!(snake_case("S3Bucket"), "s3_bucket");
    }

    #[test]
    fn test_metadata_for_namespaced_and_cluster_scope() {
        let namespaced = route_option().metadata_field();
        assert!(namespaced.get_nested("name").is_some_and(|f| f.required));
        assert!(namespaced.get_nested("namespace").is_some_and(|f| f.required));
        assert!(namespaced.get_nested("labels").is_some_and(|f| !f.required));

        let cluster = route_option().with_scope(Scope::Cluster).metadata_field();
        assert!(cluster.get_nested("namespace").is_none());
    }

    #[test]
    fn test_check_accepts_well_formed_schema() {
        assert!(route_option().check().is_ok());
    }

    #[test]
    fn test_check_rejects_required_spec_field() {
        let schema = ResourceSchema::new("example.com", "v1", "Widget")
            .with_spec(vec![FieldSpec::string("size").required()]);

        let err = schema.check().unwrap_err();
        match err {
            CoreError::SchemaDefect { kind, defects } => {
                assert_eq!(kind, "example.com/v1 Widget");
                assert!(defects[0].contains("spec.size"));
            }
            other => panic!("expected SchemaDefect, got {other:?}"),
        }
    }

    #[test]
    fn test_check_rejects_required_field_deep_in_spec() {
        let nested = ResourceSchema::new("example.com", "v1", "Widget").with_spec(vec![
            FieldSpec::object(
                "nested",
                vec![FieldSpec::string("inner").required(), FieldSpec::string("other")],
            ),
        ]);
        let err = nested.check().unwrap_err();
        assert!(
            err.to_string()
                .contains("spec.nested.inner: spec fields are always optional"),
            "{err}"
        );

        let in_list = ResourceSchema::new("example.com", "v1", "Widget").with_spec(vec![
            FieldSpec::list(
                "targetRefs",
                FieldSpec::object("item", vec![FieldSpec::string("name").required()]),
            ),
        ]);
        let err = in_list.check().unwrap_err();
        assert!(err.to_string().contains("spec.targetRefs[].name"), "{err}");
    }

    #[test]
    fn test_check_reports_nested_defects() {
        let schema = ResourceSchema::new("example.com", "v1", "Widget").with_spec(vec![
            FieldSpec::string("size"),
            FieldSpec::string("size"),
        ]);

        let err = schema.check().unwrap_err();
        assert!(err.to_string().contains("spec: duplicate field 'size'"));
    }
}
