//! Schema-tree compiler
//!
//! Turns each [`FieldSpec`] into two parallel artifacts:
//! - a [`RecordShape`] used to decode configuration or live objects into records
//! - an [`Attribute`] the host framework uses to validate and collect input
//!
//! ```text
//!                 ┌──► RecordShape ──► Record::decode ──► render
//!   FieldSpec ────┤
//!                 └──► Attribute ───► JSON Schema ──► SchemaValidator
//! ```
//!
//! Compilation is pure: compiling the same schema twice gives equal output.

use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::field::{Bound, Constraints, FieldKind, FieldSpec, Primitive};
use crate::resource::ResourceSchema;
use crate::validation::{SchemaValidator, ValidationResult};

/// Decoding shape of one field
#[derive(Debug, Clone, PartialEq)]
pub struct RecordShape {
    pub name: String,
    pub kind: ShapeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    Scalar(Primitive),
    List(Box<RecordShape>),
    Map,
    Object(Vec<RecordShape>),
}

impl RecordShape {
    pub fn child(&self, name: &str) -> Option<&RecordShape> {
        match &self.kind {
            ShapeKind::Object(children) => children.iter().find(|c| c.name == name),
            _ => None,
        }
    }
}

/// Declarative validator attached to an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "rule", content = "value")]
pub enum Validator {
    LengthAtLeast(u64),
    LengthAtMost(u64),
    AtLeast(Bound),
    AtMost(Bound),
    /// Both bounds, inclusive
    Between(Bound, Bound),
    RegexMatches(String),
    OneOf(Vec<String>),
    SizeAtLeast(u64),
    SizeAtMost(u64),
}

impl Validator {
    /// Validators equivalent to a constraint set, in a stable order
    pub fn from_constraints(c: &Constraints) -> Vec<Validator> {
        let mut out = Vec::new();
        if let Some(n) = c.min_length {
            out.push(Self::LengthAtLeast(n));
        }
        if let Some(n) = c.max_length {
            out.push(Self::LengthAtMost(n));
        }
        match (c.minimum, c.maximum) {
            (Some(min), Some(max)) => out.push(Self::Between(min, max)),
            (Some(min), None) => out.push(Self::AtLeast(min)),
            (None, Some(max)) => out.push(Self::AtMost(max)),
            (None, None) => {}
        }
        if let Some(p) = &c.pattern {
            out.push(Self::RegexMatches(p.clone()));
        }
        if let Some(v) = &c.one_of {
            out.push(Self::OneOf(v.clone()));
        }
        if let Some(n) = c.min_items {
            out.push(Self::SizeAtLeast(n));
        }
        if let Some(n) = c.max_items {
            out.push(Self::SizeAtMost(n));
        }
        out
    }
}

/// Type of a presentation attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AttributeType {
    String,
    Int64,
    Float64,
    Bool,
    IntOrString,
    Dynamic,
    List {
        element: Box<Attribute>,
    },
    Map {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        keys: Vec<Validator>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        values: Vec<Validator>,
    },
    Object {
        attributes: Vec<Attribute>,
    },
}

/// Presentation attribute consumed by the host configuration framework
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    #[serde(rename = "type")]
    pub ty: AttributeType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl Attribute {
    /// Output-only string attribute (`yaml`, `id`)
    pub fn computed_string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            required: false,
            optional: false,
            computed: true,
            ty: AttributeType::String,
            validators: Vec::new(),
        }
    }

    /// Nested attributes of an object
    pub fn attributes(&self) -> Option<&[Attribute]> {
        match &self.ty {
            AttributeType::Object { attributes } => Some(attributes),
            _ => None,
        }
    }

    /// Find a descendant attribute by dotted path
    pub fn get_nested(&self, path: &str) -> Option<&Attribute> {
        let mut current = self;
        for part in path.split('.') {
            current = current.attributes()?.iter().find(|a| a.name == part)?;
        }
        Some(current)
    }
}

/// Compile one field into its record shape and presentation attribute
pub fn compile_attribute(field: &FieldSpec) -> (RecordShape, Attribute) {
    let (shape_kind, ty) = match &field.kind {
        FieldKind::Primitive(p) => {
            let ty = match p {
                Primitive::String => AttributeType::String,
                Primitive::Integer => AttributeType::Int64,
                Primitive::Number => AttributeType::Float64,
                Primitive::Boolean => AttributeType::Bool,
                Primitive::IntOrString => AttributeType::IntOrString,
                Primitive::Json => AttributeType::Dynamic,
            };
            (ShapeKind::Scalar(*p), ty)
        }
        FieldKind::Object(children) => {
            let (shapes, attributes): (Vec<_>, Vec<_>) =
                children.iter().map(compile_attribute).unzip();
            (ShapeKind::Object(shapes), AttributeType::Object { attributes })
        }
        FieldKind::List(element) => {
            let (shape, attr) = compile_attribute(element);
            (
                ShapeKind::List(Box::new(shape)),
                AttributeType::List {
                    element: Box::new(attr),
                },
            )
        }
        FieldKind::Map { keys, values } => (
            ShapeKind::Map,
            AttributeType::Map {
                keys: Validator::from_constraints(keys),
                values: Validator::from_constraints(values),
            },
        ),
    };

    let shape = RecordShape {
        name: field.name.clone(),
        kind: shape_kind,
    };
    let attribute = Attribute {
        name: field.name.clone(),
        description: field.description.clone(),
        required: field.required,
        optional: !field.required,
        computed: false,
        ty,
        validators: Validator::from_constraints(&field.constraints),
    };

    (shape, attribute)
}

/// A resource schema compiled once and shared read-only across requests
pub struct CompiledSchema {
    resource: ResourceSchema,
    /// Root shape: `metadata` and `spec`
    shape: RecordShape,
    /// Root attributes: `id`, `yaml`, `metadata`, `spec`
    attributes: Vec<Attribute>,
    validator: SchemaValidator,
}

impl CompiledSchema {
    /// Check the declaration, then build shape, attributes and validator
    pub fn compile(resource: ResourceSchema) -> Result<Self> {
        resource.check()?;

        let (shapes, user_attributes): (Vec<_>, Vec<_>) =
            resource.root_fields().iter().map(compile_attribute).unzip();

        let id_help = if resource.is_namespaced() {
            "Identifier of the object, 'namespace/name'."
        } else {
            "Identifier of the object, its name."
        };
        let mut attributes = vec![
            Attribute::computed_string("id", id_help),
            Attribute::computed_string("yaml", "The generated manifest in YAML format."),
        ];
        attributes.extend(user_attributes);

        let validator = SchemaValidator::new(&attributes)?;

        tracing::debug!(
            api_version = %resource.api_version(),
            kind = %resource.kind,
            fields = resource.spec.len(),
            "compiled resource schema"
        );

        Ok(Self {
            resource,
            shape: RecordShape {
                name: String::new(),
                kind: ShapeKind::Object(shapes),
            },
            attributes,
            validator,
        })
    }

    pub fn compile_shared(resource: ResourceSchema) -> Result<Arc<Self>> {
        Self::compile(resource).map(Arc::new)
    }

    pub fn resource(&self) -> &ResourceSchema {
        &self.resource
    }

    pub fn shape(&self) -> &RecordShape {
        &self.shape
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Find an attribute by dotted path from the root (`spec.retries.numRetries`)
    pub fn attribute(&self, path: &str) -> Option<&Attribute> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let root = self.attributes.iter().find(|a| a.name == head)?;
        match rest {
            Some(rest) => root.get_nested(rest),
            None => Some(root),
        }
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Validate caller configuration against the declared constraints
    pub fn validate(&self, config: &serde_json::Value) -> ValidationResult {
        self.validator.validate(config)
    }
}

impl PartialEq for CompiledSchema {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource
            && self.shape == other.shape
            && self.attributes == other.attributes
            && self.validator.json_schema() == other.validator.json_schema()
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("api_version", &self.resource.api_version())
            .field("kind", &self.resource.kind)
            .field("attributes", &self.attributes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_carries_validators() {
        let (shape, attr) = compile_attribute(&FieldSpec::string("hostRewrite").min_length(1));

        assert_eq!(shape.kind, ShapeKind::Scalar(Primitive::String));
        assert_eq!(attr.ty, AttributeType::String);
        assert!(attr.optional);
        assert!(!attr.required);
        assert_eq!(attr.validators, vec![Validator::LengthAtLeast(1)]);
    }

    #[test]
    fn test_integer_bounds() {
        let (_, attr) =
            compile_attribute(&FieldSpec::integer("numRetries").between(0, 4_294_967_295));

        assert_eq!(attr.ty, AttributeType::Int64);
        assert_eq!(
            attr.validators,
            vec![Validator::Between(Bound::Int(0), Bound::Int(4_294_967_295))]
        );
    }

    #[test]
    fn test_nested_object_is_optional_unless_declared() {
        let field = FieldSpec::object(
            "retries",
            vec![FieldSpec::string("retryOn"), FieldSpec::integer("numRetries")],
        );
        let (shape, attr) = compile_attribute(&field);

        assert!(!attr.required);
        let names: Vec<_> = attr
            .attributes()
            .unwrap()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, ["retryOn", "numRetries"]);
        assert!(shape.child("numRetries").is_some());
    }

    #[test]
    fn test_list_wraps_element() {
        let field = FieldSpec::list(
            "targetRefs",
            FieldSpec::object("item", vec![FieldSpec::string("name").min_length(1)]),
        )
        .max_items(16);
        let (shape, attr) = compile_attribute(&field);

        match (&shape.kind, &attr.ty) {
            (ShapeKind::List(el_shape), AttributeType::List { element }) => {
                assert!(matches!(el_shape.kind, ShapeKind::Object(_)));
                assert!(element.get_nested("name").is_some());
            }
            other => panic!("unexpected compile output: {other:?}"),
        }
        assert_eq!(attr.validators, vec![Validator::SizeAtMost(16)]);
    }

    #[test]
    fn test_map_compiles_key_rules() {
        let field = FieldSpec::map_with(
            "labels",
            Constraints {
                max_length: Some(63),
                ..Default::default()
            },
            Constraints::default(),
        );
        let (shape, attr) = compile_attribute(&field);

        assert_eq!(shape.kind, ShapeKind::Map);
        assert_eq!(
            attr.ty,
            AttributeType::Map {
                keys: vec![Validator::LengthAtMost(63)],
                values: vec![],
            }
        );
    }

    #[test]
    fn test_compiled_root_attributes() {
        let schema = CompiledSchema::compile(
            ResourceSchema::new("gateway.solo.io", "v1", "RouteOption")
                .with_spec(vec![FieldSpec::string("hostRewrite")]),
        )
        .unwrap();

        let names: Vec<_> = schema.attributes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["id", "yaml", "metadata", "spec"]);
        assert!(schema.attribute("yaml").unwrap().computed);
        assert!(schema.attribute("metadata").unwrap().required);
        assert!(schema.attribute("metadata.name").unwrap().required);
        assert!(!schema.attribute("spec").unwrap().required);
        assert!(schema.attribute("spec.hostRewrite").unwrap().optional);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let resource = ResourceSchema::new("example.com", "v1alpha1", "Widget").with_spec(vec![
            FieldSpec::string("size").one_of(["small", "large"]),
            FieldSpec::list("parts", FieldSpec::string("item")),
        ]);

        let a = CompiledSchema::compile(resource.clone()).unwrap();
        let b = CompiledSchema::compile(resource).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_compile_rejects_defects() {
        let resource = ResourceSchema::new("example.com", "v1", "Widget")
            .with_spec(vec![FieldSpec::boolean("on").min_length(1)]);

        let err = CompiledSchema::compile(resource).unwrap_err();
        assert!(matches!(err, crate::CoreError::SchemaDefect { .. }));
    }

    #[test]
    fn test_attribute_tree_serializes() {
        let (_, attr) = compile_attribute(&FieldSpec::integer("port").between(1, 65535));
        let json = serde_json::to_value(&attr).unwrap();

        assert_eq!(json["name"], "port");
        assert_eq!(json["type"]["kind"], "int64");
        assert_eq!(json["validators"][0]["rule"], "between");
        assert_eq!(json["validators"][0]["value"], serde_json::json!([1, 65535]));
    }
}
