//! Field declarations
//!
//! A [`FieldSpec`] is the single declaration from which both the record shape
//! and the presentation attribute of a field are generated. The kind enum
//! carries exactly the payload its kind needs, so a nested object always has
//! children and a list always has an element; what the type system cannot rule
//! out (empty or duplicate names, constraints that do not fit the kind,
//! inverted bounds) is reported by [`FieldSpec::check`].

use serde::Serialize;
use std::collections::HashSet;

/// Scalar kinds a leaf field can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
    /// `x-kubernetes-int-or-string`
    IntOrString,
    /// Free-form value (`x-kubernetes-preserve-unknown-fields`, non-string maps)
    Json,
}

impl std::fmt::Display for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::IntOrString => write!(f, "int-or-string"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Shape of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Primitive(Primitive),
    /// Nested object with ordered children
    Object(Vec<FieldSpec>),
    /// Repeated element; the element's name is not significant
    List(Box<FieldSpec>),
    /// String-to-string map, with rules for keys and values
    Map {
        keys: Constraints,
        values: Constraints,
    },
}

impl FieldKind {
    fn label(&self) -> String {
        match self {
            Self::Primitive(p) => p.to_string(),
            Self::Object(_) => "object".to_string(),
            Self::List(_) => "list".to_string(),
            Self::Map { .. } => "map".to_string(),
        }
    }
}

/// Numeric bound for integer and number fields
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Bound {
    Int(i64),
    Float(f64),
}

impl Bound {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match *self {
            Self::Int(i) => serde_json::Value::from(i),
            Self::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Declarative validation bounds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    /// Minimum string length
    pub min_length: Option<u64>,
    /// Maximum string length
    pub max_length: Option<u64>,
    /// Minimum value for integers and numbers
    pub minimum: Option<Bound>,
    /// Maximum value for integers and numbers
    pub maximum: Option<Bound>,
    /// Regex the string must contain a match for (unanchored)
    pub pattern: Option<String>,
    /// Allowed string values
    pub one_of: Option<Vec<String>>,
    /// Minimum list size
    pub min_items: Option<u64>,
    /// Maximum list size
    pub max_items: Option<u64>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn has_string_rules(&self) -> bool {
        self.min_length.is_some()
            || self.max_length.is_some()
            || self.pattern.is_some()
            || self.one_of.is_some()
    }

    fn has_numeric_rules(&self) -> bool {
        self.minimum.is_some() || self.maximum.is_some()
    }

    fn has_list_rules(&self) -> bool {
        self.min_items.is_some() || self.max_items.is_some()
    }

    fn check(&self, path: &str, kind: &FieldKind, defects: &mut Vec<String>) {
        let primitive = match kind {
            FieldKind::Primitive(p) => Some(*p),
            _ => None,
        };

        if self.has_string_rules() && primitive != Some(Primitive::String) {
            defects.push(format!(
                "{}: string constraints declared on a {} field",
                path,
                kind.label()
            ));
        }
        if self.has_numeric_rules()
            && !matches!(primitive, Some(Primitive::Integer | Primitive::Number))
        {
            defects.push(format!(
                "{}: numeric bounds declared on a {} field",
                path,
                kind.label()
            ));
        }
        if primitive == Some(Primitive::Integer)
            && [self.minimum, self.maximum]
                .iter()
                .flatten()
                .any(|b| matches!(b, Bound::Float(_)))
        {
            defects.push(format!("{}: integer field with a fractional bound", path));
        }
        if self.has_list_rules() && !matches!(kind, FieldKind::List(_)) {
            defects.push(format!(
                "{}: item count bounds declared on a {} field",
                path,
                kind.label()
            ));
        }

        if let (Some(min), Some(max)) = (self.min_length, self.max_length)
            && min > max
        {
            defects.push(format!("{}: minLength {} exceeds maxLength {}", path, min, max));
        }
        if let (Some(min), Some(max)) = (self.minimum, self.maximum)
            && min.as_f64() > max.as_f64()
        {
            defects.push(format!("{}: minimum {} exceeds maximum {}", path, min, max));
        }
        if let (Some(min), Some(max)) = (self.min_items, self.max_items)
            && min > max
        {
            defects.push(format!("{}: minItems {} exceeds maxItems {}", path, min, max));
        }
        if let Some(pattern) = &self.pattern
            && let Err(e) = regex::Regex::new(pattern)
        {
            defects.push(format!("{}: pattern does not compile: {}", path, e));
        }
        if let Some(values) = &self.one_of
            && values.is_empty()
        {
            defects.push(format!("{}: empty set of allowed values", path));
        }
    }
}

/// One declared field of a resource record
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Wire key
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub constraints: Constraints,
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            constraints: Constraints::default(),
            description: None,
        }
    }

    pub fn primitive(name: impl Into<String>, primitive: Primitive) -> Self {
        Self::new(name, FieldKind::Primitive(primitive))
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::primitive(name, Primitive::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::primitive(name, Primitive::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::primitive(name, Primitive::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::primitive(name, Primitive::Boolean)
    }

    pub fn int_or_string(name: impl Into<String>) -> Self {
        Self::primitive(name, Primitive::IntOrString)
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self::primitive(name, Primitive::Json)
    }

    pub fn object(name: impl Into<String>, children: Vec<FieldSpec>) -> Self {
        Self::new(name, FieldKind::Object(children))
    }

    /// List of `element`; by convention elements are named `item`
    pub fn list(name: impl Into<String>, element: FieldSpec) -> Self {
        Self::new(name, FieldKind::List(Box::new(element)))
    }

    pub fn map(name: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Map {
                keys: Constraints::default(),
                values: Constraints::default(),
            },
        )
    }

    /// Map whose keys and values follow the given rules
    pub fn map_with(name: impl Into<String>, keys: Constraints, values: Constraints) -> Self {
        Self::new(name, FieldKind::Map { keys, values })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn min_length(mut self, n: u64) -> Self {
        self.constraints.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: u64) -> Self {
        self.constraints.max_length = Some(n);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn at_least(mut self, min: Bound) -> Self {
        self.constraints.minimum = Some(min);
        self
    }

    pub fn at_most(mut self, max: Bound) -> Self {
        self.constraints.maximum = Some(max);
        self
    }

    /// Inclusive integer range
    pub fn between(self, min: i64, max: i64) -> Self {
        self.at_least(Bound::Int(min)).at_most(Bound::Int(max))
    }

    pub fn min_items(mut self, n: u64) -> Self {
        self.constraints.min_items = Some(n);
        self
    }

    pub fn max_items(mut self, n: u64) -> Self {
        self.constraints.max_items = Some(n);
        self
    }

    /// Children of an object field
    pub fn children(&self) -> Option<&[FieldSpec]> {
        match &self.kind {
            FieldKind::Object(children) => Some(children),
            _ => None,
        }
    }

    /// Find a descendant by dotted path (`retries.numRetries`)
    pub fn get_nested(&self, path: &str) -> Option<&FieldSpec> {
        let mut current = self;
        for part in path.split('.') {
            current = current.children()?.iter().find(|c| c.name == part)?;
        }
        Some(current)
    }

    /// Collect every declaration defect in this field and its descendants
    pub fn check(&self) -> Vec<String> {
        let mut defects = Vec::new();
        self.check_at(&self.name, &mut defects);
        defects
    }

    pub(crate) fn check_at(&self, path: &str, defects: &mut Vec<String>) {
        self.constraints.check(path, &self.kind, defects);

        match &self.kind {
            FieldKind::Primitive(_) => {}
            FieldKind::Object(children) => check_siblings(path, children, defects),
            FieldKind::List(element) => {
                if element.required {
                    defects.push(format!("{}: list element marked required", path));
                }
                element.check_at(&format!("{}[]", path), defects);
            }
            FieldKind::Map { keys, values } => {
                let string = FieldKind::Primitive(Primitive::String);
                keys.check(&format!("{}{{key}}", path), &string, defects);
                values.check(&format!("{}{{value}}", path), &string, defects);
            }
        }
    }
}

/// Check a sibling set: non-empty unique names, then each child
pub(crate) fn check_siblings(parent: &str, children: &[FieldSpec], defects: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for child in children {
        if child.name.is_empty() {
            defects.push(format!("{}: field with an empty name", parent));
            continue;
        }
        if !seen.insert(child.name.as_str()) {
            defects.push(format!("{}: duplicate field '{}'", parent, child.name));
        }
        let path = if parent.is_empty() {
            child.name.clone()
        } else {
            format!("{}.{}", parent, child.name)
        };
        child.check_at(&path, defects);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_tree_has_no_defects() {
        let field = FieldSpec::object(
            "retries",
            vec![
                FieldSpec::string("retryOn").min_length(1),
                FieldSpec::integer("numRetries").between(0, 4_294_967_295),
                FieldSpec::list("hosts", FieldSpec::string("item").max_length(253)).max_items(8),
                FieldSpec::map("selector"),
            ],
        );

        assert!(field.check().is_empty());
    }

    #[test]
    fn test_duplicate_and_empty_names() {
        let field = FieldSpec::object(
            "spec",
            vec![
                FieldSpec::string("host"),
                FieldSpec::string("host"),
                FieldSpec::boolean(""),
            ],
        );

        let defects = field.check();
        assert_eq!(defects.len(), 2);
        assert!(defects.iter().any(|d| d.contains("duplicate field 'host'")));
        assert!(defects.iter().any(|d| d.contains("empty name")));
    }

    #[test]
    fn test_constraints_must_fit_kind() {
        let defects = FieldSpec::integer("port").min_length(1).check();
        assert_eq!(defects.len(), 1);
        assert!(defects[0].contains("string constraints declared on a integer field"));

        let defects = FieldSpec::string("name").between(0, 10).check();
        assert!(defects[0].contains("numeric bounds"));

        let defects = FieldSpec::string("name").min_items(1).check();
        assert!(defects[0].contains("item count bounds"));

        let defects = FieldSpec::integer("weight")
            .at_least(Bound::Float(0.5))
            .check();
        assert!(defects[0].contains("fractional bound"));
    }

    #[test]
    fn test_inverted_bounds_and_bad_pattern() {
        let defects = FieldSpec::string("name")
            .min_length(5)
            .max_length(2)
            .pattern("([a-z")
            .check();

        assert_eq!(defects.len(), 2);
        assert!(defects[0].contains("minLength 5 exceeds maxLength 2"));
        assert!(defects[1].contains("pattern does not compile"));

        let defects = FieldSpec::integer("n").between(10, 1).check();
        assert!(defects[0].contains("minimum 10 exceeds maximum 1"));
    }

    #[test]
    fn test_nested_defect_paths() {
        let field = FieldSpec::object(
            "spec",
            vec![FieldSpec::list(
                "routes",
                FieldSpec::object("item", vec![FieldSpec::boolean("enabled").max_length(1)]),
            )],
        );

        let defects = field.check();
        assert_eq!(defects.len(), 1);
        assert!(defects[0].starts_with("spec.routes[].enabled:"));
    }

    #[test]
    fn test_required_list_element_is_a_defect() {
        let defects = FieldSpec::list("names", FieldSpec::string("item").required()).check();
        assert!(defects[0].contains("list element marked required"));
    }

    #[test]
    fn test_get_nested() {
        let field = FieldSpec::object(
            "spec",
            vec![FieldSpec::object(
                "retries",
                vec![FieldSpec::integer("numRetries")],
            )],
        );

        assert!(field.get_nested("retries.numRetries").is_some());
        assert!(field.get_nested("retries.missing").is_none());
    }
}
