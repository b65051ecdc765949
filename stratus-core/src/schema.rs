//! Schema - Define type schemas for resources
//!
//! Providers declare one schema per resource type and data source. The
//! schema is the validation table every configuration passes through before
//! any remote call is made, and it carries the markers (computed, force-new,
//! sensitive) the differ and the orchestration layer depend on.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values, matched case-sensitively)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// Ordered list
    List(Box<AttributeType>),
    /// Unordered collection without duplicates
    Set(Box<AttributeType>),
    /// Map with string keys
    Map(Box<AttributeType>),
    /// Nested configuration block, carried as a list of maps
    Block(Box<BlockSchema>),
}

/// Schema of a nested block
#[derive(Debug, Clone)]
pub struct BlockSchema {
    pub attributes: HashMap<String, AttributeSchema>,
    pub min_items: usize,
    pub max_items: Option<usize>,
    /// Blocks form a set: order is irrelevant and duplicates are rejected
    pub unordered: bool,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self {
            attributes: HashMap::new(),
            min_items: 0,
            max_items: None,
            unordered: false,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = n;
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    /// A block that may appear at most once
    pub fn single(self) -> Self {
        self.max_items(1)
    }

    pub fn as_set(mut self) -> Self {
        self.unordered = true;
        self
    }
}

impl Default for BlockSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Set(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                    if items[..i].contains(item) {
                        return Err(TypeError::DuplicateSetItem { index: i });
                    }
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(block), Value::List(items)) => {
                if items.len() < block.min_items {
                    return Err(TypeError::TooFewBlocks {
                        min: block.min_items,
                        got: items.len(),
                    });
                }
                if let Some(max) = block.max_items
                    && items.len() > max
                {
                    return Err(TypeError::TooManyBlocks {
                        max,
                        got: items.len(),
                    });
                }
                for (i, item) in items.iter().enumerate() {
                    let Value::Map(fields) = item else {
                        return Err(TypeError::ListItemError {
                            index: i,
                            inner: Box::new(TypeError::TypeMismatch {
                                expected: "Block".to_string(),
                                got: item.type_name(),
                            }),
                        });
                    };
                    if let Some(first) = validate_fields(&block.attributes, fields)
                        .err()
                        .and_then(|errors| errors.into_iter().next())
                    {
                        return Err(TypeError::ListItemError {
                            index: i,
                            inner: Box::new(first),
                        });
                    }
                    if block.unordered && items[..i].contains(item) {
                        return Err(TypeError::DuplicateSetItem { index: i });
                    }
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Set(inner) => format!("Set<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }

    /// True for types whose list values compare without regard to order
    pub fn is_unordered(&self) -> bool {
        match self {
            AttributeType::Set(_) => true,
            AttributeType::Block(block) => block.unordered,
            _ => false,
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedOnly { name: String },

    #[error("'{name}' conflicts with '{other}'")]
    Conflict { name: String, other: String },

    #[error("Duplicate set item at index {index}")]
    DuplicateSetItem { index: usize },

    #[error("Expected at least {min} block(s), got {got}")]
    TooFewBlocks { min: usize, got: usize },

    #[error("Expected at most {max} block(s), got {got}")]
    TooManyBlocks { max: usize, got: usize },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    pub(crate) fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Filled in from the remote side; settable only when also optional
    pub computed: bool,
    /// Changing this attribute requires replacing the resource
    pub force_new: bool,
    /// Never logged or shown in diffs
    pub sensitive: bool,
    /// Accepted on write but never returned by remote reads
    pub write_only: bool,
    pub default: Option<Value>,
    /// Canonical spelling of a string value, applied before create and diff
    pub normalize: Option<fn(&str) -> String>,
    pub conflicts_with: Vec<String>,
    pub description: Option<String>,
    optional: bool,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            force_new: false,
            sensitive: false,
            write_only: false,
            default: None,
            normalize: None,
            conflicts_with: Vec::new(),
            description: None,
            optional: true,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    /// Computed only: set by the provider, rejected in configuration
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self.optional = false;
        self
    }

    /// Optional and computed: the provider fills it when the caller doesn't
    pub fn optional_computed(mut self) -> Self {
        self.computed = true;
        self.optional = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Whether a missing remote value says nothing about drift
    pub fn is_unreadable(&self) -> bool {
        self.sensitive || self.write_only
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn normalized_by(mut self, normalize: fn(&str) -> String) -> Self {
        self.normalize = Some(normalize);
        self
    }

    /// The value in its canonical spelling; non-strings pass through
    pub fn normalized(&self, value: &Value) -> Value {
        match (self.normalize, value) {
            (Some(normalize), Value::String(s)) => Value::String(normalize(s)),
            _ => value.clone(),
        }
    }

    pub fn conflicts_with(mut self, other: impl Into<String>) -> Self {
        self.conflicts_with.push(other.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Whether the caller may set this attribute at all
    pub fn is_settable(&self) -> bool {
        self.required || self.optional
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        validate_fields(&self.attributes, attributes)
    }

    /// Fill in declared defaults for attributes the caller left out and
    /// normalize the values that have a canonical spelling, including inside
    /// every nested block instance
    pub fn apply_defaults(&self, attributes: &mut HashMap<String, Value>) {
        apply_field_defaults(&self.attributes, attributes);
    }

    /// Names of attributes whose change forces replacement, sorted
    pub fn force_new_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .attributes
            .values()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

fn apply_field_defaults(
    schema: &HashMap<String, AttributeSchema>,
    attributes: &mut HashMap<String, Value>,
) {
    for (name, attr) in schema {
        if let Some(default) = &attr.default
            && !attributes.contains_key(name)
        {
            attributes.insert(name.clone(), default.clone());
        }
        if attr.normalize.is_some()
            && let Some(value) = attributes.get_mut(name)
        {
            *value = attr.normalized(value);
        }
        if let AttributeType::Block(block) = &attr.attr_type
            && let Some(Value::List(items)) = attributes.get_mut(name)
        {
            for item in items {
                if let Value::Map(fields) = item {
                    apply_field_defaults(&block.attributes, fields);
                }
            }
        }
    }
}

fn validate_fields(
    schema: &HashMap<String, AttributeSchema>,
    attributes: &HashMap<String, Value>,
) -> Result<(), Vec<TypeError>> {
    let mut errors = Vec::new();

    // Check required attributes
    for (name, attr) in schema {
        if attr.required && !attributes.contains_key(name) && attr.default.is_none() {
            errors.push(TypeError::MissingRequired { name: name.clone() });
        }
    }

    // Type check each attribute
    for (name, value) in attributes {
        let Some(attr) = schema.get(name) else {
            errors.push(TypeError::UnknownAttribute { name: name.clone() });
            continue;
        };
        if !attr.is_settable() {
            errors.push(TypeError::ComputedOnly { name: name.clone() });
            continue;
        }
        if let Err(e) = attr.attr_type.validate(value) {
            errors.push(TypeError::AttributeError {
                name: name.clone(),
                inner: Box::new(e),
            });
        }
        for other in &attr.conflicts_with {
            if attributes.contains_key(other) {
                // Ordered so a pair declared on both sides is reported once
                let (first, second) = if name < other { (name, other) } else { (other, name) };
                errors.push(TypeError::Conflict {
                    name: first.clone(),
                    other: second.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        // HashMap iteration order is arbitrary; keep reports stable
        let mut seen = HashSet::new();
        errors.retain(|e| seen.insert(e.to_string()));
        errors.sort_by_key(|e| e.to_string());
        Err(errors)
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// String that must not be empty
    pub fn non_empty_string() -> AttributeType {
        AttributeType::Custom {
            name: "NonEmptyString".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) if s.trim().is_empty() => {
                    Err("Value must not be empty".to_string())
                }
                Value::String(_) => Ok(()),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// UUID in its canonical hyphenated form
    pub fn uuid() -> AttributeType {
        AttributeType::Custom {
            name: "Uuid".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| {
                if let Value::String(s) = value {
                    validate_uuid(s)
                } else {
                    Err("Expected string".to_string())
                }
            },
        }
    }

    /// Set of non-empty strings
    pub fn string_set() -> AttributeType {
        AttributeType::Set(Box::new(non_empty_string()))
    }
}

/// Validate UUID format (e.g., "8a2f0d64-26e9-4f07-9a8c-6c8e1e4d3d62")
pub fn validate_uuid(s: &str) -> Result<(), String> {
    let groups: Vec<&str> = s.split('-').collect();
    let lengths = [8, 4, 4, 4, 12];
    let valid = groups.len() == lengths.len()
        && groups
            .iter()
            .zip(lengths)
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid UUID", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::Enum(vec!["Pre".to_string(), "Post".to_string()]);
        assert!(t.validate(&Value::String("Pre".to_string())).is_ok());
        assert!(t.validate(&Value::String("pre".to_string())).is_err());
        assert!(t.validate(&Value::String("Other".to_string())).is_err());
    }

    #[test]
    fn validate_positive_int() {
        let t = types::positive_int();
        assert!(t.validate(&Value::Int(1)).is_ok());
        assert!(t.validate(&Value::Int(100)).is_ok());
        assert!(t.validate(&Value::Int(0)).is_err());
        assert!(t.validate(&Value::Int(-1)).is_err());
    }

    #[test]
    fn validate_uuid_type() {
        let t = types::uuid();
        assert!(
            t.validate(&Value::string("8a2f0d64-26e9-4f07-9a8c-6c8e1e4d3d62"))
                .is_ok()
        );
        assert!(t.validate(&Value::string("not-a-uuid")).is_err());
        assert!(
            t.validate(&Value::string("8a2f0d6426e94f079a8c6c8e1e4d3d62"))
                .is_err()
        );
    }

    #[test]
    fn set_rejects_duplicates() {
        let t = types::string_set();
        assert!(t.validate(&Value::string_list(["a", "b"])).is_ok());
        assert!(matches!(
            t.validate(&Value::string_list(["a", "a"])),
            Err(TypeError::DuplicateSetItem { index: 1 })
        ));
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("count", types::positive_int()))
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool));

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("my-resource".to_string()));
        attrs.insert("count".to_string(), Value::Int(5));
        attrs.insert("enabled".to_string(), Value::Bool(true));

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("database")
            .attribute(AttributeSchema::new("name", AttributeType::String).required());

        let attrs = HashMap::new();
        let errors = schema.validate(&attrs).unwrap_err();
        assert!(matches!(errors[0], TypeError::MissingRequired { .. }));
    }

    #[test]
    fn unknown_and_computed_attributes_are_rejected() {
        let schema = ResourceSchema::new("cluster")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("https_endpoint", AttributeType::String).computed());

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::string("c"));
        attrs.insert("https_endpoint".to_string(), Value::string("x"));
        attrs.insert("bogus".to_string(), Value::Bool(true));

        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, TypeError::ComputedOnly { name } if name == "https_endpoint"))
        );
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, TypeError::UnknownAttribute { name } if name == "bogus"))
        );
    }

    #[test]
    fn conflicting_attributes_reported_once() {
        let schema = ResourceSchema::new("tde")
            .attribute(
                AttributeSchema::new("key_vault_key_id", AttributeType::String)
                    .conflicts_with("managed_hsm_key_id"),
            )
            .attribute(
                AttributeSchema::new("managed_hsm_key_id", AttributeType::String)
                    .conflicts_with("key_vault_key_id"),
            );

        let mut attrs = HashMap::new();
        attrs.insert("key_vault_key_id".to_string(), Value::string("a"));
        attrs.insert("managed_hsm_key_id".to_string(), Value::string("b"));

        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], TypeError::Conflict { .. }));
    }

    #[test]
    fn block_validation() {
        let block = BlockSchema::new()
            .attribute(AttributeSchema::new("max_throughput", types::positive_int()).required())
            .single();
        let t = AttributeType::Block(Box::new(block));

        let item = |n: i64| {
            let mut m = HashMap::new();
            m.insert("max_throughput".to_string(), Value::Int(n));
            Value::Map(m)
        };

        assert!(t.validate(&Value::List(vec![])).is_ok());
        assert!(t.validate(&Value::List(vec![item(4000)])).is_ok());
        assert!(matches!(
            t.validate(&Value::List(vec![item(4000), item(5000)])),
            Err(TypeError::TooManyBlocks { max: 1, got: 2 })
        ));
        assert!(matches!(
            t.validate(&Value::List(vec![item(0)])),
            Err(TypeError::ListItemError { index: 0, .. })
        ));
        assert!(matches!(
            t.validate(&Value::List(vec![Value::Map(HashMap::new())])),
            Err(TypeError::ListItemError { index: 0, .. })
        ));
    }

    #[test]
    fn defaults_are_applied() {
        let schema = ResourceSchema::new("role_definition").attribute(
            AttributeSchema::new("type", AttributeType::String)
                .force_new()
                .with_default(Value::string("CustomRole")),
        );
        let mut attrs = HashMap::new();
        schema.apply_defaults(&mut attrs);
        assert_eq!(attrs.get("type"), Some(&Value::string("CustomRole")));
        assert_eq!(schema.force_new_attributes(), vec!["type"]);
    }

    #[test]
    fn defaults_reach_into_blocks() {
        let gateway = BlockSchema::new()
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool).with_default(Value::Bool(true)))
            .attribute(AttributeSchema::new("username", AttributeType::String).required())
            .single();
        let schema = ResourceSchema::new("cluster")
            .attribute(AttributeSchema::new("gateway", AttributeType::Block(Box::new(gateway))));

        let mut block = HashMap::new();
        block.insert("username".to_string(), Value::string("admin"));
        let mut attrs = HashMap::new();
        attrs.insert("gateway".to_string(), Value::List(vec![Value::Map(block)]));
        schema.apply_defaults(&mut attrs);

        let Some(Value::List(items)) = attrs.get("gateway") else {
            panic!("gateway block missing");
        };
        assert_eq!(
            items[0].as_map().and_then(|m| m.get("enabled")),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn defaults_normalize_values() {
        let schema = ResourceSchema::new("cluster").attribute(
            AttributeSchema::new("location", AttributeType::String)
                .required()
                .normalized_by(|s| s.replace(' ', "").to_lowercase()),
        );
        let mut attrs = HashMap::new();
        attrs.insert("location".to_string(), Value::string("West Europe"));
        schema.apply_defaults(&mut attrs);
        assert_eq!(attrs["location"], Value::string("westeurope"));
    }
}
