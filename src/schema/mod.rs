//! Compiled schema constraints.
//!
//! Schemas are stored in a [`SchemaArena`] and addressed by [`SchemaId`] so
//! that component references can be shared between operations and may refer
//! back to themselves. Index zero is always the unconstrained [`SchemaId::ANY`]
//! node.

mod compiler;
mod format;
mod validator;

pub use compiler::SchemaCompiler;
pub use validator::SchemaValidator;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::fmt;

/// Handle to a node in a [`SchemaArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaId(usize);

impl SchemaId {
    /// The always-matching node
    pub const ANY: SchemaId = SchemaId(0);

    pub fn is_any(self) -> bool {
        self == SchemaId::ANY
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// JSON Schema primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl SchemaType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "object" => Some(SchemaType::Object),
            "array" => Some(SchemaType::Array),
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" => Some(SchemaType::Integer),
            "boolean" => Some(SchemaType::Boolean),
            "null" => Some(SchemaType::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
        }
    }

    /// Whether a JSON value is an instance of this type.
    /// `integer` accepts whole-valued floats such as `1.0`.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (SchemaType::Object, Value::Object(_)) => true,
            (SchemaType::Array, Value::Array(_)) => true,
            (SchemaType::String, Value::String(_)) => true,
            (SchemaType::Number, Value::Number(_)) => true,
            (SchemaType::Integer, Value::Number(n)) => is_whole_number(n),
            (SchemaType::Boolean, Value::Bool(_)) => true,
            (SchemaType::Null, Value::Null) => true,
            _ => false,
        }
    }

    /// Runtime kind of a JSON value, used in violation messages
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => SchemaType::Object,
            Value::Array(_) => SchemaType::Array,
            Value::String(_) => SchemaType::String,
            Value::Number(n) if is_whole_number(n) => SchemaType::Integer,
            Value::Number(_) => SchemaType::Number,
            Value::Bool(_) => SchemaType::Boolean,
            Value::Null => SchemaType::Null,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn is_whole_number(n: &serde_json::Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// What to do with object keys not listed in `properties`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdditionalProperties {
    /// Absent or `true`: accept any extra key
    #[default]
    Unconstrained,
    /// `false`: reject every extra key
    Forbidden,
    /// Validate each extra value against this schema
    Schema(SchemaId),
}

/// A compiled `pattern` keyword.
///
/// Patterns are ECMA-262 expressions. Most compile with `regex`; look-around
/// and backreferences need the backtracking engine of `fancy_regex`.
#[derive(Debug, Clone)]
pub enum Pattern {
    Standard(Regex),
    Backtracking(fancy_regex::Regex),
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, fancy_regex::Error> {
        match Regex::new(source) {
            Ok(regex) => Ok(Pattern::Standard(regex)),
            Err(_) => {
                let regex = fancy_regex::Regex::new(source)?;
                tracing::debug!(pattern = source, "Using backtracking engine for pattern");
                Ok(Pattern::Backtracking(regex))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Standard(regex) => regex.as_str(),
            Pattern::Backtracking(regex) => regex.as_str(),
        }
    }

    /// Hitting the backtrack limit counts as a match.
    pub fn is_match(&self, s: &str) -> bool {
        match self {
            Pattern::Standard(regex) => regex.is_match(s),
            Pattern::Backtracking(regex) => regex.is_match(s).unwrap_or_else(|e| {
                tracing::warn!(pattern = regex.as_str(), error = %e, "Pattern match aborted");
                true
            }),
        }
    }
}

/// One compiled schema node
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    /// Allowed types; empty means any type
    pub types: Vec<SchemaType>,
    pub nullable: bool,
    pub format: Option<String>,
    pub enum_values: Option<Vec<Value>>,
    pub const_value: Option<Value>,

    pub properties: IndexMap<String, SchemaId>,
    pub required: Vec<String>,
    pub additional_properties: AdditionalProperties,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,

    pub items: Option<SchemaId>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Pattern>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,

    pub all_of: Vec<SchemaId>,
    pub any_of: Vec<SchemaId>,
    pub one_of: Vec<SchemaId>,
    pub not: Option<SchemaId>,
}

impl SchemaNode {
    /// True when the node accepts every value
    pub fn is_unconstrained(&self) -> bool {
        self.types.is_empty()
            && self.format.is_none()
            && self.enum_values.is_none()
            && self.const_value.is_none()
            && self.properties.is_empty()
            && self.required.is_empty()
            && self.additional_properties == AdditionalProperties::Unconstrained
            && self.min_properties.is_none()
            && self.max_properties.is_none()
            && self.items.is_none()
            && self.min_items.is_none()
            && self.max_items.is_none()
            && !self.unique_items
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.minimum.is_none()
            && self.maximum.is_none()
            && self.exclusive_minimum.is_none()
            && self.exclusive_maximum.is_none()
            && self.multiple_of.is_none()
            && self.all_of.is_empty()
            && self.any_of.is_empty()
            && self.one_of.is_empty()
            && self.not.is_none()
    }

    /// The declared type when exactly one non-null type is allowed
    pub fn scalar_type(&self) -> Option<SchemaType> {
        let mut non_null = self.types.iter().filter(|t| **t != SchemaType::Null);
        match (non_null.next(), non_null.next()) {
            (Some(t), None) => Some(*t),
            _ => None,
        }
    }

    pub fn accepts_null(&self) -> bool {
        self.nullable || self.types.contains(&SchemaType::Null)
    }
}

/// Owner of every compiled schema node of a description
#[derive(Debug, Clone)]
pub struct SchemaArena {
    nodes: Vec<SchemaNode>,
}

impl Default for SchemaArena {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaArena {
    pub fn new() -> Self {
        Self {
            nodes: vec![SchemaNode::default()],
        }
    }

    pub fn get(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // the ANY node is always present
        false
    }

    pub fn alloc(&mut self, node: SchemaNode) -> SchemaId {
        self.nodes.push(node);
        SchemaId(self.nodes.len() - 1)
    }

    /// Reserve a slot for a node compiled later (recursive references)
    pub(crate) fn reserve(&mut self) -> SchemaId {
        self.alloc(SchemaNode::default())
    }

    pub(crate) fn set(&mut self, id: SchemaId, node: SchemaNode) {
        self.nodes[id.0] = node;
    }
}
