//! Typed schema nodes.
//!
//! A `SchemaNode` is the narrowed form of a JSON Schema fragment: a closed set
//! of kinds the walker knows how to render, plus the fragment itself and a
//! compiled validator used to check answers before they are accepted.
use std::fmt;
use std::sync::Arc;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::EngineError;

/// Metadata object read for rendering hints, e.g. `{"x-meta": {"type": "markdown"}}`.
pub const METADATA_KEY: &str = "x-meta";

#[derive(Debug, Clone)]
pub enum SchemaKind {
    Boolean,
    String,
    Number { integer: bool },
    Enum(Vec<String>),
    Array(Box<SchemaNode>),
    Record(Vec<Field>),
}

impl SchemaKind {
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Boolean => "boolean",
            SchemaKind::String => "string",
            SchemaKind::Number { integer: false } => "number",
            SchemaKind::Number { integer: true } => "integer",
            SchemaKind::Enum(_) => "enum",
            SchemaKind::Array(_) => "array",
            SchemaKind::Record(_) => "record",
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            SchemaKind::Boolean | SchemaKind::String | SchemaKind::Number { .. } | SchemaKind::Enum(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub node: SchemaNode,
}

#[derive(Clone)]
pub struct SchemaNode {
    kind: SchemaKind,
    fragment: Value,
    validator: Arc<Validator>,
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaNode")
            .field("kind", &self.kind)
            .field("fragment", &self.fragment)
            .finish()
    }
}

impl SchemaNode {
    /// Builds a node from an already-narrowed kind and the fragment it came from.
    pub fn new(kind: SchemaKind, fragment: Value) -> Result<Self, EngineError> {
        Self::compile(kind, fragment, "$")
    }

    pub(crate) fn compile(kind: SchemaKind, fragment: Value, path: &str) -> Result<Self, EngineError> {
        let validator = jsonschema::validator_for(&fragment).map_err(|e| EngineError::InvalidSchema {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            kind,
            fragment,
            validator: Arc::new(validator),
        })
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    pub fn fragment(&self) -> &Value {
        &self.fragment
    }

    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            SchemaKind::Record(fields) => fields,
            _ => &[],
        }
    }

    pub fn options(&self) -> &[String] {
        match &self.kind {
            SchemaKind::Enum(options) => options,
            _ => &[],
        }
    }

    pub fn element(&self) -> Option<&SchemaNode> {
        match &self.kind {
            SchemaKind::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Free-form metadata lookup under `x-meta`.
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.fragment.get(METADATA_KEY).and_then(|meta| meta.get(key))
    }

    /// Rendering hint for string fields (`x-meta.type`).
    pub fn type_hint(&self) -> Option<&str> {
        self.metadata("type").and_then(Value::as_str)
    }
}

/// One validation problem reported for a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub message: String,
}

impl Issue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Non-panicking validation of a candidate value.
pub trait SafeValidate {
    fn safe_validate(&self, value: &Value) -> Result<(), Vec<Issue>>;
}

impl SafeValidate for SchemaNode {
    fn safe_validate(&self, value: &Value) -> Result<(), Vec<Issue>> {
        let issues: Vec<Issue> = self
            .validator
            .iter_errors(value)
            .map(|e| Issue::new(e.to_string()))
            .collect();
        if issues.is_empty() { Ok(()) } else { Err(issues) }
    }
}
