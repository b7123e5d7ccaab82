//! Compatibility gate for schemas.
//!
//! Decides whether a raw JSON Schema document (or an already-built
//! [`SchemaNode`]) is inside the subset the walker can render: primitives,
//! string enums, arrays of primitives/enums, and records of compatible fields
//! nested at most `max_depth` records deep.
//!
//! Two modes share the same classification and the same verdict:
//! - [`CompatibilityChecker::is_compatible`] is a boolean reject; fragments
//!   whose validator does not compile are rejected as malformed.
//! - [`CompatibilityChecker::check`] narrows the raw value into a typed
//!   [`SchemaNode`] tree and keeps the compiled validators.
use serde_json::Value;
use tracing::debug;

use crate::error::{EngineError, Incompatibility, IncompatibleReason};
use crate::schema::{Field, SchemaKind, SchemaNode};

pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Boolean mode with an explicit depth budget.
pub fn is_compatible(raw: &Value, depth_budget: usize) -> bool {
    CompatibilityChecker::new(depth_budget).is_compatible(raw)
}

/// Narrowing mode with an explicit depth budget.
pub fn check(raw: &Value, depth_budget: usize) -> Result<SchemaNode, EngineError> {
    CompatibilityChecker::new(depth_budget).check(raw)
}

#[derive(Debug, Clone, Copy)]
pub struct CompatibilityChecker {
    max_depth: usize,
}

impl Default for CompatibilityChecker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Shape of a raw fragment, borrowed from the document.
enum RawKind<'a> {
    Boolean,
    String,
    Number { integer: bool },
    Enum(Vec<String>),
    Array(&'a Value),
    Record(Vec<(&'a str, &'a Value)>),
}

impl RawKind<'_> {
    fn name(&self) -> &'static str {
        match self {
            RawKind::Boolean => "boolean",
            RawKind::String => "string",
            RawKind::Number { integer: false } => "number",
            RawKind::Number { integer: true } => "integer",
            RawKind::Enum(_) => "enum",
            RawKind::Array(_) => "array",
            RawKind::Record(_) => "record",
        }
    }
}

impl CompatibilityChecker {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_compatible(&self, raw: &Value) -> bool {
        match self.inspect(raw, self.max_depth, "$") {
            Ok(()) => true,
            Err(incompatibility) => {
                debug!("{}", incompatibility);
                false
            }
        }
    }

    /// Same traversal as [`Self::is_compatible`] but keeps the failing path and reason.
    pub fn explain(&self, raw: &Value) -> Result<(), Incompatibility> {
        self.inspect(raw, self.max_depth, "$")
    }

    pub fn check(&self, raw: &Value) -> Result<SchemaNode, EngineError> {
        self.narrow(raw, self.max_depth, "$")
    }

    /// Re-checks a node tree that may have been assembled by hand.
    pub fn check_node(&self, node: &SchemaNode) -> Result<(), Incompatibility> {
        self.check_node_at(node, self.max_depth, "$")
    }

    fn inspect(&self, raw: &Value, budget: usize, path: &str) -> Result<(), Incompatibility> {
        match classify(raw, path)? {
            RawKind::Array(items) => {
                let element_path = format!("{path}[]");
                let element = classify(items, &element_path)?;
                if matches!(element, RawKind::Array(_) | RawKind::Record(_)) {
                    return Err(Incompatibility::new(
                        element_path,
                        IncompatibleReason::UnsupportedArrayElement(element.name().to_string()),
                    ));
                }
                compiles(items, &element_path)?;
            }
            RawKind::Record(fields) => {
                if budget == 0 {
                    return Err(self.depth_exceeded(path));
                }
                for (name, child) in fields {
                    self.inspect(child, budget - 1, &format!("{path}.{name}"))?;
                }
            }
            _ => {}
        }
        compiles(raw, path)
    }

    fn narrow(&self, raw: &Value, budget: usize, path: &str) -> Result<SchemaNode, EngineError> {
        let kind = match classify(raw, path)? {
            RawKind::Boolean => SchemaKind::Boolean,
            RawKind::String => SchemaKind::String,
            RawKind::Number { integer } => SchemaKind::Number { integer },
            RawKind::Enum(options) => SchemaKind::Enum(options),
            RawKind::Array(items) => {
                let element_path = format!("{path}[]");
                let element = match classify(items, &element_path)? {
                    RawKind::Boolean => SchemaKind::Boolean,
                    RawKind::String => SchemaKind::String,
                    RawKind::Number { integer } => SchemaKind::Number { integer },
                    RawKind::Enum(options) => SchemaKind::Enum(options),
                    other => {
                        return Err(Incompatibility::new(
                            element_path,
                            IncompatibleReason::UnsupportedArrayElement(other.name().to_string()),
                        )
                        .into());
                    }
                };
                let element = SchemaNode::compile(element, items.clone(), &element_path)?;
                SchemaKind::Array(Box::new(element))
            }
            RawKind::Record(fields) => {
                if budget == 0 {
                    return Err(self.depth_exceeded(path).into());
                }
                let mut narrowed = Vec::with_capacity(fields.len());
                for (name, child) in fields {
                    let node = self.narrow(child, budget - 1, &format!("{path}.{name}"))?;
                    narrowed.push(Field {
                        name: name.to_string(),
                        node,
                    });
                }
                SchemaKind::Record(narrowed)
            }
        };
        SchemaNode::compile(kind, raw.clone(), path)
    }

    fn check_node_at(&self, node: &SchemaNode, budget: usize, path: &str) -> Result<(), Incompatibility> {
        match node.kind() {
            SchemaKind::Array(element) if !element.kind().is_primitive() => Err(Incompatibility::new(
                format!("{path}[]"),
                IncompatibleReason::UnsupportedArrayElement(element.kind().name().to_string()),
            )),
            SchemaKind::Record(fields) => {
                if budget == 0 {
                    return Err(self.depth_exceeded(path));
                }
                for field in fields {
                    self.check_node_at(&field.node, budget - 1, &format!("{path}.{}", field.name))?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn depth_exceeded(&self, path: &str) -> Incompatibility {
        Incompatibility::new(
            path,
            IncompatibleReason::DepthExceeded {
                max_depth: self.max_depth,
            },
        )
    }
}

/// Same compile step `SchemaNode` performs, reported as a malformed fragment.
fn compiles(raw: &Value, path: &str) -> Result<(), Incompatibility> {
    jsonschema::validator_for(raw)
        .map(|_| ())
        .map_err(|e| Incompatibility::new(path, IncompatibleReason::Malformed(e.to_string())))
}

fn classify<'a>(raw: &'a Value, path: &str) -> Result<RawKind<'a>, Incompatibility> {
    let unsupported = |kind: &str| {
        Incompatibility::new(path, IncompatibleReason::UnsupportedKind(kind.to_string()))
    };
    let malformed = |msg: &str| Incompatibility::new(path, IncompatibleReason::Malformed(msg.to_string()));

    let Some(obj) = raw.as_object() else {
        return Err(malformed("schema node must be an object"));
    };

    if obj.contains_key("$ref") || obj.contains_key("$dynamicRef") || obj.contains_key("$recursiveRef") {
        return Err(Incompatibility::new(path, IncompatibleReason::SelfReference));
    }
    for combinator in ["anyOf", "oneOf", "allOf", "not", "if"] {
        if obj.contains_key(combinator) {
            return Err(unsupported(combinator));
        }
    }

    let declared = match obj.get("type") {
        None => None,
        Some(Value::String(t)) => Some(t.as_str()),
        Some(Value::Array(types)) => {
            let joined: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            return Err(unsupported(&joined.join(" | ")));
        }
        Some(_) => return Err(malformed("`type` must be a string")),
    };

    if let Some(options) = obj.get("enum") {
        if declared.is_some_and(|t| t != "string") {
            return Err(unsupported(&format!("{} enum", declared.unwrap_or_default())));
        }
        let Some(options) = options.as_array() else {
            return Err(malformed("`enum` must be an array"));
        };
        if options.is_empty() {
            return Err(malformed("`enum` must list at least one option"));
        }
        let mut out = Vec::with_capacity(options.len());
        for option in options {
            match option.as_str() {
                Some(s) => out.push(s.to_string()),
                None => return Err(unsupported("non-string enum")),
            }
        }
        return Ok(RawKind::Enum(out));
    }

    match declared {
        Some("boolean") => Ok(RawKind::Boolean),
        Some("string") => Ok(RawKind::String),
        Some("number") => Ok(RawKind::Number { integer: false }),
        Some("integer") => Ok(RawKind::Number { integer: true }),
        Some("array") => match obj.get("items") {
            Some(items @ Value::Object(_)) => Ok(RawKind::Array(items)),
            Some(Value::Array(_)) => Err(unsupported("tuple")),
            Some(_) => Err(malformed("`items` must be a schema object")),
            None => Err(malformed("array without `items`")),
        },
        Some("object") => match obj.get("properties") {
            Some(Value::Object(properties)) => Ok(RawKind::Record(
                properties.iter().map(|(name, child)| (name.as_str(), child)).collect(),
            )),
            Some(_) => Err(malformed("`properties` must be an object")),
            None => Err(unsupported("free-form object")),
        },
        Some(other) => Err(unsupported(other)),
        None => Err(malformed("missing `type`")),
    }
}
