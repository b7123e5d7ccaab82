//! One prompt adapter per primitive kind.
//!
//! Each adapter turns `(message, node, token)` into the matching terminal
//! request, wires the node's validator inline, and reports operator
//! cancellation as [`Prompted::Cancelled`] instead of an error.
use serde_json::Value;
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::error::{EngineError, PromptError};
use crate::interaction::{PromptRequest, UserInteraction};
use crate::schema::{SchemaKind, SchemaNode};
use crate::validator;

/// Metadata type hints (case-insensitive) that select multi-line entry.
pub const LONG_TEXT_HINTS: [&str; 7] = [
    "longtext", "textarea", "markdown", "richtext", "long", "big", "bigtext",
];

/// Outcome of a single prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompted<T> {
    Answered(T),
    Cancelled,
}

pub fn is_long_form(node: &SchemaNode) -> bool {
    node.type_hint().is_some_and(|hint| {
        LONG_TEXT_HINTS
            .iter()
            .any(|candidate| hint.trim().eq_ignore_ascii_case(candidate))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveAdapter {
    Boolean,
    Text,
    Number,
    Choice,
}

impl PrimitiveAdapter {
    /// Picks the adapter for a primitive/enum node; arrays and records have none.
    pub fn for_node(node: &SchemaNode) -> Option<Self> {
        match node.kind() {
            SchemaKind::Boolean => Some(PrimitiveAdapter::Boolean),
            SchemaKind::String => Some(PrimitiveAdapter::Text),
            SchemaKind::Number { .. } => Some(PrimitiveAdapter::Number),
            SchemaKind::Enum(_) => Some(PrimitiveAdapter::Choice),
            SchemaKind::Array(_) | SchemaKind::Record(_) => None,
        }
    }

    pub async fn prompt(
        self,
        ui: &dyn UserInteraction,
        message: &str,
        node: &SchemaNode,
        cancel: Option<&CancellationToken>,
    ) -> Result<Prompted<Value>, EngineError> {
        let validate = validator::adapter(node);
        let result = match self {
            PrimitiveAdapter::Boolean => ui
                .ask_yes_no(PromptRequest::new(message), cancel)
                .await
                .map(Value::Bool),
            PrimitiveAdapter::Text => {
                let request = PromptRequest::new(message).with_validator(validate.as_ref());
                if is_long_form(node) {
                    debug!(hint = ?node.type_hint(), "long-form text entry");
                    ui.ask_long_text(request, cancel).await.map(Value::String)
                } else {
                    ui.ask_line(request.required(), cancel)
                        .await
                        .map(Value::String)
                }
            }
            PrimitiveAdapter::Number => {
                let request = PromptRequest::new(message)
                    .required()
                    .with_validator(validate.as_ref());
                ui.ask_number(request, cancel).await.map(Value::Number)
            }
            PrimitiveAdapter::Choice => {
                let request = PromptRequest::new(message).with_validator(validate.as_ref());
                ui.ask_choice(request, node.options(), cancel)
                    .await
                    .map(Value::String)
            }
        };

        match result {
            Ok(value) => Ok(Prompted::Answered(value)),
            Err(PromptError::Cancelled) => Ok(Prompted::Cancelled),
            Err(other) => Err(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat;
    use crate::interaction::mocks::{PromptKind, ScriptedAnswer, ScriptedInteraction};
    use serde_json::json;

    fn node(raw: Value) -> SchemaNode {
        compat::check(&raw, 0).unwrap()
    }

    #[test]
    fn test_long_form_hints() {
        for hint in ["longtext", "TextArea", "Markdown", "richText", "LONG", "big", "BigText"] {
            let n = node(json!({ "type": "string", "x-meta": { "type": hint } }));
            assert!(is_long_form(&n), "{hint} should select long-form entry");
        }
        assert!(!is_long_form(&node(json!({ "type": "string" }))));
        assert!(!is_long_form(&node(
            json!({ "type": "string", "x-meta": { "type": "short" } })
        )));
    }

    #[test]
    fn test_adapter_selection() {
        assert_eq!(
            PrimitiveAdapter::for_node(&node(json!({ "type": "boolean" }))),
            Some(PrimitiveAdapter::Boolean)
        );
        assert_eq!(
            PrimitiveAdapter::for_node(&node(json!({ "enum": ["a"] }))),
            Some(PrimitiveAdapter::Choice)
        );
        assert_eq!(
            PrimitiveAdapter::for_node(&node(
                json!({ "type": "array", "items": { "type": "string" } })
            )),
            None
        );
    }

    #[tokio::test]
    async fn test_string_adapter_uses_line_or_editor() {
        let ui = ScriptedInteraction::with_answers([
            ScriptedAnswer::text("short"),
            ScriptedAnswer::text("# Heading\nbody"),
        ]);
        let short = node(json!({ "type": "string" }));
        let long = node(json!({ "type": "string", "x-meta": { "type": "markdown" } }));

        let a = PrimitiveAdapter::Text.prompt(&ui, "Title: ", &short, None).await.unwrap();
        let b = PrimitiveAdapter::Text.prompt(&ui, "Body: ", &long, None).await.unwrap();

        assert_eq!(a, Prompted::Answered(json!("short")));
        assert_eq!(b, Prompted::Answered(json!("# Heading\nbody")));
        assert_eq!(ui.prompt_count(PromptKind::Line), 1);
        assert_eq!(ui.prompt_count(PromptKind::LongText), 1);
    }

    #[tokio::test]
    async fn test_number_adapter_validates_against_schema() {
        let ui = ScriptedInteraction::with_answers([
            ScriptedAnswer::number(200),
            ScriptedAnswer::number(36),
        ]);
        let age = node(json!({ "type": "integer", "minimum": 0, "maximum": 150 }));
        let answer = PrimitiveAdapter::Number.prompt(&ui, "Age: ", &age, None).await.unwrap();
        assert_eq!(answer, Prompted::Answered(json!(36)));
        assert_eq!(ui.rejections().len(), 1);
    }

    #[tokio::test]
    async fn test_choice_adapter_offers_declared_options() {
        let ui = ScriptedInteraction::with_answers([ScriptedAnswer::choice("green")]);
        let color = node(json!({ "enum": ["red", "green", "blue"] }));
        let answer = PrimitiveAdapter::Choice.prompt(&ui, "Color: ", &color, None).await.unwrap();
        assert_eq!(answer, Prompted::Answered(json!("green")));
    }

    #[tokio::test]
    async fn test_boolean_adapter() {
        let ui = ScriptedInteraction::with_answers([ScriptedAnswer::YesNo(false)]);
        let flag = node(json!({ "type": "boolean" }));
        let answer = PrimitiveAdapter::Boolean.prompt(&ui, "Active: ", &flag, None).await.unwrap();
        assert_eq!(answer, Prompted::Answered(json!(false)));
    }

    #[tokio::test]
    async fn test_cancellation_is_not_an_error() {
        let ui = ScriptedInteraction::with_answers([ScriptedAnswer::Cancel]);
        let token = CancellationToken::new();
        let answer = PrimitiveAdapter::Text
            .prompt(&ui, "", &node(json!({ "type": "string" })), Some(&token))
            .await
            .unwrap();
        assert_eq!(answer, Prompted::Cancelled);
    }

    #[tokio::test]
    async fn test_terminal_failure_propagates() {
        let ui = ScriptedInteraction::with_answers([ScriptedAnswer::Fail("tty closed".into())]);
        let result = PrimitiveAdapter::Number
            .prompt(&ui, "", &node(json!({ "type": "number" })), None)
            .await;
        assert!(matches!(
            result,
            Err(EngineError::Prompt(PromptError::Terminal(_)))
        ));
    }
}
