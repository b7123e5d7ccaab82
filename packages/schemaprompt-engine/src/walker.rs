//! Recursive schema walk.
//!
//! Dispatches each node to a primitive adapter, the array collector, or a
//! descent into record fields, and assembles a value with the same shape as
//! the schema. Depth grows by one per record descent only.
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::adapters::{PrimitiveAdapter, Prompted};
use crate::collector::ArrayCollector;
use crate::error::EngineError;
use crate::interaction::UserInteraction;
use crate::label::LabelSpec;
use crate::logging::{LogEvent, LogEventType, SessionLogger};
use crate::message::{
    ARRAY_LABEL, BOOLEAN_LABEL, ENUM_LABEL, FINALIZE_HINT, MessageFormatter, NUMBER_LABEL,
    STRING_LABEL,
};
use crate::schema::{SchemaKind, SchemaNode};

pub struct SchemaWalker<'a> {
    ui: &'a dyn UserInteraction,
    formatter: MessageFormatter,
    logger: Option<&'a SessionLogger>,
}

impl<'a> SchemaWalker<'a> {
    pub fn new(ui: &'a dyn UserInteraction) -> Self {
        Self {
            ui,
            formatter: MessageFormatter::default(),
            logger: None,
        }
    }

    pub fn with_formatter(mut self, formatter: MessageFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_logger(mut self, logger: Option<&'a SessionLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Walks `node` from depth 0 at path `$`.
    pub async fn walk_root(
        &self,
        node: &SchemaNode,
        label: Option<&LabelSpec>,
    ) -> Result<Value, EngineError> {
        self.walk(node, label, 0, "$").await
    }

    pub async fn walk(
        &self,
        node: &SchemaNode,
        label: Option<&LabelSpec>,
        depth: usize,
        path: &str,
    ) -> Result<Value, EngineError> {
        debug!(path, kind = node.kind().name(), depth, "walking node");
        match node.kind() {
            SchemaKind::Boolean => {
                self.leaf(PrimitiveAdapter::Boolean, BOOLEAN_LABEL, node, label, depth, path)
                    .await
            }
            SchemaKind::String => {
                self.leaf(PrimitiveAdapter::Text, STRING_LABEL, node, label, depth, path)
                    .await
            }
            SchemaKind::Number { .. } => {
                self.leaf(PrimitiveAdapter::Number, NUMBER_LABEL, node, label, depth, path)
                    .await
            }
            SchemaKind::Enum(_) => {
                self.leaf(PrimitiveAdapter::Choice, ENUM_LABEL, node, label, depth, path)
                    .await
            }
            SchemaKind::Array(_) => {
                self.ui.show_marker(&self.formatter.open_array(depth));
                let announce = self
                    .formatter
                    .format(depth + 1, ARRAY_LABEL, label, Some(FINALIZE_HINT));
                let values = ArrayCollector::new(self.ui, &self.formatter)
                    .collect(&announce, node, depth + 1)
                    .await?;
                self.log(LogEvent::info_with_details(
                    LogEventType::ArrayFinalized,
                    format!("Array at {path} finalized"),
                    serde_json::json!({ "path": path, "count": values.len() }),
                ))
                .await?;
                self.ui.show_marker(&self.formatter.close_array(depth));
                Ok(Value::Array(values))
            }
            SchemaKind::Record(fields) => {
                if let Some(label) = label {
                    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
                    for unknown in label.unknown_children(&names) {
                        warn!(path, label = unknown, "label does not match any field");
                    }
                }

                self.ui.show_marker(&self.formatter.open_record(depth, label));
                let mut out = Map::new();
                for field in fields {
                    let fallback = LabelSpec::plain(field.name.as_str());
                    let child_label = label.and_then(|l| l.child(&field.name)).unwrap_or(&fallback);
                    let child_path = format!("{path}.{}", field.name);
                    let value =
                        Box::pin(self.walk(&field.node, Some(child_label), depth + 1, &child_path))
                            .await?;
                    out.insert(field.name.clone(), value);
                }
                self.ui.show_marker(&self.formatter.close_record(depth));
                Ok(Value::Object(out))
            }
        }
    }

    async fn leaf(
        &self,
        adapter: PrimitiveAdapter,
        default_label: &str,
        node: &SchemaNode,
        label: Option<&LabelSpec>,
        depth: usize,
        path: &str,
    ) -> Result<Value, EngineError> {
        let message = self.formatter.format(depth, default_label, label, None);
        match adapter.prompt(self.ui, &message, node, None).await? {
            Prompted::Answered(value) => {
                self.log(LogEvent::info_with_details(
                    LogEventType::FieldAnswered,
                    format!("Field {path} answered"),
                    serde_json::json!({ "path": path }),
                ))
                .await?;
                Ok(value)
            }
            Prompted::Cancelled => Err(EngineError::Interrupted {
                message: format!("operator cancelled the prompt for `{path}`"),
            }),
        }
    }

    async fn log(&self, event: LogEvent) -> Result<(), EngineError> {
        if let Some(logger) = self.logger {
            logger
                .log(event)
                .await
                .map_err(|e| EngineError::Transcript(format!("{e:#}")))?;
        }
        Ok(())
    }
}
