use serde_json::Value;
use tracing::{debug, info};

use crate::adapters::{PrimitiveAdapter, Prompted};
use crate::cancel::CancellationToken;
use crate::error::EngineError;
use crate::interaction::UserInteraction;
use crate::message::MessageFormatter;
use crate::schema::SchemaNode;

/// Open-ended element collection for array fields.
///
/// Runs until the operator cancels an element prompt; there is no upper
/// bound on the number of elements. A backend may also return an answer and
/// mark the element's token cancelled, which keeps that answer and ends the
/// array.
pub struct ArrayCollector<'a> {
    ui: &'a dyn UserInteraction,
    formatter: &'a MessageFormatter,
}

impl<'a> ArrayCollector<'a> {
    pub fn new(ui: &'a dyn UserInteraction, formatter: &'a MessageFormatter) -> Self {
        Self { ui, formatter }
    }

    pub async fn collect(
        &self,
        announce: &str,
        array: &SchemaNode,
        depth: usize,
    ) -> Result<Vec<Value>, EngineError> {
        let element = array.element().ok_or_else(|| EngineError::UnsupportedArrayElement {
            kind: array.kind().name().to_string(),
        })?;
        let adapter =
            PrimitiveAdapter::for_node(element).ok_or_else(|| EngineError::UnsupportedArrayElement {
                kind: element.kind().name().to_string(),
            })?;

        self.ui.show_marker(announce);
        let message = self.formatter.element(depth);
        let mut values = Vec::new();

        loop {
            let token = CancellationToken::new();
            match adapter.prompt(self.ui, &message, element, Some(&token)).await? {
                Prompted::Answered(value) => {
                    debug!(index = values.len(), "array element accepted");
                    values.push(value);
                    if token.is_cancelled() {
                        break;
                    }
                }
                Prompted::Cancelled => break,
            }
        }

        info!(count = values.len(), "array collection finalized");
        Ok(values)
    }
}
