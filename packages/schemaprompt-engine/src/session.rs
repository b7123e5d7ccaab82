//! Session driver: compatibility check, walk, confirm or restart.
use serde_json::Value;
use tracing::{info, warn};

use crate::compat::CompatibilityChecker;
use crate::config::EngineConfig;
use crate::error::{EngineError, PromptError};
use crate::interaction::{PromptRequest, UserInteraction};
use crate::label::LabelSpec;
use crate::logging::SessionLogger;
use crate::schema::{SafeValidate, SchemaNode};
use crate::walker::SchemaWalker;

pub const STEP_NAME: &str = "Data entry";
pub const CONFIRM_MESSAGE: &str = "Submit this data?";

fn transcript_error(e: anyhow::Error) -> EngineError {
    EngineError::Transcript(format!("{e:#}"))
}

pub struct Session<'a> {
    ui: &'a dyn UserInteraction,
    config: EngineConfig,
}

impl<'a> Session<'a> {
    pub fn new(ui: &'a dyn UserInteraction) -> Self {
        Self {
            ui,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Narrows a raw schema document and runs the session on it.
    ///
    /// Nothing is prompted when the document is incompatible.
    pub async fn run(&self, schema: &Value, labels: Option<&LabelSpec>) -> Result<Value, EngineError> {
        let node = CompatibilityChecker::new(self.config.max_depth).check(schema)?;
        self.run_node(&node, labels).await
    }

    pub async fn run_node(
        &self,
        node: &SchemaNode,
        labels: Option<&LabelSpec>,
    ) -> Result<Value, EngineError> {
        CompatibilityChecker::new(self.config.max_depth).check_node(node)?;

        let logger = match &self.config.transcript_dir {
            Some(dir) => Some(SessionLogger::new(dir).await.map_err(transcript_error)?),
            None => None,
        };
        if let Some(logger) = &logger {
            info!(session_id = logger.session_id(), "Transcript: {}", logger.log_file_path().display());
            logger
                .log_session_start(node.kind().name(), self.config.require_confirmation)
                .await
                .map_err(transcript_error)?;
        }

        let walker = SchemaWalker::new(self.ui)
            .with_formatter(self.config.formatter())
            .with_logger(logger.as_ref());

        let mut attempt = 0;
        loop {
            attempt += 1;
            info!(attempt, root = node.kind().name(), "starting data entry");
            if let Some(logger) = &logger {
                logger.log_walk_start(attempt).await.map_err(transcript_error)?;
            }

            self.ui.start_step(STEP_NAME);
            let value = match walker.walk_root(node, labels).await {
                Ok(value) => value,
                Err(e) => {
                    if let Some(logger) = &logger {
                        if let Err(log_err) = logger.log_error(&e.to_string()).await {
                            warn!("Failed to record session error in transcript: {:#}", log_err);
                        }
                    }
                    return Err(e);
                }
            };
            self.ui.end_step(STEP_NAME);

            if let Err(issues) = node.safe_validate(&value) {
                warn!(issues = issues.len(), "collected value does not satisfy the root schema");
            }

            if !self.config.require_confirmation {
                return self.submit(logger.as_ref(), attempt, value).await;
            }

            self.ui.render_value(&value);
            let accepted = match self
                .ui
                .ask_yes_no(PromptRequest::new(CONFIRM_MESSAGE), None)
                .await
            {
                Ok(accepted) => accepted,
                Err(PromptError::Cancelled) => {
                    return Err(EngineError::Interrupted {
                        message: "operator cancelled the confirmation".to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            };
            if let Some(logger) = &logger {
                logger
                    .log_confirmation(attempt, accepted)
                    .await
                    .map_err(transcript_error)?;
            }

            if accepted {
                return self.submit(logger.as_ref(), attempt, value).await;
            }
            info!(attempt, "submission declined, restarting");
        }
    }

    async fn submit(
        &self,
        logger: Option<&SessionLogger>,
        attempts: usize,
        value: Value,
    ) -> Result<Value, EngineError> {
        if let Some(logger) = logger {
            logger.log_submitted(attempts).await.map_err(transcript_error)?;
        }
        info!(attempts, "data entry submitted");
        Ok(value)
    }
}
