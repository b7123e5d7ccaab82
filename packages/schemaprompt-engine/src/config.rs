use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::compat::DEFAULT_MAX_DEPTH;
use crate::message::{DEFAULT_INDENT_UNIT, MessageFormatter};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Maximum record-within-record nesting.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Ask "Submit this data?" after each walk.
    #[serde(default = "default_require_confirmation")]
    pub require_confirmation: bool,
    #[serde(default = "default_indent_unit")]
    pub indent_unit: String,
    /// Where JSONL session transcripts go; no transcript when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_dir: Option<PathBuf>,
}

pub fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

pub fn default_require_confirmation() -> bool {
    true
}

pub fn default_indent_unit() -> String {
    DEFAULT_INDENT_UNIT.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema: None,
            max_depth: default_max_depth(),
            require_confirmation: default_require_confirmation(),
            indent_unit: default_indent_unit(),
            transcript_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        let schema_json = include_str!("../schemas/config.schema.json");
        let schema_val: Value = serde_json::from_str(schema_json)?;
        let validator = jsonschema::validator_for(&schema_val)
            .map_err(|e| anyhow::anyhow!("Failed to compile config schema: {}", e))?;

        let instance = serde_json::to_value(self)?;
        let error_msgs: Vec<String> = validator
            .iter_errors(&instance)
            .map(|e| e.to_string())
            .collect();
        if !error_msgs.is_empty() {
            anyhow::bail!("Engine config validation failed: {}", error_msgs.join(", "));
        }
        Ok(())
    }

    pub fn formatter(&self) -> MessageFormatter {
        MessageFormatter::new(self.indent_unit.clone())
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_confirmation(mut self, require_confirmation: bool) -> Self {
        self.require_confirmation = require_confirmation;
        self
    }

    pub fn with_transcript_dir(mut self, dir: PathBuf) -> Self {
        self.transcript_dir = Some(dir);
        self
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Reads a JSON or YAML document (by extension) into `T`.
pub async fn read_document<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {what} file {}", path.display()))?;
    if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML {what} in {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON {what} in {}", path.display()))
    }
}

/// Loads and validates an engine config file.
pub async fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    let config: EngineConfig = read_document(path, "config").await?;
    config
        .validate()
        .with_context(|| format!("Failed to validate {}", path.display()))?;
    Ok(config)
}

/// Loads a raw schema document; narrowing happens in `compat`.
pub async fn load_schema_document(path: &Path) -> Result<Value> {
    read_document(path, "schema").await
}
