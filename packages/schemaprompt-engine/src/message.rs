//! Prompt text construction.
//!
//! Order is fixed: mandatory prefix, then label-vs-default resolution, then
//! indentation. Control hints such as "Press Ctrl+C to Finalize" therefore
//! always read before the field description.
use crate::label::LabelSpec;

pub const DEFAULT_INDENT_UNIT: &str = "  ";
pub const PREFIX_SEPARATOR: &str = " | ";
pub const PROMPT_SUFFIX: &str = ": ";

pub const BOOLEAN_LABEL: &str = "Boolean";
pub const STRING_LABEL: &str = "String";
pub const NUMBER_LABEL: &str = "Number";
pub const ENUM_LABEL: &str = "Enum";
pub const ARRAY_LABEL: &str = "Array of values";
pub const FINALIZE_HINT: &str = "Press Ctrl+C to Finalize";

fn trim_separators(text: &str) -> &str {
    text.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ':' | ';' | ',' | '.' | '|'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFormatter {
    indent_unit: String,
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_INDENT_UNIT)
    }
}

impl MessageFormatter {
    pub fn new(indent_unit: impl Into<String>) -> Self {
        Self {
            indent_unit: indent_unit.into(),
        }
    }

    pub fn indent(&self, depth: usize) -> String {
        self.indent_unit.repeat(depth)
    }

    pub fn format(
        &self,
        depth: usize,
        default_label: &str,
        label: Option<&LabelSpec>,
        mandatory_prefix: Option<&str>,
    ) -> String {
        let default_label = trim_separators(default_label);
        let mut body = String::new();

        if let Some(prefix) = mandatory_prefix {
            body.push_str(trim_separators(prefix));
            body.push_str(PREFIX_SEPARATOR);
        }

        match label {
            None => body.push_str(default_label),
            Some(LabelSpec::Plain(text)) => body.push_str(trim_separators(text)),
            Some(LabelSpec::Override {
                text,
                replaces_default: true,
            }) => body.push_str(trim_separators(text)),
            Some(LabelSpec::Override {
                text,
                replaces_default: false,
            }) => body.push_str(&format!("{} ({default_label})", trim_separators(text))),
            // A record label reaching a leaf still annotates the kind.
            Some(LabelSpec::Nested { text: Some(text), .. }) => {
                body.push_str(&format!("{} ({default_label})", trim_separators(text)))
            }
            Some(LabelSpec::Nested { text: None, .. }) => body.push_str(default_label),
        }

        format!("{}{body}{PROMPT_SUFFIX}", self.indent(depth))
    }

    /// Array element prompts carry no label; the array's own message already did.
    pub fn element(&self, depth: usize) -> String {
        self.indent(depth)
    }

    pub fn open_record(&self, depth: usize, label: Option<&LabelSpec>) -> String {
        match label.and_then(LabelSpec::text).map(trim_separators) {
            Some(text) if !text.is_empty() => format!("{}{text}: {{", self.indent(depth)),
            _ => format!("{}{{", self.indent(depth)),
        }
    }

    pub fn close_record(&self, depth: usize) -> String {
        format!("{}}}", self.indent(depth))
    }

    pub fn open_array(&self, depth: usize) -> String {
        format!("{}[", self.indent(depth))
    }

    pub fn close_array(&self, depth: usize) -> String {
        format!("{}]", self.indent(depth))
    }
}
