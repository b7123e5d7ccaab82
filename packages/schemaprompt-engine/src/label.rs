//! Caller-supplied prompt labels that mirror the schema shape.
use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::config::read_document;

/// How a field's prompt should be worded.
///
/// Deserializes from any of:
/// - `"Full name"` → [`LabelSpec::Plain`]
/// - `{"text": "Age", "replaces_default": true}` → [`LabelSpec::Override`]
/// - `{"text": "Address", "children": {...}}` → [`LabelSpec::Nested`]
/// - `{"street": "Street", ...}` → [`LabelSpec::Nested`] without a text
///
/// A map whose only key is `text` (optionally with `replaces_default`) is
/// always read as an override; label a lone `text` field through `children`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawLabel")]
pub enum LabelSpec {
    Plain(String),
    Override { text: String, replaces_default: bool },
    Nested {
        text: Option<String>,
        children: HashMap<String, LabelSpec>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Plain(String),
    Nested(RawNested),
    Override(RawOverride),
    Children(HashMap<String, LabelSpec>),
}

// Both object forms reject extra keys so a record with a field named
// `text` falls through to `Children`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNested {
    #[serde(default)]
    text: Option<String>,
    children: HashMap<String, LabelSpec>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOverride {
    text: String,
    #[serde(default, alias = "replacesDefault")]
    replaces_default: bool,
}

impl From<RawLabel> for LabelSpec {
    fn from(raw: RawLabel) -> Self {
        match raw {
            RawLabel::Plain(text) => LabelSpec::Plain(text),
            RawLabel::Nested(RawNested { text, children }) => LabelSpec::Nested { text, children },
            RawLabel::Override(RawOverride {
                text,
                replaces_default,
            }) => LabelSpec::Override {
                text,
                replaces_default,
            },
            RawLabel::Children(children) => LabelSpec::Nested { text: None, children },
        }
    }
}

impl LabelSpec {
    pub fn plain(text: impl Into<String>) -> Self {
        LabelSpec::Plain(text.into())
    }

    pub fn replacing(text: impl Into<String>) -> Self {
        LabelSpec::Override {
            text: text.into(),
            replaces_default: true,
        }
    }

    pub fn annotated(text: impl Into<String>) -> Self {
        LabelSpec::Override {
            text: text.into(),
            replaces_default: false,
        }
    }

    pub fn nested<I, K>(text: Option<&str>, children: I) -> Self
    where
        I: IntoIterator<Item = (K, LabelSpec)>,
        K: Into<String>,
    {
        LabelSpec::Nested {
            text: text.map(str::to_string),
            children: children.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Display text carried by this label, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            LabelSpec::Plain(text) | LabelSpec::Override { text, .. } => Some(text.as_str()),
            LabelSpec::Nested { text, .. } => text.as_deref(),
        }
    }

    /// Label for one child field of a record; `None` when not supplied.
    pub fn child(&self, name: &str) -> Option<&LabelSpec> {
        match self {
            LabelSpec::Nested { children, .. } => children.get(name),
            _ => None,
        }
    }

    /// Child keys that do not match any of `field_names`.
    pub fn unknown_children<'a>(&'a self, field_names: &[&str]) -> Vec<&'a str> {
        match self {
            LabelSpec::Nested { children, .. } => {
                let mut unknown: Vec<&str> = children
                    .keys()
                    .map(String::as_str)
                    .filter(|k| !field_names.contains(k))
                    .collect();
                unknown.sort_unstable();
                unknown
            }
            _ => Vec::new(),
        }
    }
}

/// Loads a label file, JSON or YAML by extension.
pub async fn load_labels(path: &Path) -> Result<LabelSpec> {
    read_document(path, "labels").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_all_forms() {
        let labels: LabelSpec = serde_json::from_value(json!({
            "name": "Full name",
            "age": { "text": "Age", "replacesDefault": true },
            "bio": { "text": "About you" },
            "address": {
                "text": "Home address",
                "children": { "city": "City" }
            }
        }))
        .unwrap();

        assert_eq!(labels.text(), None);
        assert_eq!(labels.child("name"), Some(&LabelSpec::plain("Full name")));
        assert_eq!(labels.child("age"), Some(&LabelSpec::replacing("Age")));
        assert_eq!(labels.child("bio"), Some(&LabelSpec::annotated("About you")));

        let address = labels.child("address").unwrap();
        assert_eq!(address.text(), Some("Home address"));
        assert_eq!(address.child("city"), Some(&LabelSpec::plain("City")));
        assert_eq!(address.child("zip"), None);
    }

    #[test]
    fn test_field_named_text_keeps_siblings() {
        let labels: LabelSpec = serde_json::from_value(json!({
            "text": "Post body",
            "author": "Written by"
        }))
        .unwrap();

        assert_eq!(labels.text(), None);
        assert_eq!(labels.child("text"), Some(&LabelSpec::plain("Post body")));
        assert_eq!(labels.child("author"), Some(&LabelSpec::plain("Written by")));

        let with_flag: LabelSpec = serde_json::from_value(json!({
            "text": { "text": "Body", "replaces_default": true },
            "replaces_default": "Replace?"
        }))
        .unwrap();
        assert_eq!(with_flag.child("text"), Some(&LabelSpec::replacing("Body")));
        assert_eq!(with_flag.child("replaces_default"), Some(&LabelSpec::plain("Replace?")));
    }

    #[test]
    fn test_unknown_children_are_reported() {
        let labels = LabelSpec::nested(
            None,
            [("name", LabelSpec::plain("Name")), ("nmae", LabelSpec::plain("Typo"))],
        );
        assert_eq!(labels.unknown_children(&["name", "age"]), vec!["nmae"]);
        assert!(LabelSpec::plain("x").unknown_children(&["a"]).is_empty());
    }

    #[test]
    fn test_plain_has_no_children() {
        assert_eq!(LabelSpec::plain("Tags").child("anything"), None);
    }

    #[tokio::test]
    async fn test_load_yaml_labels() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("labels.yaml");
        tokio::fs::write(&path, "name: Full name\nage:\n  text: Age in years\n")
            .await
            .unwrap();

        let labels = load_labels(&path).await.unwrap();
        assert_eq!(labels.child("name"), Some(&LabelSpec::plain("Full name")));
        assert_eq!(labels.child("age"), Some(&LabelSpec::annotated("Age in years")));
    }
}
