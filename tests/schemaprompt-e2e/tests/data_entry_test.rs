use anyhow::Result;
use schemaprompt_e2e::fixture_path;
use schemaprompt_engine::Session;
use schemaprompt_engine::config::{EngineConfig, load_schema_document};
use schemaprompt_engine::interaction::mocks::{PromptKind, ScriptedAnswer, ScriptedInteraction};
use schemaprompt_engine::label::load_labels;
use serde_json::json;

const CONFIRM: &str = "Submit this data?";

#[tokio::test]
async fn test_profile_session_end_to_end() -> Result<()> {
    let schema = load_schema_document(&fixture_path("profile.schema.json")).await?;
    let labels = load_labels(&fixture_path("profile.labels.json")).await?;

    let ui = ScriptedInteraction::with_answers([
        ScriptedAnswer::text("Ada"),
        ScriptedAnswer::number(36),
        ScriptedAnswer::text("math"),
        ScriptedAnswer::text("logic"),
        ScriptedAnswer::Cancel,
        ScriptedAnswer::YesNo(true),
    ]);
    let value = Session::new(&ui).run(&schema, Some(&labels)).await?;

    assert_eq!(
        serde_json::to_string(&value)?,
        r#"{"name":"Ada","age":36,"tags":["math","logic"]}"#
    );
    let confirmations = ui
        .prompts()
        .into_iter()
        .filter(|(kind, message)| *kind == PromptKind::YesNo && message == CONFIRM)
        .count();
    assert_eq!(confirmations, 1);

    let messages: Vec<String> = ui.prompts().into_iter().map(|(_, m)| m).collect();
    assert_eq!(messages[0], "  Full name: ");
    assert_eq!(messages[1], "  Age in years: ");
    assert_eq!(
        ui.markers(),
        vec![
            "{",
            "  [",
            "    Press Ctrl+C to Finalize | tags: ",
            "  ]",
            "}",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_rejected_answers_are_reprompted() -> Result<()> {
    let schema = load_schema_document(&fixture_path("profile.schema.json")).await?;

    let ui = ScriptedInteraction::with_answers([
        ScriptedAnswer::text(""),
        ScriptedAnswer::text("Ada"),
        ScriptedAnswer::number(-1),
        ScriptedAnswer::number(200),
        ScriptedAnswer::number(36),
        ScriptedAnswer::Cancel,
    ]);
    let config = EngineConfig::default().with_confirmation(false);
    let value = Session::new(&ui).with_config(config).run(&schema, None).await?;

    assert_eq!(value, json!({ "name": "Ada", "age": 36, "tags": [] }));
    assert_eq!(ui.rejections().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_yaml_article_with_nested_labels() -> Result<()> {
    let schema = load_schema_document(&fixture_path("article.schema.yaml")).await?;
    let labels = load_labels(&fixture_path("article.labels.yaml")).await?;

    let ui = ScriptedInteraction::with_answers([
        ScriptedAnswer::text("Hello"),
        ScriptedAnswer::text("# Hi\n\nFirst post."),
        ScriptedAnswer::choice("review"),
        ScriptedAnswer::text("ada"),
        ScriptedAnswer::text("@ada"),
        ScriptedAnswer::YesNo(true),
        ScriptedAnswer::number(4),
        ScriptedAnswer::number(9),
        ScriptedAnswer::number(5),
        ScriptedAnswer::Cancel,
        ScriptedAnswer::YesNo(true),
    ]);
    let value = Session::new(&ui).run(&schema, Some(&labels)).await?;

    assert_eq!(
        value,
        json!({
            "title": "Hello",
            "body": "# Hi\n\nFirst post.",
            "status": "review",
            "author": { "handle": "@ada", "verified": true },
            "ratings": [4, 5]
        })
    );
    assert_eq!(ui.rejections().len(), 2);
    assert_eq!(ui.prompt_count(PromptKind::LongText), 1);

    let messages: Vec<String> = ui.prompts().into_iter().map(|(_, m)| m).collect();
    assert_eq!(
        &messages[..6],
        &[
            "  Headline: ",
            "  Article body (String): ",
            "  Status (Enum): ",
            "    Handle (starts with @): ",
            "    verified: ",
            "    ",
        ]
    );
    assert!(ui.markers().contains(&"  Author: {".to_string()));
    assert!(
        ui.markers()
            .contains(&"    Press Ctrl+C to Finalize | Ratings: ".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_declined_submission_starts_over() -> Result<()> {
    let schema = load_schema_document(&fixture_path("profile.schema.json")).await?;

    let ui = ScriptedInteraction::with_answers([
        ScriptedAnswer::text("Ada"),
        ScriptedAnswer::number(35),
        ScriptedAnswer::Cancel,
        ScriptedAnswer::YesNo(false),
        ScriptedAnswer::text("Ada Lovelace"),
        ScriptedAnswer::number(36),
        ScriptedAnswer::text("math"),
        ScriptedAnswer::Cancel,
        ScriptedAnswer::YesNo(true),
    ]);
    let value = Session::new(&ui).run(&schema, None).await?;

    assert_eq!(
        value,
        json!({ "name": "Ada Lovelace", "age": 36, "tags": ["math"] })
    );
    assert_eq!(ui.steps_started("Data entry"), 2);
    assert_eq!(ui.remaining(), 0);
    Ok(())
}
