use anyhow::Result;
use schemaprompt_e2e::fixture_path;
use schemaprompt_engine::compat::{self, CompatibilityChecker, DEFAULT_MAX_DEPTH};
use schemaprompt_engine::config::load_schema_document;
use schemaprompt_engine::interaction::mocks::{ScriptedAnswer, ScriptedInteraction};
use schemaprompt_engine::{EngineError, IncompatibleReason, Session};
use serde_json::json;

#[tokio::test]
async fn test_five_levels_are_accepted() -> Result<()> {
    let schema = load_schema_document(&fixture_path("deepest_allowed.schema.json")).await?;
    assert!(compat::is_compatible(&schema, DEFAULT_MAX_DEPTH));

    let ui = ScriptedInteraction::with_answers([
        ScriptedAnswer::text("bottom"),
        ScriptedAnswer::YesNo(true),
    ]);
    let value = Session::new(&ui).run(&schema, None).await?;
    assert_eq!(
        value,
        json!({ "level1": { "level2": { "level3": { "level4": { "level5": "bottom" } } } } })
    );
    assert_eq!(ui.prompts()[0].1, "          level5: ");
    Ok(())
}

#[tokio::test]
async fn test_six_levels_are_rejected_before_prompting() -> Result<()> {
    let schema = load_schema_document(&fixture_path("too_deep.schema.json")).await?;
    assert!(!compat::is_compatible(&schema, DEFAULT_MAX_DEPTH));

    let err = CompatibilityChecker::new(DEFAULT_MAX_DEPTH)
        .explain(&schema)
        .unwrap_err();
    assert_eq!(err.path, "$.level1.level2.level3.level4.level5");
    assert_eq!(err.reason, IncompatibleReason::DepthExceeded { max_depth: 5 });

    let ui = ScriptedInteraction::with_answers([ScriptedAnswer::text("never asked")]);
    let result = Session::new(&ui).run(&schema, None).await;
    assert!(matches!(result, Err(EngineError::Incompatible(_))));
    assert!(ui.recorded().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_array_of_records_is_rejected_before_prompting() -> Result<()> {
    let schema = load_schema_document(&fixture_path("array_of_records.schema.json")).await?;

    let err = CompatibilityChecker::new(DEFAULT_MAX_DEPTH)
        .explain(&schema)
        .unwrap_err();
    assert_eq!(err.path, "$.members[]");
    assert_eq!(
        err.reason,
        IncompatibleReason::UnsupportedArrayElement("record".to_string())
    );

    let ui = ScriptedInteraction::with_answers([ScriptedAnswer::text("never asked")]);
    let result = Session::new(&ui).run(&schema, None).await;
    assert!(matches!(result, Err(EngineError::Incompatible(_))));
    assert_eq!(ui.remaining(), 1);
    Ok(())
}

#[tokio::test]
async fn test_raised_depth_limit_admits_deeper_schema() -> Result<()> {
    let schema = load_schema_document(&fixture_path("too_deep.schema.json")).await?;
    assert!(compat::is_compatible(&schema, 6));
    Ok(())
}
