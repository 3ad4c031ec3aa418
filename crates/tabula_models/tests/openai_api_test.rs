//! Live provider tests. Run with `--features api` and `TABULA__LLM__API_KEY` set.

#![cfg(feature = "api")]

use tabula_core::{FieldSpec, LlmConfig};
use tabula_models::{GenerationOverrides, StructuredGenerator};

#[tokio::test]
async fn test_live_structured_generation() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = LlmConfig {
        api_key: std::env::var("TABULA__LLM__API_KEY")?,
        timeout_secs: Some(60),
        ..Default::default()
    };
    let generator = StructuredGenerator::from_config(&config)?;

    let result = generator
        .generate(
            "Who invented the telephone?",
            &[FieldSpec::string("inventorFullName"), FieldSpec::number("inventorBirthYear")],
            None,
            &GenerationOverrides::default(),
        )
        .await?;

    assert!(result.structured_data().is_object());
    assert!(*result.usage().total_tokens() > 0);
    Ok(())
}
