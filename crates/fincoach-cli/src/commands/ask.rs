//! Ask command implementation

use anyhow::{Context, Result};
use fincoach_core::{AIClient, AdviceResponse, AdvisorConfig, AskRequest, InsightPipeline};

use super::load_inputs;
use crate::cli::InputArgs;

/// Hint shown when no generation backend is configured.
///
/// `quiet` output (e.g. `--json`) gets no hint so stdout stays parseable.
pub fn backend_tip(has_backend: bool, quiet: bool) -> Option<&'static str> {
    if has_backend || quiet {
        None
    } else {
        Some("   💡 Tip: Set OPENAI_COMPATIBLE_HOST to get generated answers")
    }
}

/// Build the pipeline for the ask command
///
/// `offline` skips backend detection entirely.
pub fn build_pipeline(offline: bool, quiet: bool) -> Result<InsightPipeline> {
    let config = AdvisorConfig::load().context("Failed to load advisor config")?;

    if offline {
        return Ok(InsightPipeline::offline(config));
    }

    let client = AIClient::from_env();
    if let Some(tip) = backend_tip(client.is_some(), quiet) {
        eprintln!("{}", tip);
    }
    Ok(InsightPipeline::new(client, config))
}

/// Run the full pipeline for one question
pub async fn run_ask(
    question: &str,
    args: &InputArgs,
    offline: bool,
    quiet: bool,
) -> Result<AdviceResponse> {
    if question.trim().is_empty() {
        anyhow::bail!("Question must not be empty");
    }

    let inputs = load_inputs(args)?;
    let pipeline = build_pipeline(offline, quiet)?;

    let mut request = AskRequest::new(question, inputs.transactions, inputs.now)
        .with_profile(inputs.profile);
    if let Some(budgets) = inputs.budgets {
        request = request.with_budgets(budgets);
    }

    Ok(pipeline.ask(request).await)
}

pub async fn cmd_ask(question: &str, args: &InputArgs, offline: bool, json: bool) -> Result<()> {
    let response = run_ask(question, args, offline, json).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!();
    println!("{}", response.response);
    println!();
    println!("   ─────────────────────────────");
    if response.fallback {
        println!(
            "   📴 Offline answer ({}), confidence {:.0}%",
            response.strategy,
            response.confidence * 100.0
        );
    } else {
        println!(
            "   🤖 {} ({}), confidence {:.0}%",
            response.model,
            response.strategy,
            response.confidence * 100.0
        );
    }

    Ok(())
}
