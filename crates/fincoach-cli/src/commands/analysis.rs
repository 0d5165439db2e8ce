//! Snapshot, classification and rule command implementations

use anyhow::{Context, Result};
use fincoach_core::advisor::RiskLevel;
use fincoach_core::{analyze, classify, AdvisorConfig, RuleOutput, Severity};

use super::{load_inputs, truncate};
use crate::cli::InputArgs;

/// Print the spending snapshot as pretty JSON
pub fn cmd_analyze(args: &InputArgs) -> Result<()> {
    let inputs = load_inputs(args)?;
    let snapshot = analyze(&inputs.transactions, &inputs.profile, inputs.now);

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Print the classification bundle for a question
pub fn cmd_classify(question: &str) -> Result<()> {
    let bundle = classify(question);
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}

/// Evaluate the rule set against the input files
pub fn cmd_rules(args: &InputArgs, json: bool) -> Result<()> {
    let inputs = load_inputs(args)?;
    let config = AdvisorConfig::load().context("Failed to load advisor config")?;

    let snapshot = analyze(&inputs.transactions, &inputs.profile, inputs.now);
    let output = config
        .rule_engine()
        .apply(&snapshot, &inputs.profile, inputs.budgets.as_deref());

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", rules_report(&output));
    }
    Ok(())
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🚨",
        Severity::High => "⚠️ ",
        Severity::Medium => "🔸",
        Severity::Low => "🔹",
    }
}

/// Human-readable summary of a rule evaluation
pub fn rules_report(output: &RuleOutput) -> String {
    let mut out = String::new();
    let risk = RiskLevel::from_health_score(output.health_score);

    out.push_str(&format!(
        "📊 Financial health: {}/100 ({} risk)\n",
        output.health_score, risk
    ));
    out.push_str("   ─────────────────────────────\n");

    if output.alerts.is_empty() {
        out.push_str("\n✅ No alerts.\n");
    } else {
        out.push_str(&format!("\nAlerts ({}):\n", output.alerts.len()));
        for alert in &output.alerts {
            out.push_str(&format!(
                "  {} [{:<8}] {}\n",
                severity_icon(alert.severity),
                alert.severity.as_str(),
                alert.message
            ));
        }
    }

    if !output.insights.is_empty() {
        out.push_str(&format!("\nInsights ({}):\n", output.insights.len()));
        for insight in &output.insights {
            out.push_str(&format!("  • {}\n", insight));
        }
    }

    if !output.recommendations.is_empty() {
        out.push_str(&format!(
            "\nRecommendations ({}):\n",
            output.recommendations.len()
        ));
        for rec in &output.recommendations {
            out.push_str(&format!(
                "  [{}] {} - {}\n",
                rec.priority,
                rec.action,
                truncate(&rec.detail, 100)
            ));
        }
    }

    out
}
