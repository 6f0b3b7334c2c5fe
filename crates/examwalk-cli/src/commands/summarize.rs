//! The `examwalk summarize` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

use examwalk_client::config::load_config_from;
use examwalk_core::model::ExamProgressSummary;
use examwalk_core::normalize::attempts_from_body;
use examwalk_core::statistics::summarize_with;

use super::{check_target, pct};

pub fn execute(
    attempts_path: PathBuf,
    target: Option<f64>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let target = target.or(config.target_percentage);
    check_target(target)?;

    let content = std::fs::read_to_string(&attempts_path)
        .with_context(|| format!("failed to read {}", attempts_path.display()))?;
    let body: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", attempts_path.display()))?;

    let records = attempts_from_body(&body);
    let inconsistent = records.iter().filter(|r| !r.is_consistent()).count();
    if inconsistent > 0 {
        tracing::warn!("{inconsistent} attempt(s) have answer counts that do not add up");
    }

    let summary = summarize_with(&records, target, &config.stats);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => print_text(&summary),
    }

    Ok(())
}

fn print_text(summary: &ExamProgressSummary) {
    println!("Trials:   {}", summary.trials);
    println!("Best:     {}", pct(summary.best));
    println!("Average:  {}", pct(summary.average));
    if let Some(secs) = summary.average_time_sec {
        println!("Avg time: {:.0}s", secs);
    }

    let last5 = if summary.last5.is_empty() {
        "-".to_string()
    } else {
        summary
            .last5
            .iter()
            .map(|p| format!("{p:.0}"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("Last 5:   {last5}");

    match summary.trend {
        Some(trend) => println!("Trend:    {trend}"),
        None => println!("Trend:    -"),
    }

    if let Some(target) = summary.target {
        let status = match summary.meets_target() {
            Some(true) => "met",
            Some(false) => "not met",
            None => "no attempts",
        };
        println!("Target:   {target:.1}% ({status})");
    }
}
