//! The `examwalk compare` command.

use std::path::PathBuf;

use anyhow::Result;

use examwalk_core::report::ProgressReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = ProgressReport::load_json(&baseline_path)?;
    let current = ProgressReport::load_json(&current_path)?;

    if baseline.student_id != current.student_id {
        tracing::warn!(
            "comparing reports of different students ({} vs {})",
            baseline.student_id,
            current.student_id
        );
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            if !report.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &report.regressions {
                    println!(
                        "  {} {:.1}% -> {:.1}% ({:+.1})",
                        r.label(),
                        r.baseline_best,
                        r.current_best,
                        r.delta
                    );
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!(
                        "  {} {:.1}% -> {:.1}% ({:+.1})",
                        i.label(),
                        i.baseline_best,
                        i.current_best,
                        i.delta
                    );
                }
            }

            if report.new_exams > 0 {
                println!("\n{} new exam(s)", report.new_exams);
            }
            if report.removed_exams > 0 {
                println!("{} removed exam(s)", report.removed_exams);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
