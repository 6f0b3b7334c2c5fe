//! The `examwalk progress` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use examwalk_client::config::load_config_from;
use examwalk_client::create_client;
use examwalk_core::model::ExamInfo;
use examwalk_core::progress::collect_progress;
use examwalk_core::report::ProgressReport;
use examwalk_core::traits::AttemptSource;
use examwalk_report::html::write_html_report;

use super::{check_target, pct, resolve_student};

const DEFAULT_OUTPUT_DIR: &str = "./examwalk-results";

pub async fn execute(
    exams: Option<String>,
    course: Option<String>,
    student: Option<String>,
    target: Option<f64>,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    check_target(target.or(config.target_percentage))?;
    let student_id = resolve_student(student, &config)?;
    let source: Arc<dyn AttemptSource> = Arc::new(create_client(&config)?);

    let exam_list = match (exams, course) {
        (Some(ids), _) => parse_exam_ids(&ids)?,
        (None, Some(course_id)) => source.fetch_exams(&course_id).await?,
        (None, None) => anyhow::bail!("pass --exams <ids> or --course <id>"),
    };

    if exam_list.is_empty() {
        println!("No exams to summarize.");
        return Ok(());
    }

    eprintln!(
        "examwalk v{}: summarizing {} exam(s) for student {}",
        env!("CARGO_PKG_VERSION"),
        exam_list.len(),
        student_id
    );

    let progress_config = config.progress_config(target);
    let report = collect_progress(source, &student_id, &exam_list, &progress_config).await;

    let formats: Vec<&str> = if format == "all" {
        vec!["text", "json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    for fmt in &formats {
        match *fmt {
            "text" => print_summary(&report),
            "json" => match &output {
                Some(dir) => {
                    let path = dir.join(format!("progress-{timestamp}.json"));
                    report.save_json(&path)?;
                    eprintln!("Results saved to: {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&report)?),
            },
            "html" => {
                let dir = output
                    .clone()
                    .unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_DIR).to_path_buf());
                let path = dir.join(format!("progress-{timestamp}.html"));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    let failed = report.failed_entries().count();
    if failed > 0 {
        eprintln!("{failed} exam(s) could not be fetched");
    }
    anyhow::ensure!(
        failed < report.entries.len(),
        "attempts could not be fetched for any exam"
    );

    Ok(())
}

fn parse_exam_ids(ids: &str) -> Result<Vec<ExamInfo>> {
    let exams: Vec<ExamInfo> = ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ExamInfo::from_id)
        .collect();
    anyhow::ensure!(!exams.is_empty(), "--exams must name at least one exam id");
    Ok(exams)
}

fn print_summary(report: &ProgressReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Exam", "Trials", "Best", "Average", "Trend", "Last 5", "Target",
    ]);

    for entry in &report.entries {
        let summary = &entry.summary;
        let last5 = summary
            .last5
            .iter()
            .map(|p| format!("{p:.0}"))
            .collect::<Vec<_>>()
            .join(" ");
        let trend = match (&entry.error, summary.trend) {
            (Some(_), _) => "error".to_string(),
            (None, Some(t)) => t.to_string(),
            (None, None) => "-".to_string(),
        };
        let target = match (summary.target, summary.meets_target()) {
            (Some(t), Some(true)) => format!("{t:.0}% met"),
            (Some(t), Some(false)) => format!("{t:.0}% not met"),
            (Some(t), None) => format!("{t:.0}%"),
            (None, _) => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(entry.display_name()),
            Cell::new(summary.trials),
            Cell::new(pct(summary.best)),
            Cell::new(pct(summary.average)),
            Cell::new(trend),
            Cell::new(last5),
            Cell::new(target),
        ]);
    }

    println!("{table}");
}
