pub mod compare;
pub mod courses;
pub mod init;
pub mod progress;
pub mod questions;
pub mod summarize;

use anyhow::Result;

use examwalk_client::ExamWalkConfig;

/// Student id from the flag, falling back to the config.
pub(crate) fn resolve_student(flag: Option<String>, config: &ExamWalkConfig) -> Result<String> {
    flag.or_else(|| config.student_id.clone())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!("no student id. Pass --student or set `student_id` in examwalk.toml")
        })
}

/// Reject a target percentage outside `0..=100`.
pub(crate) fn check_target(target: Option<f64>) -> Result<()> {
    if let Some(t) = target {
        anyhow::ensure!(
            (0.0..=100.0).contains(&t),
            "target must be between 0 and 100, got {t}"
        );
    }
    Ok(())
}

/// Format an optional percentage for tables, `-` when absent.
pub(crate) fn pct(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}%"))
}
