//! Progress report types with JSON persistence and snapshot comparison.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ExamProgressSummary;

/// Progress of one student across several exams at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Student the attempts belong to.
    pub student_id: String,
    /// One entry per requested exam, in request order.
    pub entries: Vec<ExamProgressEntry>,
    /// Total wall-clock duration in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
}

/// Summary for a single exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamProgressEntry {
    pub exam_id: String,
    #[serde(default)]
    pub exam_title: Option<String>,
    pub summary: ExamProgressSummary,
    /// Set when the attempts could not be fetched; the summary is then empty.
    #[serde(default)]
    pub error: Option<String>,
}

impl ExamProgressEntry {
    /// Title for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.exam_title.as_deref().unwrap_or(&self.exam_id)
    }
}

impl ProgressReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ProgressReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Entries whose attempts could not be fetched.
    pub fn failed_entries(&self) -> impl Iterator<Item = &ExamProgressEntry> {
        self.entries.iter().filter(|e| e.error.is_some())
    }

    /// Compare best scores against an earlier snapshot.
    ///
    /// `threshold` is in percentage points. Exams without a best score on
    /// either side are counted as new or removed.
    pub fn compare(&self, baseline: &ProgressReport, threshold: f64) -> ProgressComparison {
        let best_map = |report: &ProgressReport| -> HashMap<String, (f64, Option<String>)> {
            report
                .entries
                .iter()
                .filter_map(|e| {
                    e.summary
                        .best
                        .map(|best| (e.exam_id.clone(), (best, e.exam_title.clone())))
                })
                .collect()
        };

        let baseline_best = best_map(baseline);
        let current_best = best_map(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_exams = 0usize;

        for (exam_id, (current, title)) in &current_best {
            let Some((baseline_val, _)) = baseline_best.get(exam_id) else {
                new_exams += 1;
                continue;
            };
            let delta = current - baseline_val;
            let change = ScoreChange {
                exam_id: exam_id.clone(),
                exam_title: title.clone(),
                baseline_best: *baseline_val,
                current_best: *current,
                delta,
            };
            if delta < -threshold {
                regressions.push(change);
            } else if delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_exams = baseline_best
            .keys()
            .filter(|k| !current_best.contains_key(*k))
            .count();

        regressions.sort_by(|a, b| a.exam_id.cmp(&b.exam_id));
        improvements.sort_by(|a, b| a.exam_id.cmp(&b.exam_id));

        ProgressComparison {
            regressions,
            improvements,
            unchanged,
            new_exams,
            removed_exams,
        }
    }
}

/// Result of comparing two progress reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressComparison {
    /// Exams whose best score went down.
    pub regressions: Vec<ScoreChange>,
    /// Exams whose best score went up.
    pub improvements: Vec<ScoreChange>,
    /// Exams with no significant change.
    pub unchanged: usize,
    /// Exams scored now but not in the baseline.
    pub new_exams: usize,
    /// Exams scored in the baseline but not now.
    pub removed_exams: usize,
}

/// A change in best score for one exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub exam_id: String,
    #[serde(default)]
    pub exam_title: Option<String>,
    pub baseline_best: f64,
    pub current_best: f64,
    pub delta: f64,
}

impl ScoreChange {
    /// Title for display, falling back to the id.
    pub fn label(&self) -> &str {
        self.exam_title.as_deref().unwrap_or(&self.exam_id)
    }
}

impl ProgressComparison {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (heading, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {heading}\n\n"));
            md.push_str("| Exam | Baseline | Current | Delta |\n");
            md.push_str("|------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.0}% | {:.0}% | {:+.0} |\n",
                    c.label(),
                    c.baseline_best,
                    c.current_best,
                    c.delta
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
