//! Core data model types for examwalk.
//!
//! These are the typed shapes that backend responses are normalized into,
//! plus the derived per-exam progress summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::statistics::compute_percentage;

/// One completed submission of an exam by a student.
///
/// Records are created by the backend when an exam is submitted and are
/// only ever read by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Server-side submission time. `None` only for malformed responses.
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Number of questions in the attempt.
    #[serde(default)]
    pub total_questions: u32,
    /// Questions answered correctly.
    #[serde(default)]
    pub correct_count: u32,
    /// Questions answered incorrectly.
    #[serde(default)]
    pub wrong_count: u32,
    /// Questions left unanswered.
    #[serde(default)]
    pub no_answer_count: u32,
    /// Wall-clock time the student spent, in seconds.
    #[serde(default)]
    pub total_time_sec: Option<u64>,
    /// Time allotted for the exam, in seconds.
    #[serde(default)]
    pub exam_time_sec: Option<u64>,
    /// Percentage supplied by the server, if any.
    #[serde(default)]
    pub percentage: Option<f64>,
    /// Raw obtained score, used when `percentage` is absent.
    #[serde(default)]
    pub obtained_score: Option<f64>,
    /// Raw maximum score, used when `percentage` is absent.
    #[serde(default)]
    pub total_score: Option<f64>,
}

impl AttemptRecord {
    /// The percentage for this attempt, preferring the server-supplied value
    /// and falling back to `obtained_score / total_score`.
    pub fn resolved_percentage(&self) -> Option<f64> {
        match self.percentage {
            Some(p) if p.is_finite() => Some(p),
            _ => match (self.obtained_score, self.total_score) {
                (Some(obtained), Some(total)) => compute_percentage(obtained, total),
                _ => None,
            },
        }
    }

    /// Whether correct + wrong + unanswered adds up to `total_questions`.
    ///
    /// Advisory only; nothing in the aggregator depends on it.
    pub fn is_consistent(&self) -> bool {
        let answered = u64::from(self.correct_count)
            + u64::from(self.wrong_count)
            + u64::from(self.no_answer_count);
        answered == u64::from(self.total_questions)
    }
}

/// Qualitative direction of recent performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Flat,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => write!(f, "improving"),
            Trend::Declining => write!(f, "declining"),
            Trend::Flat => write!(f, "flat"),
        }
    }
}

impl FromStr for Trend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "improving" | "up" => Ok(Trend::Improving),
            "declining" | "down" => Ok(Trend::Declining),
            "flat" | "steady" => Ok(Trend::Flat),
            other => Err(format!("unknown trend: {other}")),
        }
    }
}

/// Derived statistics for one student on one exam.
///
/// Recomputed from the attempt list on every view; never sent back to the
/// backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamProgressSummary {
    /// Number of attempts.
    pub trials: usize,
    /// Highest resolved percentage.
    pub best: Option<f64>,
    /// Percentages of the most recent attempts, most recent first.
    pub last5: Vec<f64>,
    /// Direction of recent performance; `None` with fewer than two points.
    pub trend: Option<Trend>,
    /// Externally supplied threshold, for display comparison only.
    #[serde(default)]
    pub target: Option<f64>,
    /// Mean resolved percentage, one decimal place.
    #[serde(default)]
    pub average: Option<f64>,
    /// Mean time spent per attempt, over attempts that report it.
    #[serde(default)]
    pub average_time_sec: Option<f64>,
}

impl ExamProgressSummary {
    /// `Some(best >= target)` when both are known.
    pub fn meets_target(&self) -> Option<bool> {
        match (self.best, self.target) {
            (Some(best), Some(target)) => Some(best >= target),
            _ => None,
        }
    }
}

/// A course the student is enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledCourse {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// An exam as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamInfo {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
}

impl ExamInfo {
    /// An exam known only by id.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            category: None,
            course_id: None,
        }
    }

    /// Title for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// A question from the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_display_and_parse() {
        assert_eq!(Trend::Improving.to_string(), "improving");
        assert_eq!(Trend::Flat.to_string(), "flat");
        assert_eq!("Declining".parse::<Trend>().unwrap(), Trend::Declining);
        assert_eq!("up".parse::<Trend>().unwrap(), Trend::Improving);
        assert!("sideways".parse::<Trend>().is_err());
    }

    #[test]
    fn resolved_percentage_prefers_server_value() {
        let record = AttemptRecord {
            percentage: Some(64.5),
            obtained_score: Some(9.0),
            total_score: Some(10.0),
            ..Default::default()
        };
        assert_eq!(record.resolved_percentage(), Some(64.5));
    }

    #[test]
    fn resolved_percentage_from_raw_scores() {
        let record = AttemptRecord {
            obtained_score: Some(7.0),
            total_score: Some(10.0),
            ..Default::default()
        };
        assert_eq!(record.resolved_percentage(), Some(70.0));
    }

    #[test]
    fn resolved_percentage_unresolvable() {
        let zero_total = AttemptRecord {
            obtained_score: Some(5.0),
            total_score: Some(0.0),
            ..Default::default()
        };
        assert_eq!(zero_total.resolved_percentage(), None);
        assert_eq!(AttemptRecord::default().resolved_percentage(), None);

        let nan = AttemptRecord {
            percentage: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(nan.resolved_percentage(), None);
    }

    #[test]
    fn consistency_check() {
        let ok = AttemptRecord {
            total_questions: 10,
            correct_count: 6,
            wrong_count: 3,
            no_answer_count: 1,
            ..Default::default()
        };
        assert!(ok.is_consistent());

        let off = AttemptRecord {
            total_questions: 10,
            correct_count: 6,
            ..Default::default()
        };
        assert!(!off.is_consistent());
    }

    #[test]
    fn meets_target_needs_both_values() {
        let summary = ExamProgressSummary {
            trials: 2,
            best: Some(72.0),
            last5: vec![72.0, 60.0],
            trend: Some(Trend::Improving),
            target: Some(70.0),
            average: Some(66.0),
            average_time_sec: None,
        };
        assert_eq!(summary.meets_target(), Some(true));

        let no_target = ExamProgressSummary {
            target: None,
            ..summary.clone()
        };
        assert_eq!(no_target.meets_target(), None);

        let below = ExamProgressSummary {
            best: Some(69.0),
            ..summary
        };
        assert_eq!(below.meets_target(), Some(false));
    }

    #[test]
    fn summary_serializes_trend_lowercase() {
        let summary = ExamProgressSummary {
            trials: 0,
            best: None,
            last5: vec![],
            trend: Some(Trend::Declining),
            target: None,
            average: None,
            average_time_sec: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["trend"], "declining");
        assert_eq!(json["last5"], serde_json::json!([]));
    }
}
