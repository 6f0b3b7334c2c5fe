//! Exam attempt aggregation.
//!
//! Pure functions turning a list of [`AttemptRecord`]s for one student on one
//! exam into an [`ExamProgressSummary`]. Nothing here does I/O or keeps
//! state, and malformed records never cause an error: they simply contribute
//! no percentage.

use serde::{Deserialize, Serialize};

use crate::model::{AttemptRecord, ExamProgressSummary, Trend};

/// Number of recent attempts shown in the summary.
pub const RECENT_WINDOW: usize = 5;

/// Minimum difference between half-means, in percentage points, for a
/// trend to count as improving or declining.
pub const TREND_EPSILON: f64 = 1.0;

/// What to do with a recent attempt whose percentage cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Keep the slot and show it as 0. The trend still ignores it.
    #[default]
    ZeroFill,
    /// Drop the attempt before taking the recent window.
    Skip,
}

/// Tunables for [`summarize_with`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// How many recent attempts to keep, at most [`RECENT_WINDOW`].
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    /// Trend threshold in percentage points.
    #[serde(default = "default_trend_epsilon")]
    pub trend_epsilon: f64,
    /// Policy for recent attempts without a percentage.
    #[serde(default)]
    pub unresolved: UnresolvedPolicy,
}

fn default_recent_window() -> usize {
    RECENT_WINDOW
}

fn default_trend_epsilon() -> f64 {
    TREND_EPSILON
}

impl StatsConfig {
    /// `recent_window` clamped to `1..=RECENT_WINDOW`.
    pub fn window(&self) -> usize {
        self.recent_window.clamp(1, RECENT_WINDOW)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            recent_window: RECENT_WINDOW,
            trend_epsilon: TREND_EPSILON,
            unresolved: UnresolvedPolicy::ZeroFill,
        }
    }
}

/// Compute a whole-number percentage from raw scores.
///
/// Returns `None` when `total` is not strictly positive or either input is
/// not finite. Rounds half away from zero, so `1/3` gives `33` and `1/8`
/// gives `13`.
pub fn compute_percentage(obtained: f64, total: f64) -> Option<f64> {
    if !obtained.is_finite() || !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some((obtained / total * 100.0).round())
}

/// Number of attempts.
pub fn compute_trials(records: &[AttemptRecord]) -> usize {
    records.len()
}

/// Highest resolved percentage, or `None` if no attempt has one.
pub fn compute_best(records: &[AttemptRecord]) -> Option<f64> {
    records
        .iter()
        .filter_map(AttemptRecord::resolved_percentage)
        .fold(None, |best: Option<f64>, p| {
            Some(best.map_or(p, |b| b.max(p)))
        })
}

/// Percentages of the five most recent attempts, most recent first.
///
/// Unresolved percentages are shown as 0 so the slots stay aligned with
/// the attempts they came from.
pub fn compute_last5(records: &[AttemptRecord]) -> Vec<f64> {
    recent_percentages(records, RECENT_WINDOW, UnresolvedPolicy::ZeroFill)
}

/// Percentages of the `window` most recent attempts, most recent first.
///
/// Attempts without a submission time sort as the oldest; attempts with
/// equal times keep their input order.
pub fn recent_percentages(
    records: &[AttemptRecord],
    window: usize,
    policy: UnresolvedPolicy,
) -> Vec<f64> {
    recent_attempts(records, window, policy)
        .into_iter()
        .map(|p| p.unwrap_or(0.0))
        .collect()
}

/// Resolved percentages of the `window` most recent attempts, newest first.
/// `None` marks an attempt kept in the window without a percentage.
fn recent_attempts(
    records: &[AttemptRecord],
    window: usize,
    policy: UnresolvedPolicy,
) -> Vec<Option<f64>> {
    let mut ordered: Vec<&AttemptRecord> = records.iter().collect();
    ordered.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

    ordered
        .into_iter()
        .map(AttemptRecord::resolved_percentage)
        .filter(|p| p.is_some() || policy == UnresolvedPolicy::ZeroFill)
        .take(window)
        .collect()
}

/// Classify the direction of `recent`, given most recent first.
pub fn compute_trend(recent: &[f64]) -> Option<Trend> {
    compute_trend_with(recent, TREND_EPSILON)
}

/// Classify the direction of `recent` with a custom threshold.
///
/// The latest half of the points is compared against the earliest half; for
/// an odd count the middle point is left out of both. A difference of more
/// than `epsilon` between the half-means is a trend, anything else is flat.
pub fn compute_trend_with(recent: &[f64], epsilon: f64) -> Option<Trend> {
    let n = recent.len();
    if n < 2 {
        return None;
    }

    let half = n / 2;
    let latest = mean(&recent[..half])?;
    let earliest = mean(&recent[n - half..])?;
    let delta = latest - earliest;

    Some(if delta > epsilon {
        Trend::Improving
    } else if delta < -epsilon {
        Trend::Declining
    } else {
        Trend::Flat
    })
}

/// Mean of all resolved percentages, rounded to one decimal place.
pub fn compute_average(records: &[AttemptRecord]) -> Option<f64> {
    let resolved: Vec<f64> = records
        .iter()
        .filter_map(AttemptRecord::resolved_percentage)
        .collect();
    mean(&resolved).map(|m| (m * 10.0).round() / 10.0)
}

/// Mean time spent, over attempts that report a duration.
pub fn compute_average_time(records: &[AttemptRecord]) -> Option<f64> {
    let times: Vec<f64> = records
        .iter()
        .filter_map(|r| r.total_time_sec)
        .map(|t| t as f64)
        .collect();
    mean(&times)
}

/// Build the full summary with default settings.
pub fn summarize(records: &[AttemptRecord], target: Option<f64>) -> ExamProgressSummary {
    summarize_with(records, target, &StatsConfig::default())
}

/// Build the full summary.
pub fn summarize_with(
    records: &[AttemptRecord],
    target: Option<f64>,
    config: &StatsConfig,
) -> ExamProgressSummary {
    let recent = recent_attempts(records, config.window(), config.unresolved);
    // zero-filled slots are display only
    let scored: Vec<f64> = recent.iter().flatten().copied().collect();
    let trend = compute_trend_with(&scored, config.trend_epsilon);
    let last5 = recent.into_iter().map(|p| p.unwrap_or(0.0)).collect();

    ExamProgressSummary {
        trials: compute_trials(records),
        best: compute_best(records),
        last5,
        trend,
        target,
        average: compute_average(records),
        average_time_sec: compute_average_time(records),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
