//! Progress collection across several exams.
//!
//! Fetches the attempts for each requested exam concurrently, retries
//! transient backend failures, and summarizes each exam independently. A
//! failed exam becomes an entry with an error; it never aborts the run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::error::ClientError;
use crate::model::{AttemptRecord, ExamInfo};
use crate::report::{ExamProgressEntry, ProgressReport};
use crate::statistics::{summarize_with, StatsConfig};
use crate::traits::AttemptSource;

/// Configuration for [`collect_progress`].
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Maximum concurrent requests.
    pub parallelism: usize,
    /// Retries on transient backend errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles after each one.
    pub retry_delay: Duration,
    /// Target percentage attached to every summary.
    pub target: Option<f64>,
    /// Aggregator settings.
    pub stats: StatsConfig,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            target: None,
            stats: StatsConfig::default(),
        }
    }
}

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);
/// Longest server-requested wait that is honoured.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Fetch and summarize attempts for every exam in `exams`.
pub async fn collect_progress(
    source: Arc<dyn AttemptSource>,
    student_id: &str,
    exams: &[ExamInfo],
    config: &ProgressConfig,
) -> ProgressReport {
    let start = Instant::now();
    let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
    let mut futures = FuturesUnordered::new();

    for (index, exam) in exams.iter().enumerate() {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        let student_id = student_id.to_string();
        let exam_id = exam.id.clone();
        let config = config.clone();

        futures.push(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => fetch_with_retry(source.as_ref(), &student_id, &exam_id, &config).await,
                Err(_) => Err(anyhow::anyhow!("semaphore closed")),
            };
            (index, result)
        });
    }

    let mut slots: Vec<Option<ExamProgressEntry>> = vec![None; exams.len()];
    while let Some((index, result)) = futures.next().await {
        let exam = &exams[index];
        let entry = match result {
            Ok(attempts) => {
                tracing::debug!(exam = %exam.id, attempts = attempts.len(), "fetched attempts");
                ExamProgressEntry {
                    exam_id: exam.id.clone(),
                    exam_title: exam.title.clone(),
                    summary: summarize_with(&attempts, config.target, &config.stats),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("attempts for exam {} could not be fetched: {e:#}", exam.id);
                ExamProgressEntry {
                    exam_id: exam.id.clone(),
                    exam_title: exam.title.clone(),
                    summary: summarize_with(&[], config.target, &config.stats),
                    error: Some(format!("{e:#}")),
                }
            }
        };
        slots[index] = Some(entry);
    }

    ProgressReport {
        id: Uuid::new_v4(),
        created_at: chrono::Utc::now(),
        student_id: student_id.to_string(),
        entries: slots.into_iter().flatten().collect(),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Fetch one exam's attempts, retrying transient failures with exponential
/// backoff. Errors that are not a [`ClientError`] are treated as permanent.
pub async fn fetch_with_retry(
    source: &dyn AttemptSource,
    student_id: &str,
    exam_id: &str,
    config: &ProgressConfig,
) -> anyhow::Result<Vec<AttemptRecord>> {
    let mut retry_delay = config.retry_delay.min(MAX_RETRY_DELAY);
    let mut retry = 0u32;

    loop {
        let err = match source.fetch_attempts(student_id, exam_id).await {
            Ok(attempts) => return Ok(attempts),
            Err(e) => e,
        };

        let Some(client_err) = err.downcast_ref::<ClientError>() else {
            return Err(err);
        };
        if client_err.is_permanent() || retry >= config.max_retries {
            return Err(err);
        }

        let wait = client_err
            .retry_after_ms()
            .map(|ms| Duration::from_millis(ms).min(MAX_RETRY_AFTER))
            .unwrap_or(retry_delay);
        retry += 1;
        tracing::debug!(exam = exam_id, retry, "retrying after {}ms: {client_err}", wait.as_millis());
        tokio::time::sleep(wait).await;
        retry_delay = retry_delay.saturating_mul(2).min(MAX_RETRY_DELAY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::model::{EnrolledCourse, Trend};

    /// Serves canned attempts; exams listed in `failures` fail that many
    /// times with the given error before succeeding.
    struct ScriptedSource {
        attempts: HashMap<String, Vec<AttemptRecord>>,
        failures: Mutex<HashMap<String, (u32, fn() -> ClientError)>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(attempts: HashMap<String, Vec<AttemptRecord>>) -> Self {
            Self {
                attempts,
                failures: Mutex::new(HashMap::new()),
                calls: AtomicU32::new(0),
            }
        }

        fn failing(self, exam_id: &str, times: u32, err: fn() -> ClientError) -> Self {
            self.failures
                .lock()
                .unwrap()
                .insert(exam_id.to_string(), (times, err));
            self
        }
    }

    #[async_trait]
    impl AttemptSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_attempts(
            &self,
            _student_id: &str,
            exam_id: &str,
        ) -> anyhow::Result<Vec<AttemptRecord>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if let Some((remaining, make_err)) = self.failures.lock().unwrap().get_mut(exam_id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err((*make_err)().into());
                }
            }
            Ok(self.attempts.get(exam_id).cloned().unwrap_or_default())
        }

        async fn fetch_courses(&self, _student_id: &str) -> anyhow::Result<Vec<EnrolledCourse>> {
            Ok(vec![])
        }

        async fn fetch_exams(&self, _course_id: &str) -> anyhow::Result<Vec<ExamInfo>> {
            Ok(vec![])
        }
    }

    fn pct(minutes: i64, percentage: f64) -> AttemptRecord {
        AttemptRecord {
            submitted_at: chrono::DateTime::from_timestamp(1_700_000_000 + minutes * 60, 0),
            percentage: Some(percentage),
            ..Default::default()
        }
    }

    fn fast_config() -> ProgressConfig {
        ProgressConfig {
            retry_delay: Duration::ZERO,
            target: Some(70.0),
            ..Default::default()
        }
    }

    fn sample_attempts() -> HashMap<String, Vec<AttemptRecord>> {
        let mut attempts = HashMap::new();
        attempts.insert(
            "1".to_string(),
            vec![pct(0, 40.0), pct(1, 55.0), pct(2, 72.0)],
        );
        attempts.insert("2".to_string(), vec![pct(0, 90.0), pct(1, 60.0)]);
        attempts
    }

    #[tokio::test]
    async fn entries_follow_request_order() {
        let source: Arc<dyn AttemptSource> = Arc::new(ScriptedSource::new(sample_attempts()));
        let exams = vec![ExamInfo::from_id("2"), ExamInfo::from_id("1"), ExamInfo::from_id("3")];

        let report = collect_progress(source, "42", &exams, &fast_config()).await;

        let ids: Vec<&str> = report.entries.iter().map(|e| e.exam_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
        assert_eq!(report.entries[0].summary.trend, Some(Trend::Declining));
        assert_eq!(report.entries[1].summary.best, Some(72.0));
        assert_eq!(report.entries[1].summary.meets_target(), Some(true));
        assert_eq!(report.entries[2].summary.trials, 0);
        assert_eq!(report.student_id, "42");
    }

    #[tokio::test]
    async fn transient_errors_are_retried() {
        let source = Arc::new(
            ScriptedSource::new(sample_attempts())
                .failing("1", 2, || ClientError::Timeout(30)),
        );
        let shared: Arc<dyn AttemptSource> = source.clone();

        let report = collect_progress(shared, "42", &[ExamInfo::from_id("1")], &fast_config()).await;

        assert!(report.entries[0].error.is_none());
        assert_eq!(report.entries[0].summary.trials, 3);
        assert_eq!(source.calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let source = Arc::new(
            ScriptedSource::new(sample_attempts())
                .failing("1", 5, || ClientError::NotFound("exam 1".into())),
        );
        let shared: Arc<dyn AttemptSource> = source.clone();
        let exams = vec![ExamInfo::from_id("1"), ExamInfo::from_id("2")];

        let report = collect_progress(shared, "42", &exams, &fast_config()).await;

        assert!(report.entries[0].error.as_deref().unwrap().contains("not found"));
        assert_eq!(report.entries[0].summary.trials, 0);
        assert!(report.entries[1].error.is_none());
        // one call for exam 1, one for exam 2
        assert_eq!(source.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn retries_give_up_after_limit() {
        let source = Arc::new(
            ScriptedSource::new(sample_attempts())
                .failing("1", 10, || ClientError::NetworkError("reset".into())),
        );
        let config = ProgressConfig {
            max_retries: 2,
            ..fast_config()
        };

        let err = fetch_with_retry(source.as_ref(), "42", "1", &config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("network error"));
        assert_eq!(source.calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_delays_are_capped() {
        let source = ScriptedSource::new(sample_attempts())
            .failing("1", 1, || ClientError::NetworkError("reset".into()))
            .failing("2", 1, || ClientError::RateLimited {
                retry_after_ms: u64::MAX,
            });
        let config = ProgressConfig {
            retry_delay: Duration::MAX,
            max_retries: 3,
            ..fast_config()
        };

        let start = tokio::time::Instant::now();
        let first = fetch_with_retry(&source, "42", "1", &config).await.unwrap();
        assert_eq!(first.len(), 3);
        let waited = start.elapsed();
        assert!(waited >= MAX_RETRY_DELAY && waited < MAX_RETRY_DELAY + Duration::from_secs(1));

        let start = tokio::time::Instant::now();
        let second = fetch_with_retry(&source, "42", "2", &config).await.unwrap();
        assert_eq!(second.len(), 2);
        let waited = start.elapsed();
        assert!(waited >= MAX_RETRY_AFTER && waited < MAX_RETRY_AFTER + Duration::from_secs(1));
    }
}
