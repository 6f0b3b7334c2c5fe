//! ExamWalk REST API client.

use std::fmt;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use examwalk_core::model::{AttemptRecord, EnrolledCourse, ExamInfo, Question};
use examwalk_core::normalize::{
    attempts_from_body, courses_from_body, exams_from_body, questions_from_body,
};
use examwalk_core::traits::AttemptSource;

use crate::error::{from_transport, ClientError};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Bearer credential for the backend.
///
/// Passed to [`ExamWalkClient::new`] explicitly; the client never reads a
/// token from the environment on its own.
#[derive(Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("token", &"***").finish()
    }
}

/// Transport options.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout_secs: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Authenticated client for the ExamWalk backend.
pub struct ExamWalkClient {
    base_url: Url,
    credentials: Credentials,
    timeout_secs: u64,
    client: reqwest::Client,
}

/// Error body shape used by the backend (`{"detail": "..."}`).
#[derive(Deserialize)]
struct ApiErrorBody {
    detail: String,
}

impl ExamWalkClient {
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        options: ClientOptions,
    ) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid base URL: {base_url}"))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "base URL cannot carry a path: {base_url}"
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url,
            credentials,
            timeout_secs: options.timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// All attempts of `student_id` on `exam_id`.
    #[instrument(skip(self))]
    pub async fn attempts(
        &self,
        student_id: &str,
        exam_id: &str,
    ) -> Result<Vec<AttemptRecord>, ClientError> {
        let body = self
            .get_json(&["api", "students", student_id, "exams", exam_id, "attempts"])
            .await?;
        Ok(attempts_from_body(&body))
    }

    /// Courses `student_id` is enrolled in.
    #[instrument(skip(self))]
    pub async fn courses(&self, student_id: &str) -> Result<Vec<EnrolledCourse>, ClientError> {
        let body = self
            .get_json(&["api", "students", student_id, "courses"])
            .await?;
        Ok(courses_from_body(&body))
    }

    /// Exams belonging to `course_id`.
    #[instrument(skip(self))]
    pub async fn exams(&self, course_id: &str) -> Result<Vec<ExamInfo>, ClientError> {
        let body = self.get_json(&["api", "courses", course_id, "exams"]).await?;
        let mut exams = exams_from_body(&body);
        for exam in &mut exams {
            exam.course_id.get_or_insert_with(|| course_id.to_string());
        }
        Ok(exams)
    }

    /// Question bank of `exam_id`.
    #[instrument(skip(self))]
    pub async fn questions(&self, exam_id: &str) -> Result<Vec<Question>, ClientError> {
        let body = self
            .get_json(&["api", "exams", exam_id, "questions"])
            .await?;
        Ok(questions_from_body(&body))
    }

    /// Build `<base>/<segments...>/` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments).push("");
        }
        url
    }

    async fn get_json(&self, segments: &[&str]) -> Result<Value, ClientError> {
        let url = self.endpoint(segments);
        tracing::debug!(%url, "GET");

        let response = self
            .client
            .get(url.clone())
            .header("Authorization", format!("Bearer {}", self.credentials.token()))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| from_transport(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
                .saturating_mul(1000);
            return Err(ClientError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::AuthenticationFailed(error_message(body)));
        }
        if status == 404 {
            return Err(ClientError::NotFound(url.path().to_string()));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                status,
                message: error_message(body),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("failed to parse response: {e}")))
    }
}

fn error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.detail)
        .unwrap_or(body)
}

#[async_trait]
impl AttemptSource for ExamWalkClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_attempts(
        &self,
        student_id: &str,
        exam_id: &str,
    ) -> anyhow::Result<Vec<AttemptRecord>> {
        Ok(self.attempts(student_id, exam_id).await?)
    }

    async fn fetch_courses(&self, student_id: &str) -> anyhow::Result<Vec<EnrolledCourse>> {
        Ok(self.courses(student_id).await?)
    }

    async fn fetch_exams(&self, course_id: &str) -> anyhow::Result<Vec<ExamInfo>> {
        Ok(self.exams(course_id).await?)
    }
}
