//! Core trait definitions for attempt sources.
//!
//! Implemented by the HTTP client in `examwalk-client`, and by the mock
//! source used in tests.

use async_trait::async_trait;

use crate::model::{AttemptRecord, EnrolledCourse, ExamInfo};

/// Something that can list a student's exam attempts.
#[async_trait]
pub trait AttemptSource: Send + Sync {
    /// Human-readable source name (e.g. "http").
    fn name(&self) -> &str;

    /// All attempts of `student_id` on `exam_id`, in any order.
    async fn fetch_attempts(
        &self,
        student_id: &str,
        exam_id: &str,
    ) -> anyhow::Result<Vec<AttemptRecord>>;

    /// Courses `student_id` is enrolled in.
    async fn fetch_courses(&self, student_id: &str) -> anyhow::Result<Vec<EnrolledCourse>>;

    /// Exams belonging to `course_id`.
    async fn fetch_exams(&self, course_id: &str) -> anyhow::Result<Vec<ExamInfo>>;
}
