//! Mock attempt source for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use examwalk_core::model::{AttemptRecord, EnrolledCourse, ExamInfo};
use examwalk_core::traits::AttemptSource;

use crate::error::ClientError;

/// An in-memory attempt source for exercising the progress collector
/// without a backend.
///
/// Unknown exams answer with `NotFound`, like the real API.
#[derive(Default)]
pub struct MockAttemptSource {
    /// Map of exam id → attempts.
    attempts: HashMap<String, Vec<AttemptRecord>>,
    /// Enrolled courses, shared by every student.
    courses: Vec<EnrolledCourse>,
    /// Map of course id → exams.
    exams: HashMap<String, Vec<ExamInfo>>,
    /// Number of attempt fetches made.
    call_count: AtomicU32,
}

impl MockAttemptSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `attempts` for `exam_id`.
    pub fn with_attempts(mut self, exam_id: &str, attempts: Vec<AttemptRecord>) -> Self {
        self.attempts.insert(exam_id.to_string(), attempts);
        self
    }

    /// Add an enrolled course with the given exams.
    pub fn with_course(mut self, course: EnrolledCourse, exams: Vec<ExamInfo>) -> Self {
        self.exams.insert(course.id.clone(), exams);
        self.courses.push(course);
        self
    }

    /// Get the number of attempt fetches made to this source.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AttemptSource for MockAttemptSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_attempts(
        &self,
        _student_id: &str,
        exam_id: &str,
    ) -> anyhow::Result<Vec<AttemptRecord>> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        match self.attempts.get(exam_id) {
            Some(attempts) => Ok(attempts.clone()),
            None => Err(ClientError::NotFound(format!("exam {exam_id}")).into()),
        }
    }

    async fn fetch_courses(&self, _student_id: &str) -> anyhow::Result<Vec<EnrolledCourse>> {
        Ok(self.courses.clone())
    }

    async fn fetch_exams(&self, course_id: &str) -> anyhow::Result<Vec<ExamInfo>> {
        match self.exams.get(course_id) {
            Some(exams) => Ok(exams.clone()),
            None => Err(ClientError::NotFound(format!("course {course_id}")).into()),
        }
    }
}
