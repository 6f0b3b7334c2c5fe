//! Tolerant reader for backend responses.
//!
//! The backend has returned several shapes for the same entity over time
//! (snake_case vs camelCase keys, raw scores vs percentages, bare arrays vs
//! paginated envelopes). Each entity gets an explicit ordered list of field
//! paths; the first path whose value converts wins. Nothing in this module
//! fails: unusable records are dropped and unusable fields become `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::model::{AttemptRecord, EnrolledCourse, ExamInfo, Question};

/// Keys under which list endpoints have wrapped their payload.
pub const LIST_ENVELOPE_KEYS: &[&str] = &["results", "data", "items", "attempts", "courses", "exams"];

const SUBMITTED_AT: &[&str] = &["submitted_at", "submittedAt", "created_at", "createdAt", "date"];
const PERCENTAGE: &[&str] = &["percentage", "score_percentage", "percent"];
const OBTAINED_SCORE: &[&str] = &["obtained_score", "obtainedScore", "score", "marks_obtained"];
const TOTAL_SCORE: &[&str] = &["total_score", "totalScore", "total_marks", "max_score"];
const TOTAL_QUESTIONS: &[&str] = &["total_questions", "totalQuestions"];
const CORRECT_COUNT: &[&str] = &["correct_count", "correct", "correctCount"];
const WRONG_COUNT: &[&str] = &["wrong_count", "wrong", "wrongCount", "incorrect"];
const NO_ANSWER_COUNT: &[&str] = &["no_answer_count", "unanswered", "noAnswerCount", "skipped"];
const TOTAL_TIME: &[&str] = &["total_time_sec", "totalTimeSec", "time_taken"];
const EXAM_TIME: &[&str] = &["exam_time_sec", "examTimeSec", "duration"];

const COURSE_ID: &[&str] = &["courseId", "course_id", "enrolled_course", "id"];
const COURSE_TITLE: &[&str] = &["title", "name", "course_title", "course.title", "enrolled_course.title"];

const EXAM_ID: &[&str] = &["examId", "exam_id", "id"];
const EXAM_TITLE: &[&str] = &["title", "name"];
const CATEGORY: &[&str] = &["category", "category_name", "category.name"];
const EXAM_COURSE: &[&str] = &["course", "course_id", "courseId"];

const QUESTION_ID: &[&str] = &["id", "question_id", "questionId"];
const QUESTION_TEXT: &[&str] = &["text", "question", "question_text", "title"];

/// Category name for questions that carry none.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Find the list inside a response body.
///
/// Accepts a bare array or an object holding the array under one of
/// [`LIST_ENVELOPE_KEYS`]. Anything else yields an empty slice.
pub fn extract_list(body: &Value) -> &[Value] {
    match body {
        Value::Array(items) => items,
        Value::Object(obj) => {
            for key in LIST_ENVELOPE_KEYS {
                if let Some(Value::Array(items)) = obj.get(*key) {
                    return items;
                }
            }
            tracing::warn!(
                keys = ?obj.keys().collect::<Vec<_>>(),
                "response object has no recognised list field"
            );
            &[]
        }
        other => {
            tracing::warn!("expected a list response, got {}", kind(other));
            &[]
        }
    }
}

/// Normalize one attempt object. Returns `None` for non-objects.
pub fn attempt_from_value(value: &Value) -> Option<AttemptRecord> {
    let Some(obj) = value.as_object() else {
        tracing::debug!("dropping attempt that is not an object: {}", kind(value));
        return None;
    };

    Some(AttemptRecord {
        submitted_at: first_resolved(obj, SUBMITTED_AT, as_timestamp),
        total_questions: first_resolved(obj, TOTAL_QUESTIONS, as_count).unwrap_or(0),
        correct_count: first_resolved(obj, CORRECT_COUNT, as_count).unwrap_or(0),
        wrong_count: first_resolved(obj, WRONG_COUNT, as_count).unwrap_or(0),
        no_answer_count: first_resolved(obj, NO_ANSWER_COUNT, as_count).unwrap_or(0),
        total_time_sec: first_resolved(obj, TOTAL_TIME, as_seconds),
        exam_time_sec: first_resolved(obj, EXAM_TIME, as_seconds),
        percentage: first_resolved(obj, PERCENTAGE, as_number),
        obtained_score: first_resolved(obj, OBTAINED_SCORE, as_number),
        total_score: first_resolved(obj, TOTAL_SCORE, as_number),
    })
}

/// Normalize every attempt in a response body.
pub fn attempts_from_body(body: &Value) -> Vec<AttemptRecord> {
    extract_list(body)
        .iter()
        .filter_map(attempt_from_value)
        .collect()
}

/// Normalize one enrolled-course object. Courses without an id are dropped.
pub fn course_from_value(value: &Value) -> Option<EnrolledCourse> {
    let obj = value.as_object()?;
    let Some(id) = first_resolved(obj, COURSE_ID, as_id) else {
        tracing::debug!("dropping course without an id");
        return None;
    };
    Some(EnrolledCourse {
        id,
        title: first_resolved(obj, COURSE_TITLE, as_text),
    })
}

/// Normalize every enrolled course in a response body.
pub fn courses_from_body(body: &Value) -> Vec<EnrolledCourse> {
    extract_list(body)
        .iter()
        .filter_map(course_from_value)
        .collect()
}

/// Normalize one exam object. Exams without an id are dropped.
pub fn exam_from_value(value: &Value) -> Option<ExamInfo> {
    let obj = value.as_object()?;
    let Some(id) = first_resolved(obj, EXAM_ID, as_id) else {
        tracing::debug!("dropping exam without an id");
        return None;
    };
    Some(ExamInfo {
        id,
        title: first_resolved(obj, EXAM_TITLE, as_text),
        category: first_resolved(obj, CATEGORY, as_text),
        course_id: first_resolved(obj, EXAM_COURSE, as_id),
    })
}

/// Normalize every exam in a response body.
pub fn exams_from_body(body: &Value) -> Vec<ExamInfo> {
    extract_list(body)
        .iter()
        .filter_map(exam_from_value)
        .collect()
}

/// Normalize one question object. Questions without text are dropped.
pub fn question_from_value(value: &Value) -> Option<Question> {
    let obj = value.as_object()?;
    let text = first_resolved(obj, QUESTION_TEXT, as_text)?;
    Some(Question {
        id: first_resolved(obj, QUESTION_ID, as_id),
        text,
        category: first_resolved(obj, CATEGORY, as_text)
            .unwrap_or_else(|| UNCATEGORIZED.to_string()),
    })
}

/// Normalize every question in a response body.
pub fn questions_from_body(body: &Value) -> Vec<Question> {
    extract_list(body)
        .iter()
        .filter_map(question_from_value)
        .collect()
}

/// First value along `paths` that `convert` accepts.
///
/// Paths may be dotted (`"course.title"`) to reach into nested objects.
fn first_resolved<T>(
    obj: &Map<String, Value>,
    paths: &[&str],
    convert: fn(&Value) -> Option<T>,
) -> Option<T> {
    paths
        .iter()
        .filter_map(|path| lookup(obj, path))
        .find_map(convert)
}

fn lookup<'a>(obj: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = obj.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// A finite number, given as a JSON number or a numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// A non-negative whole number that fits a `u32`.
pub fn as_count(value: &Value) -> Option<u32> {
    let n = as_number(value)?;
    if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
        return None;
    }
    Some(n as u32)
}

fn as_seconds(value: &Value) -> Option<u64> {
    let n = as_number(value)?;
    if n < 0.0 {
        return None;
    }
    Some(n.round() as u64)
}

/// An identifier: integer, non-empty string, or object carrying `id`.
pub fn as_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_u64().map(|u| u.to_string()),
        },
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Object(obj) => obj.get("id").and_then(as_id),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    let s = value.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// A UTC timestamp.
///
/// Accepts RFC 3339, naive ISO date-times (taken as UTC, `T` or space
/// separated), bare dates (midnight UTC), and unix epoch numbers in
/// seconds or milliseconds.
pub fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => from_unix(n.as_f64()?),
        Value::String(s) => parse_timestamp(s.trim()),
        _ => None,
    }
}

/// Epoch values at or above this are milliseconds; as seconds they would
/// land past the year 5000.
const UNIX_MILLIS_THRESHOLD: f64 = 1e11;

fn from_unix(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value.abs() >= UNIX_MILLIS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    DateTime::from_timestamp_millis(millis.round() as i64)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let iso = s.replacen(' ', "T", 1);
    if let Ok(dt) = DateTime::parse_from_rfc3339(&iso) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = iso.parse::<NaiveDateTime>() {
        return Some(naive.and_utc());
    }
    s.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
