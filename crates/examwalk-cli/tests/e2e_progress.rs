//! End-to-end tests running the binary against a mocked backend.
//!
//! The command blocks the test thread, so the mock server needs the
//! multi-threaded runtime to keep answering.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn examwalk(dir: &TempDir, server: &MockServer) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("examwalk").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("EXAMWALK_BASE_URL", server.uri())
        .env("EXAMWALK_TOKEN", "test-token")
        .env_remove("EXAMWALK_STUDENT_ID");
    cmd
}

async fn mount_attempts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/students/42/exams/1/attempts/"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"submitted_at": "2025-01-10T09:00:00Z", "percentage": 40},
                {"submitted_at": "2025-01-11T09:00:00Z", "percentage": 55},
                {"submitted_at": "2025-01-12T09:00:00Z", "percentage": 72}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/students/42/exams/2/attempts/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/students/42/exams/3/attempts/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn progress_prints_table_for_exam_ids() {
    let server = MockServer::start().await;
    mount_attempts(&server).await;
    let dir = TempDir::new().unwrap();

    examwalk(&dir, &server)
        .arg("progress")
        .arg("--exams")
        .arg("1,2,3")
        .arg("--student")
        .arg("42")
        .arg("--target")
        .arg("70")
        .assert()
        .success()
        .stdout(predicate::str::contains("72.0%"))
        .stdout(predicate::str::contains("55.7%"))
        .stdout(predicate::str::contains("improving"))
        .stdout(predicate::str::contains("72 55 40"))
        .stdout(predicate::str::contains("70% met"))
        .stdout(predicate::str::contains("error"))
        .stderr(predicate::str::contains("1 exam(s) could not be fetched"));
}

#[tokio::test(flavor = "multi_thread")]
async fn progress_for_course_writes_reports() {
    let server = MockServer::start().await;
    mount_attempts(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/courses/12/exams/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 1, "title": "Mock Test 1"},
                {"exam_id": "2", "name": "Mock Test 2"}
            ]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");

    examwalk(&dir, &server)
        .arg("progress")
        .arg("--course")
        .arg("12")
        .arg("--student")
        .arg("42")
        .arg("--output")
        .arg(&out)
        .arg("--format")
        .arg("all")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mock Test 1"))
        .stdout(predicate::str::contains("Mock Test 2"));

    let files: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    let json_path = files
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .unwrap();
    assert!(files
        .iter()
        .any(|p| p.extension().is_some_and(|e| e == "html")));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(report["student_id"], "42");
    assert_eq!(report["entries"][0]["exam_id"], "1");
    assert_eq!(report["entries"][0]["summary"]["best"], 72.0);
    assert_eq!(report["entries"][1]["summary"]["trials"], 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn progress_fails_when_every_exam_fails() {
    let server = MockServer::start().await;
    mount_attempts(&server).await;
    let dir = TempDir::new().unwrap();

    examwalk(&dir, &server)
        .arg("progress")
        .arg("--exams")
        .arg("3")
        .arg("--student")
        .arg("42")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "attempts could not be fetched for any exam",
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn progress_reports_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/courses/12/exams/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token."})),
        )
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    examwalk(&dir, &server)
        .arg("progress")
        .arg("--course")
        .arg("12")
        .arg("--student")
        .arg("42")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid token."));
}

#[tokio::test(flavor = "multi_thread")]
async fn courses_lists_enrollments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/students/42/courses/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"courseId": 12, "title": "Physics"},
            {"enrolled_course": {"id": 13, "title": "Chemistry"}}
        ])))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    examwalk(&dir, &server)
        .env("EXAMWALK_STUDENT_ID", "42")
        .arg("courses")
        .assert()
        .success()
        .stdout(predicate::str::contains("Physics"))
        .stdout(predicate::str::contains("12"));
}

#[tokio::test(flavor = "multi_thread")]
async fn questions_grouped_and_paged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/exams/7/questions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "text": "Unit of force?", "category": "Mechanics"},
            {"id": 2, "text": "Ohm's law?", "category": "Electricity"},
            {"id": 3, "text": "Newton's second law?", "category": "Mechanics"},
            {"id": 4, "text": "Define entropy."}
        ])))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    examwalk(&dir, &server)
        .arg("questions")
        .arg("--exam")
        .arg("7")
        .arg("--per-page")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mechanics (2)"))
        .stdout(predicate::str::contains("  [3] Newton's second law?"))
        .stdout(predicate::str::contains("Electricity (1)"))
        .stdout(predicate::str::contains("Uncategorized").not())
        .stdout(predicate::str::contains("Page 1 of 2: 3 categories, 4 questions"))
        .stdout(predicate::str::contains("Next: --page 2"));

    examwalk(&dir, &server)
        .arg("questions")
        .arg("--exam")
        .arg("7")
        .arg("--per-page")
        .arg("2")
        .arg("--page")
        .arg("9")
        .assert()
        .success()
        .stdout(predicate::str::contains("Uncategorized (1)"))
        .stdout(predicate::str::contains("Page 2 of 2"))
        .stdout(predicate::str::contains("Mechanics").not());
}
