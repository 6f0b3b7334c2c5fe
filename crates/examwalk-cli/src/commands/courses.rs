//! The `examwalk courses` command.

use std::path::PathBuf;

use anyhow::Result;

use examwalk_client::config::load_config_from;
use examwalk_client::create_client;

use super::resolve_student;

pub async fn execute(student: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let student_id = resolve_student(student, &config)?;
    let client = create_client(&config)?;

    let courses = client.courses(&student_id).await?;
    if courses.is_empty() {
        println!("Student {student_id} is not enrolled in any course.");
        return Ok(());
    }

    let mut table = comfy_table::Table::new();
    table.set_header(vec!["Course", "Title"]);
    for course in &courses {
        table.add_row(vec![
            course.id.as_str(),
            course.title.as_deref().unwrap_or("-"),
        ]);
    }
    println!("{table}");

    Ok(())
}
