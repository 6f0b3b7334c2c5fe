//! The `examwalk questions` command.

use std::path::PathBuf;

use anyhow::Result;

use examwalk_client::config::load_config_from;
use examwalk_client::create_client;
use examwalk_core::listing::{group_by_category, Page};

pub async fn execute(
    exam: String,
    page: usize,
    per_page: usize,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let client = create_client(&config)?;

    let questions = client.questions(&exam).await?;
    if questions.is_empty() {
        println!("Exam {exam} has no questions.");
        return Ok(());
    }

    let groups = group_by_category(&questions);
    let shown = Page::of(&groups, page, per_page);
    if shown.page != page {
        tracing::warn!("page {page} is out of range, showing page {}", shown.page);
    }

    for group in shown.items {
        println!("{} ({})", group.category, group.questions.len());
        for question in &group.questions {
            match &question.id {
                Some(id) => println!("  [{id}] {}", question.text),
                None => println!("  {}", question.text),
            }
        }
        println!();
    }

    println!(
        "Page {} of {}: {} categories, {} questions",
        shown.page,
        shown.total_pages,
        shown.total_items,
        questions.len()
    );
    if shown.has_next() {
        println!("Next: --page {}", shown.page + 1);
    }

    Ok(())
}
