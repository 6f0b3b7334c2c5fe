//! The `examwalk init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    let path = Path::new("examwalk.toml");
    if path.exists() {
        println!("examwalk.toml already exists, skipping.");
    } else {
        std::fs::write(path, SAMPLE_CONFIG)?;
        println!("Created examwalk.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set EXAMWALK_TOKEN or edit `token` in examwalk.toml");
    println!("  2. Run: examwalk courses");
    println!("  3. Run: examwalk progress --course <id>");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examwalk configuration

base_url = "http://localhost:8000"
token = "${EXAMWALK_TOKEN}"
# student_id = "42"
# target_percentage = 70.0

timeout_secs = 30
max_retries = 3
retry_delay_ms = 500
parallelism = 4

[stats]
recent_window = 5
trend_epsilon = 1.0
# "zero_fill" counts unscored attempts as 0%, "skip" leaves them out
unresolved = "zero_fill"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use examwalk_client::config::load_config_from;
    use examwalk_core::statistics::UnresolvedPolicy;

    #[test]
    fn sample_config_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examwalk.toml");
        std::fs::write(&path, SAMPLE_CONFIG).unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.stats.recent_window, 5);
        assert_eq!(config.stats.unresolved, UnresolvedPolicy::ZeroFill);
    }
}
