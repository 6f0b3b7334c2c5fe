//! examwalk CLI: exam attempt statistics from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "examwalk",
    version,
    about = "Exam attempt statistics for ExamWalk students"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a saved attempt list offline
    Summarize {
        /// JSON response body holding the attempts
        #[arg(long)]
        attempts: PathBuf,

        /// Target percentage to compare the best score against
        #[arg(long)]
        target: Option<f64>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Fetch attempts from the backend and summarize progress per exam
    Progress {
        /// Exam ids (comma-separated)
        #[arg(long, conflicts_with = "course")]
        exams: Option<String>,

        /// Summarize every exam of this course
        #[arg(long)]
        course: Option<String>,

        /// Student id (defaults to `student_id` in the config)
        #[arg(long)]
        student: Option<String>,

        /// Target percentage to compare the best score against
        #[arg(long)]
        target: Option<f64>,

        /// Output directory for json/html files
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json, html, all
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List enrolled courses
    Courses {
        /// Student id (defaults to `student_id` in the config)
        #[arg(long)]
        student: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List an exam's questions grouped by category
    Questions {
        /// Exam id
        #[arg(long)]
        exam: String,

        /// Page of categories to show (1-based)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Categories per page
        #[arg(long, default_value = "10")]
        per_page: usize,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two saved progress reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Regression threshold in percentage points
        #[arg(long, default_value = "1.0")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a starter examwalk.toml
    Init,
}

#[tokio::main]
async fn main() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "examwalk=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Summarize {
            attempts,
            target,
            format,
            config,
        } => commands::summarize::execute(attempts, target, format, config),
        Commands::Progress {
            exams,
            course,
            student,
            target,
            output,
            format,
            config,
        } => {
            commands::progress::execute(exams, course, student, target, output, format, config)
                .await
        }
        Commands::Courses { student, config } => commands::courses::execute(student, config).await,
        Commands::Questions {
            exam,
            page,
            per_page,
            config,
        } => commands::questions::execute(exam, page, per_page, config).await,
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
