//! HTML progress report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined: one badge
//! row per exam plus an SVG chart of best scores.

use anyhow::Result;
use std::path::Path;

use examwalk_core::model::{ExamProgressSummary, Trend};
use examwalk_core::report::{ExamProgressEntry, ProgressReport};

/// Placeholder for values the summary does not have.
const MISSING: &str = "\u{2014}";

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}%"),
        None => MISSING.to_string(),
    }
}

fn trend_badge(trend: Option<Trend>) -> String {
    match trend {
        Some(t) => {
            let arrow = match t {
                Trend::Improving => "&#9650;",
                Trend::Declining => "&#9660;",
                Trend::Flat => "&#9644;",
            };
            format!("<span class=\"badge trend-{t}\">{arrow} {t}</span>")
        }
        None => format!("<span class=\"badge none\">{MISSING}</span>"),
    }
}

fn target_badge(summary: &ExamProgressSummary) -> String {
    match (summary.target, summary.meets_target()) {
        (Some(target), Some(true)) => {
            format!("<span class=\"badge met\">met ({target:.0}%)</span>")
        }
        (Some(target), Some(false)) => {
            format!("<span class=\"badge missed\">not met ({target:.0}%)</span>")
        }
        _ => format!("<span class=\"badge none\">{MISSING}</span>"),
    }
}

fn last5_cell(last5: &[f64]) -> String {
    if last5.is_empty() {
        return MISSING.to_string();
    }
    last5
        .iter()
        .map(|p| format!("{p:.0}"))
        .collect::<Vec<_>>()
        .join(" &middot; ")
}

fn entry_row(entry: &ExamProgressEntry) -> String {
    let summary = &entry.summary;
    let row_class = match (&entry.error, summary.meets_target()) {
        (Some(_), _) => "error",
        (None, Some(true)) => "pass",
        (None, Some(false)) => "fail",
        (None, None) => "",
    };
    let name = match &entry.error {
        Some(err) => format!(
            "{} <span class=\"meta\" title=\"{}\">(fetch failed)</span>",
            html_escape(entry.display_name()),
            html_escape(err)
        ),
        None => html_escape(entry.display_name()),
    };

    format!(
        "<tr class=\"{row_class}\"><td>{}</td><td>{name}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        html_escape(&entry.exam_id),
        summary.trials,
        format_pct(summary.best),
        format_pct(summary.average),
        trend_badge(summary.trend),
        last5_cell(&summary.last5),
        target_badge(summary),
    )
}

/// Generate an HTML page from a progress report.
pub fn generate_html(report: &ProgressReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>examwalk progress: student {}</title>\n",
        html_escape(&report.student_id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>examwalk progress</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Student: <strong>{}</strong> | {} exams | {} failed | {}</p>\n",
        html_escape(&report.student_id),
        report.entries.len(),
        report.failed_entries().count(),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Best-score chart
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Best scores</h2>\n");
    if report.entries.iter().any(|e| e.summary.best.is_some()) {
        html.push_str(&generate_bar_chart(&report.entries));
    } else {
        html.push_str("<p class=\"meta\">No resolved attempts yet.</p>\n");
    }
    html.push_str("</section>\n");

    // Per-exam badges
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Exams</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Exam</th><th onclick=\"sortTable(1)\">Title</th><th onclick=\"sortTable(2)\">Trials</th><th onclick=\"sortTable(3)\">Best</th><th onclick=\"sortTable(4)\">Average</th><th onclick=\"sortTable(5)\">Trend</th><th>Last 5</th><th onclick=\"sortTable(7)\">Target</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for entry in &report.entries {
        html.push_str(&entry_row(entry));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &ProgressReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart(entries: &[ExamProgressEntry]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let bars: Vec<(&str, f64, Option<f64>)> = entries
        .iter()
        .filter_map(|e| {
            e.summary
                .best
                .map(|best| (e.display_name(), best, e.summary.target))
        })
        .collect();

    let total_height = bars.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (name, best, target)) in bars.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (best.clamp(0.0, 100.0) / 100.0 * max_width as f64) as usize;

        let color = match target {
            Some(t) if best >= t => "#22c55e",
            Some(_) => "#ef4444",
            None if *best >= 50.0 => "#eab308",
            None => "#ef4444",
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        if let Some(t) = target {
            let x = label_width + (t.clamp(0.0, 100.0) / 100.0 * max_width as f64) as usize;
            svg.push_str(&format!(
                "  <line x1=\"{x}\" y1=\"{}\" x2=\"{x}\" y2=\"{}\" stroke=\"currentColor\" stroke-dasharray=\"4 2\"/>\n",
                y,
                y + bar_height
            ));
        }
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            best
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --warn: #fef9c3; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --warn: #713f12; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.error { background: var(--warn); }
.badge { display: inline-block; padding: 0.1rem 0.5rem; border-radius: 999px; font-size: 0.85rem; border: 1px solid var(--border); }
.badge.met, .badge.trend-improving { background: #22c55e; color: #fff; }
.badge.missed, .badge.trend-declining { background: #ef4444; color: #fff; }
.badge.trend-flat { background: #9ca3af; color: #fff; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    if (!isNaN(na) && !isNaN(nb)) return asc ? na - nb : nb - na;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_report() -> ProgressReport {
        ProgressReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            student_id: "42".into(),
            entries: vec![
                ExamProgressEntry {
                    exam_id: "1".into(),
                    exam_title: Some("Mock <A>".into()),
                    summary: ExamProgressSummary {
                        trials: 3,
                        best: Some(72.0),
                        last5: vec![72.0, 55.0, 40.0],
                        trend: Some(Trend::Improving),
                        target: Some(70.0),
                        average: Some(55.7),
                        average_time_sec: None,
                    },
                    error: None,
                },
                ExamProgressEntry {
                    exam_id: "2".into(),
                    exam_title: None,
                    summary: ExamProgressSummary::default(),
                    error: Some("not found: exam 2".into()),
                },
            ],
            duration_ms: 120,
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let report = make_test_report();
        let html = generate_html(&report);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Mock &lt;A&gt;"));
        assert!(!html.contains("Mock <A>"));
        assert!(html.contains("72.0%"));
        assert!(html.contains("55.7%"));
        assert!(html.contains("72 &middot; 55 &middot; 40"));
        assert!(html.contains("trend-improving"));
        assert!(html.contains("met (70%)"));
        assert!(html.contains("fetch failed"));
    }

    #[test]
    fn missing_data_renders_placeholder() {
        let report = make_test_report();
        let row = entry_row(&report.entries[1]);
        assert!(row.contains(MISSING));
        assert!(row.contains("class=\"error\""));
    }

    #[test]
    fn target_not_met_badge() {
        let summary = ExamProgressSummary {
            best: Some(60.0),
            target: Some(70.0),
            ..Default::default()
        };
        assert!(target_badge(&summary).contains("not met (70%)"));
        assert!(target_badge(&ExamProgressSummary::default()).contains(MISSING));
    }

    #[test]
    fn empty_report_has_no_chart() {
        let report = ProgressReport {
            entries: vec![],
            ..make_test_report()
        };
        let html = generate_html(&report);
        assert!(html.contains("No resolved attempts yet."));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
