//! Report rendering for examwalk progress snapshots.

pub mod html;

pub use html::{generate_html, write_html_report};
