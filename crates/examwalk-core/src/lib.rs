//! examwalk-core: Attempt model, progress statistics, and response normalization.
//!
//! This crate defines the data model, the pure attempt aggregator, and the
//! tolerant reader that the rest of examwalk builds on.

pub mod error;
pub mod listing;
pub mod model;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod statistics;
pub mod traits;
