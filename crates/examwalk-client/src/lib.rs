//! examwalk-client: ExamWalk backend access.
//!
//! Implements the `AttemptSource` trait over the ExamWalk REST API, with the
//! bearer credential passed in explicitly, plus configuration loading and a
//! mock source for tests.

pub mod client;
pub mod config;
pub mod error;
pub mod mock;

pub use client::{ClientOptions, Credentials, ExamWalkClient};
pub use config::{create_client, load_config, ExamWalkConfig};
pub use error::ClientError;
