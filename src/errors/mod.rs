//! # Error Handling
//!
//! Error taxonomy for a migration run. Discovery and walk errors are fatal to the run
//! (or to the mount, when mount failures are isolated); write errors are recovered per
//! entry by the publisher.

pub mod types;

pub use types::{MigrationError, Result};
