//! Destination side of the migration: a flat key-value parameter store.
//!
//! The [`ParameterStore`] trait is the boundary to the destination. A store is built once
//! from explicit settings and handed to the publisher; nothing here is process-global.
//!
//! # Backends
//!
//! - **AWS SSM Parameter Store** ([`SsmParameterStore`])
//! - **In-memory** ([`InMemoryParameterStore`]): records writes, with per-name failure
//!   injection

pub mod memory;
pub mod ssm;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::Result;

pub use memory::InMemoryParameterStore;
pub use ssm::{SsmConfig, SsmParameterStore};

/// Parameter type written to the destination.
///
/// Migrated entries are always written as plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    String,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::String => f.write_str("String"),
        }
    }
}

/// Write access to a parameter store.
///
/// Each call is an independent write; there is no transaction across calls.
/// Implementations MUST NOT log parameter values.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Create or replace the parameter `name`.
    ///
    /// # Errors
    ///
    /// - [`MigrationError::Write`](crate::errors::MigrationError::Write) naming the parameter
    async fn put_parameter(&self, name: &str, value: &str, kind: ParameterType) -> Result<()>;
}

#[async_trait]
impl<P: ParameterStore + ?Sized> ParameterStore for std::sync::Arc<P> {
    async fn put_parameter(&self, name: &str, value: &str, kind: ParameterType) -> Result<()> {
        (**self).put_parameter(name, value, kind).await
    }
}
