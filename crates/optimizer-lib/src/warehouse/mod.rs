//! Data warehouse access
//!
//! The service talks to the warehouse through the [`Warehouse`] trait. Three
//! backends are provided: an in-memory table, SQLite and the BigQuery REST API.

mod bigquery;
mod memory;
mod sqlite;

pub use bigquery::{BigQueryClient, BigQueryConfig, DEFAULT_BIGQUERY_ENDPOINT};
pub use memory::InMemoryWarehouse;
pub use sqlite::SqliteWarehouse;

use crate::error::WarehouseError;
use crate::knowledge::KnowledgeChunk;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Trait for warehouse implementations
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Short backend name for logs and status output
    fn backend(&self) -> &'static str;

    /// Atomically insert-or-update `rows` by `chunk_id`. Returns the number
    /// of rows inserted plus updated. Rows absent from `rows` are untouched.
    async fn merge_knowledge(
        &self,
        table: &str,
        rows: &[KnowledgeChunk],
    ) -> Result<u64, WarehouseError>;

    /// Names of the models currently deployed in the dataset
    async fn list_deployed_model_names(&self) -> Result<BTreeSet<String>, WarehouseError>;
}

/// Warehouse connection state owned by the service
#[derive(Clone)]
pub enum WarehouseHandle {
    Connected(Arc<dyn Warehouse>),
    NotConnected { reason: String },
}

impl std::fmt::Debug for WarehouseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarehouseHandle::Connected(client) => {
                f.debug_tuple("Connected").field(&client.backend()).finish()
            }
            WarehouseHandle::NotConnected { reason } => f
                .debug_struct("NotConnected")
                .field("reason", reason)
                .finish(),
        }
    }
}

impl WarehouseHandle {
    pub fn connected(client: Arc<dyn Warehouse>) -> Self {
        WarehouseHandle::Connected(client)
    }

    pub fn not_connected(reason: impl Into<String>) -> Self {
        WarehouseHandle::NotConnected {
            reason: reason.into(),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, WarehouseHandle::Connected(_))
    }

    /// The client, or `NotConnected` carrying the reason
    pub fn client(&self) -> Result<&Arc<dyn Warehouse>, WarehouseError> {
        match self {
            WarehouseHandle::Connected(client) => Ok(client),
            WarehouseHandle::NotConnected { reason } => {
                Err(WarehouseError::NotConnected(reason.clone()))
            }
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            WarehouseHandle::Connected(client) => client.backend(),
            WarehouseHandle::NotConnected { .. } => "none",
        }
    }
}

/// Table and dataset names are spliced into statements, so only
/// `[A-Za-z0-9_-]` is accepted.
pub fn validate_identifier(name: &str) -> Result<&str, WarehouseError> {
    let valid = !name.is_empty()
        && name.len() <= 1024
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(name)
    } else {
        Err(WarehouseError::InvalidIdentifier(name.to_string()))
    }
}
