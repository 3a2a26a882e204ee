//! In-process warehouse used for local runs and tests

use super::{validate_identifier, Warehouse};
use crate::error::WarehouseError;
use crate::knowledge::KnowledgeChunk;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Tables keyed by name, rows ordered by `chunk_id`
#[derive(Debug, Default)]
pub struct InMemoryWarehouse {
    tables: DashMap<String, BTreeMap<String, KnowledgeChunk>>,
    models: DashSet<String>,
}

impl InMemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the deployed model list
    pub fn with_models<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let warehouse = Self::new();
        for model in models {
            warehouse.models.insert(model.into());
        }
        warehouse
    }

    pub fn register_model(&self, name: impl Into<String>) {
        self.models.insert(name.into());
    }

    /// Write a row directly, bypassing the merge
    pub fn insert_row(&self, table: &str, row: KnowledgeChunk) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(row.chunk_id.clone(), row);
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.len()).unwrap_or(0)
    }

    pub fn get(&self, table: &str, chunk_id: &str) -> Option<KnowledgeChunk> {
        self.tables
            .get(table)
            .and_then(|t| t.get(chunk_id).cloned())
    }

    /// Snapshot of a table in `chunk_id` order
    pub fn rows(&self, table: &str) -> Vec<KnowledgeChunk> {
        self.tables
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Warehouse for InMemoryWarehouse {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn merge_knowledge(
        &self,
        table: &str,
        rows: &[KnowledgeChunk],
    ) -> Result<u64, WarehouseError> {
        let table = validate_identifier(table)?;

        // The entry guard holds the shard lock for the whole merge
        let mut target = self.tables.entry(table.to_string()).or_default();
        let mut affected = 0u64;
        for row in rows {
            target.insert(row.chunk_id.clone(), row.clone());
            affected += 1;
        }

        debug!(table, affected, "Merged knowledge rows in memory");
        Ok(affected)
    }

    async fn list_deployed_model_names(&self) -> Result<BTreeSet<String>, WarehouseError> {
        Ok(self.models.iter().map(|m| m.key().clone()).collect())
    }
}
