//! Idempotent knowledge upsert job

use super::KnowledgeCatalog;
use crate::observability::{OptimizerMetrics, StructuredLogger};
use crate::warehouse::WarehouseHandle;
use crate::WarehouseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of one upsert run, serialized with an upper-case `status` tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum UpsertResult {
    Success {
        batch_id: Uuid,
        rows_affected: u64,
        timestamp: DateTime<Utc>,
        message: String,
    },
    Error {
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl UpsertResult {
    pub fn is_success(&self) -> bool {
        matches!(self, UpsertResult::Success { .. })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            UpsertResult::Success { timestamp, .. } | UpsertResult::Error { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

/// Merges the catalog into one warehouse table.
///
/// Matched chunks are overwritten, missing chunks inserted, rows that are
/// not in the catalog are left alone. Each run stamps a fresh batch id.
#[derive(Clone)]
pub struct KnowledgeUpsertJob {
    warehouse: WarehouseHandle,
    table: String,
    catalog: Arc<KnowledgeCatalog>,
    metrics: OptimizerMetrics,
    logger: StructuredLogger,
}

impl KnowledgeUpsertJob {
    pub fn new(
        warehouse: WarehouseHandle,
        table: impl Into<String>,
        catalog: Arc<KnowledgeCatalog>,
    ) -> Self {
        Self {
            warehouse,
            table: table.into(),
            catalog,
            metrics: OptimizerMetrics::new(),
            logger: StructuredLogger::new("knowledge-upsert"),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn catalog(&self) -> &KnowledgeCatalog {
        &self.catalog
    }

    /// Same warehouse and catalog, different target table
    pub fn with_table(&self, table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..self.clone()
        }
    }

    /// Run one refresh. Failures are reported in the result, never raised.
    pub async fn run(&self) -> UpsertResult {
        let batch_id = Uuid::new_v4();
        let timestamp = Utc::now();

        match self.merge(batch_id, timestamp).await {
            Ok(rows_affected) => {
                self.metrics.record_upsert(Some(rows_affected));
                self.logger
                    .log_upsert(&self.table, &batch_id.to_string(), rows_affected);

                let short_id: String = batch_id.to_string().chars().take(8).collect();
                UpsertResult::Success {
                    batch_id,
                    rows_affected,
                    timestamp,
                    message: format!(
                        "✅ Upserted {} Grokipedia chunks (batch: {}...)",
                        rows_affected, short_id
                    ),
                }
            }
            Err(e) => {
                self.metrics.record_upsert(None);
                self.logger.log_upsert_failure(&self.table, &e.to_string());
                UpsertResult::Error {
                    error: e.to_string(),
                    timestamp,
                }
            }
        }
    }

    async fn merge(&self, batch_id: Uuid, timestamp: DateTime<Utc>) -> Result<u64, WarehouseError> {
        let client = self.warehouse.client()?;
        let rows = self.catalog.stamp(batch_id, timestamp);
        client.merge_knowledge(&self.table, &rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{builtin_entries, KnowledgeChunk, KnowledgeEntry};
    use crate::warehouse::InMemoryWarehouse;

    const TABLE: &str = "grokipedia_rag";

    fn job_with(warehouse: Arc<InMemoryWarehouse>) -> KnowledgeUpsertJob {
        KnowledgeUpsertJob::new(
            WarehouseHandle::connected(warehouse),
            TABLE,
            Arc::new(KnowledgeCatalog::builtin()),
        )
    }

    fn batch_of(result: &UpsertResult) -> Uuid {
        match result {
            UpsertResult::Success { batch_id, .. } => *batch_id,
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_run_inserts_whole_catalog() {
        let warehouse = Arc::new(InMemoryWarehouse::new());
        let result = job_with(warehouse.clone()).run().await;

        match &result {
            UpsertResult::Success {
                rows_affected,
                batch_id,
                message,
                ..
            } => {
                assert_eq!(*rows_affected, 10);
                let prefix = &batch_id.to_string()[..8];
                assert_eq!(
                    message,
                    &format!("✅ Upserted 10 Grokipedia chunks (batch: {}...)", prefix)
                );
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(warehouse.row_count(TABLE), 10);
        assert!(warehouse
            .rows(TABLE)
            .iter()
            .all(|row| row.batch_id == batch_of(&result)));
    }

    #[tokio::test]
    async fn test_second_run_only_restamps_rows() {
        let warehouse = Arc::new(InMemoryWarehouse::new());
        let job = job_with(warehouse.clone());

        let first = job.run().await;
        let before = warehouse.rows(TABLE);
        let second = job.run().await;
        let after = warehouse.rows(TABLE);

        assert_ne!(batch_of(&first), batch_of(&second));
        assert_eq!(before.len(), after.len());
        for (old, new) in before.iter().zip(after.iter()) {
            assert!(old.same_content(new));
            assert_eq!(new.batch_id, batch_of(&second));
            assert_eq!(new.last_updated, second.timestamp());
        }
    }

    #[tokio::test]
    async fn test_rows_outside_catalog_are_untouched() {
        let warehouse = Arc::new(InMemoryWarehouse::new());
        let manual = KnowledgeChunk {
            chunk_id: "manual_001".to_string(),
            topic: "Operations".to_string(),
            title: "Shift handover".to_string(),
            content: "Hand-written note.".to_string(),
            url: "https://intranet.local/handover".to_string(),
            word_count: 3,
            batch_id: Uuid::new_v4(),
            last_updated: Utc::now(),
        };
        warehouse.insert_row(TABLE, manual.clone());

        let result = job_with(warehouse.clone()).run().await;

        assert!(result.is_success());
        assert_eq!(warehouse.row_count(TABLE), 11);
        assert_eq!(warehouse.get(TABLE, "manual_001"), Some(manual));
    }

    #[tokio::test]
    async fn test_existing_chunk_is_overwritten() {
        let warehouse = Arc::new(InMemoryWarehouse::new());
        let stale = KnowledgeEntry {
            content: "outdated text".to_string(),
            word_count: 2,
            ..builtin_entries()[0].clone()
        };
        let mut seeded = KnowledgeCatalog::from_entries(vec![stale])
            .unwrap()
            .stamp(Uuid::new_v4(), Utc::now());
        warehouse.insert_row(TABLE, seeded.remove(0));

        let result = job_with(warehouse.clone()).run().await;

        assert!(matches!(result, UpsertResult::Success { rows_affected: 10, .. }));
        let refreshed = warehouse.get(TABLE, "chunk_001").unwrap();
        assert_eq!(refreshed.word_count, 120);
        assert_eq!(refreshed.batch_id, batch_of(&result));
    }

    #[tokio::test]
    async fn test_not_connected_reports_error_result() {
        let job = KnowledgeUpsertJob::new(
            WarehouseHandle::not_connected("credentials missing"),
            TABLE,
            Arc::new(KnowledgeCatalog::builtin()),
        );

        let result = job.run().await;
        match result {
            UpsertResult::Error { error, .. } => assert!(error.contains("credentials missing")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_table_reports_error_result() {
        let job = KnowledgeUpsertJob::new(
            WarehouseHandle::connected(Arc::new(InMemoryWarehouse::new())),
            "rag`; DROP TABLE x",
            Arc::new(KnowledgeCatalog::builtin()),
        );

        assert!(!job.run().await.is_success());
    }

    #[tokio::test]
    async fn test_with_table_targets_other_table() {
        let warehouse = Arc::new(InMemoryWarehouse::new());
        let job = job_with(warehouse.clone()).with_table("kiln_rag");

        assert!(job.run().await.is_success());
        assert_eq!(job.table(), "kiln_rag");
        assert_eq!(warehouse.row_count("kiln_rag"), 10);
        assert_eq!(warehouse.row_count(TABLE), 0);
    }

    #[test]
    fn test_result_serializes_with_status_tag() {
        let ok = UpsertResult::Success {
            batch_id: Uuid::nil(),
            rows_affected: 10,
            timestamp: Utc::now(),
            message: "done".to_string(),
        };
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["status"], "SUCCESS");
        assert_eq!(value["rows_affected"], 10);
        assert_eq!(value["batch_id"], "00000000-0000-0000-0000-000000000000");

        let failed = UpsertResult::Error {
            error: "boom".to_string(),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["status"], "ERROR");
        assert_eq!(value["error"], "boom");
        assert!(value.get("batch_id").is_none());
    }
}
