//! Builds the service state from configuration

use crate::api::AppState;
use crate::config::{ApiConfig, ChatSettings, WarehouseBackend};
use anyhow::{Context, Result};
use optimizer_lib::{
    chat::{ChatBackend, GeminiClient, GeminiConfig},
    health::{components, HealthRegistry},
    knowledge::{KnowledgeCatalog, KnowledgeUpsertJob},
    observability::{OptimizerMetrics, StructuredLogger},
    predictor::{PredictionProvider, Synthesizer},
    warehouse::{
        BigQueryClient, BigQueryConfig, InMemoryWarehouse, SqliteWarehouse, WarehouseHandle,
    },
    ChatService, ModelFamily,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Connect the configured warehouse backend.
///
/// Connection problems do not stop the service; they yield a
/// `NotConnected` handle carrying the reason.
pub fn connect_warehouse(config: &ApiConfig) -> WarehouseHandle {
    let settings = &config.warehouse;

    let handle = match settings.backend {
        WarehouseBackend::Memory => {
            // Local runs treat every model as deployed
            let warehouse = InMemoryWarehouse::with_models(ModelFamily::model_names());
            WarehouseHandle::connected(Arc::new(warehouse))
        }
        WarehouseBackend::Sqlite => match SqliteWarehouse::open(&settings.sqlite_path) {
            Ok(warehouse) => WarehouseHandle::connected(Arc::new(warehouse)),
            Err(e) => WarehouseHandle::not_connected(format!(
                "failed to open {}: {}",
                settings.sqlite_path.display(),
                e
            )),
        },
        WarehouseBackend::Bigquery => match settings.access_token.as_deref() {
            None | Some("") => WarehouseHandle::not_connected("no BigQuery access token configured"),
            Some(token) => {
                let bq = BigQueryConfig::new(&config.project_id, &config.dataset_id, token)
                    .with_endpoint(&settings.endpoint);
                match BigQueryClient::new(bq) {
                    Ok(client) => WarehouseHandle::connected(Arc::new(client)),
                    Err(e) => WarehouseHandle::not_connected(e.to_string()),
                }
            }
        },
    };

    match &handle {
        WarehouseHandle::Connected(_) => {
            info!(backend = settings.backend.as_str(), "Warehouse connected")
        }
        WarehouseHandle::NotConnected { reason } => {
            warn!(backend = settings.backend.as_str(), reason = %reason, "Warehouse not connected")
        }
    }
    handle
}

/// The built-in corpus, or the JSON catalog named in configuration
pub fn load_catalog(config: &ApiConfig) -> Result<KnowledgeCatalog> {
    match &config.knowledge.catalog_path {
        Some(path) => KnowledgeCatalog::load(path)
            .with_context(|| format!("Failed to load knowledge catalog {}", path.display())),
        None => Ok(KnowledgeCatalog::builtin()),
    }
}

/// Gemini when enabled with credentials, otherwise rules only
pub fn build_chat(project_id: &str, settings: &ChatSettings) -> ChatService {
    if !settings.enabled {
        return ChatService::rules_only();
    }
    let Some(token) = settings.access_token.as_deref().filter(|t| !t.is_empty()) else {
        warn!("Chat enabled without an access token, answering from rules");
        return ChatService::rules_only();
    };

    let mut gemini = GeminiConfig::new(project_id, token);
    gemini.location = settings.location.clone();
    gemini.model = settings.model.clone();
    gemini.endpoint = settings.endpoint.clone();

    match GeminiClient::new(gemini) {
        Ok(client) => {
            let backend: Arc<dyn ChatBackend> = Arc::new(client);
            ChatService::new(Some(backend))
        }
        Err(e) => {
            warn!(error = %e, "Could not create Gemini client, answering from rules");
            ChatService::rules_only()
        }
    }
}

/// Assemble the shared state around a prediction provider
pub fn build_state(
    config: &ApiConfig,
    provider: Arc<dyn PredictionProvider>,
    health_registry: HealthRegistry,
) -> Result<AppState> {
    let warehouse = connect_warehouse(config);
    let catalog = Arc::new(load_catalog(config)?);
    info!(
        chunks = catalog.len(),
        table = %config.knowledge.table,
        "Knowledge catalog loaded"
    );

    Ok(AppState {
        health_registry,
        metrics: OptimizerMetrics::new(),
        logger: StructuredLogger::new("optimizer-api"),
        synthesizer: Synthesizer::new(provider),
        knowledge_job: KnowledgeUpsertJob::new(
            warehouse.clone(),
            config.knowledge.table.clone(),
            catalog,
        ),
        warehouse,
        chat: build_chat(&config.project_id, &config.chat),
    })
}

/// Register components and record the startup state of each
pub async fn register_components(state: &AppState) {
    let registry = &state.health_registry;
    registry.register(components::PREDICTOR).await;

    match &state.warehouse {
        WarehouseHandle::Connected(_) => registry.register(components::WAREHOUSE).await,
        WarehouseHandle::NotConnected { reason } => {
            registry
                .set_degraded(components::WAREHOUSE, reason.clone())
                .await
        }
    }

    match state.chat.backend_name() {
        Some(_) => registry.register(components::CHAT).await,
        None => {
            registry
                .set_degraded(components::CHAT, "rule-based answers only")
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optimizer_lib::health::ComponentStatus;
    use optimizer_lib::SimulatedProvider;
    use std::io::Write;

    #[test]
    fn test_bigquery_without_token_is_not_connected() {
        let mut config = ApiConfig::default();
        config.warehouse.backend = WarehouseBackend::Bigquery;

        let handle = connect_warehouse(&config);
        assert!(!handle.is_connected());
        assert_eq!(handle.backend(), "none");
    }

    #[test]
    fn test_bigquery_with_token_connects() {
        let mut config = ApiConfig::default();
        config.warehouse.backend = WarehouseBackend::Bigquery;
        config.warehouse.access_token = Some("token".to_string());

        assert!(connect_warehouse(&config).is_connected());
    }

    #[test]
    fn test_sqlite_backend_opens_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ApiConfig::default();
        config.warehouse.backend = WarehouseBackend::Sqlite;
        config.warehouse.sqlite_path = dir.path().join("nested").join("optimizer.db");

        let handle = connect_warehouse(&config);
        assert_eq!(handle.backend(), "sqlite");
        assert!(config.warehouse.sqlite_path.exists());
    }

    #[tokio::test]
    async fn test_memory_backend_reports_all_models_deployed() {
        let handle = connect_warehouse(&ApiConfig::default());
        let client = handle.client().unwrap();

        let deployed = client.list_deployed_model_names().await.unwrap();
        assert_eq!(deployed.len(), 8);
    }

    #[test]
    fn test_catalog_override_errors_are_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        let mut config = ApiConfig::default();
        config.knowledge.catalog_path = Some(file.path().to_path_buf());
        assert!(load_catalog(&config).is_err());

        config.knowledge.catalog_path = None;
        assert_eq!(load_catalog(&config).unwrap().len(), 10);
    }

    #[test]
    fn test_chat_needs_enable_flag_and_token() {
        let mut settings = ChatSettings::default();
        assert_eq!(build_chat("proj", &settings).backend_name(), None);

        settings.enabled = true;
        assert_eq!(build_chat("proj", &settings).backend_name(), None);

        settings.access_token = Some("token".to_string());
        assert_eq!(build_chat("proj", &settings).backend_name(), Some("gemini"));
    }

    #[tokio::test]
    async fn test_disconnected_warehouse_degrades_health() {
        let mut config = ApiConfig::default();
        config.warehouse.backend = WarehouseBackend::Bigquery;

        let state = build_state(
            &config,
            Arc::new(SimulatedProvider::new()),
            HealthRegistry::new(),
        )
        .unwrap();
        register_components(&state).await;
        state.health_registry.set_ready(true).await;

        let health = state.health_registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert_eq!(
            health.components[components::WAREHOUSE].status,
            ComponentStatus::Degraded
        );
        assert!(state.health_registry.readiness().await.ready);
    }
}
