//! Deployment status of the eight warehouse models

use crate::models::ModelFamily;
use crate::warehouse::WarehouseHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

pub const NOT_CONNECTED_NOTE: &str = "BigQuery client not initialized";
pub const QUERY_FAILED_NOTE: &str = "Using configured model list (query failed)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeploymentStatus {
    Active,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDeployment {
    pub model_name: String,
    pub status: DeploymentStatus,
}

/// Report served by the model status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelStatusReport {
    /// Built from a successful warehouse query
    Deployed {
        models_count: usize,
        expected_count: usize,
        models: Vec<ModelDeployment>,
        deployed_models: Vec<String>,
        all_ready: bool,
    },
    /// The configured model list, with a note on why it was not verified
    Configured {
        models_count: usize,
        models: Vec<String>,
        all_ready: bool,
        note: String,
    },
}

impl ModelStatusReport {
    fn configured(all_ready: bool, note: &str) -> Self {
        ModelStatusReport::Configured {
            models_count: ModelFamily::ALL.len(),
            models: ModelFamily::model_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            all_ready,
            note: note.to_string(),
        }
    }

    pub fn not_connected() -> Self {
        Self::configured(false, NOT_CONNECTED_NOTE)
    }

    pub fn query_failed() -> Self {
        Self::configured(true, QUERY_FAILED_NOTE)
    }

    /// ACTIVE when the expected model is among the deployed names
    pub fn from_deployed(deployed: &BTreeSet<String>) -> Self {
        let models: Vec<ModelDeployment> = ModelFamily::model_names()
            .into_iter()
            .map(|name| ModelDeployment {
                model_name: name.to_string(),
                status: if deployed.contains(name) {
                    DeploymentStatus::Active
                } else {
                    DeploymentStatus::Pending
                },
            })
            .collect();
        let active = models
            .iter()
            .filter(|m| m.status == DeploymentStatus::Active)
            .count();

        ModelStatusReport::Deployed {
            models_count: active,
            expected_count: models.len(),
            all_ready: active == models.len(),
            models,
            deployed_models: deployed.iter().cloned().collect(),
        }
    }

    /// Query the warehouse behind `handle`
    pub async fn check(handle: &WarehouseHandle) -> Self {
        let Ok(client) = handle.client() else {
            return Self::not_connected();
        };

        match client.list_deployed_model_names().await {
            Ok(deployed) => Self::from_deployed(&deployed),
            Err(e) => {
                warn!(error = %e, "Could not query deployed models");
                Self::query_failed()
            }
        }
    }

    pub fn all_ready(&self) -> bool {
        match self {
            ModelStatusReport::Deployed { all_ready, .. }
            | ModelStatusReport::Configured { all_ready, .. } => *all_ready,
        }
    }
}
