//! Chat request and reply payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub context: ChatContext,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default)]
    pub current_predictions: PredictionSnapshot,
}

/// The parts of a comprehensive prediction the assistant reads.
/// Every field may be missing; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionSnapshot {
    #[serde(default)]
    pub total_savings_per_day: Option<f64>,
    #[serde(default)]
    pub energy_prediction: Option<EnergySnapshot>,
    #[serde(default)]
    pub quality_prediction: Option<QualitySnapshot>,
    #[serde(default)]
    pub tsr_optimization: Option<TsrSnapshot>,
    #[serde(default)]
    pub maintenance_prediction: Option<MaintenanceSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergySnapshot {
    #[serde(default)]
    pub savings_pct: Option<f64>,
    #[serde(default)]
    pub potential_savings_kwh: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySnapshot {
    #[serde(default)]
    pub predicted_quality_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TsrSnapshot {
    #[serde(default)]
    pub predicted_co2_reduction_pct: Option<f64>,
    #[serde(default)]
    pub optimal_tsr_pct: Option<f64>,
    #[serde(default)]
    pub co2_saved_tons_per_day: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceSnapshot {
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub failure_probability: Option<f64>,
}

impl PredictionSnapshot {
    pub fn energy_savings_pct(&self) -> Option<f64> {
        self.energy_prediction
            .as_ref()
            .and_then(|e| e.savings_pct)
    }

    pub fn energy_savings_kwh(&self) -> f64 {
        self.energy_prediction
            .as_ref()
            .and_then(|e| e.potential_savings_kwh)
            .unwrap_or(0.0)
    }

    pub fn quality_score(&self) -> Option<f64> {
        self.quality_prediction
            .as_ref()
            .and_then(|q| q.predicted_quality_score)
    }

    pub fn co2_reduction_pct(&self) -> Option<f64> {
        self.tsr_optimization
            .as_ref()
            .and_then(|t| t.predicted_co2_reduction_pct)
    }

    pub fn optimal_tsr_pct(&self) -> Option<f64> {
        self.tsr_optimization
            .as_ref()
            .and_then(|t| t.optimal_tsr_pct)
    }

    pub fn co2_saved_tons_per_day(&self) -> f64 {
        self.tsr_optimization
            .as_ref()
            .and_then(|t| t.co2_saved_tons_per_day)
            .unwrap_or(0.0)
    }

    pub fn maintenance_risk_level(&self) -> &str {
        self.maintenance_prediction
            .as_ref()
            .and_then(|m| m.risk_level.as_deref())
            .unwrap_or("Unknown")
    }

    pub fn failure_probability(&self) -> f64 {
        self.maintenance_prediction
            .as_ref()
            .and_then(|m| m.failure_probability)
            .unwrap_or(0.0)
    }
}

/// Speaker of a history turn. Unrecognized roles map to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
}

/// Which responder produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Generative,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub source: ReplySource,
}
