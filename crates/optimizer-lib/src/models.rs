//! Core data models for the plant optimizer

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::predictor::{
    EnergyPrediction, HeatLossPrediction, MaintenancePrediction, MillOptimization,
    PmRiskPrediction, QualityPrediction, ThroughputForecast, TsrOptimization,
};

/// Real-time plant input metrics for a comprehensive prediction
///
/// Every field is optional on the wire and falls back to the nominal
/// operating point. Numeric strings are coerced; nothing is range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantMetrics {
    // Feed & kiln
    #[serde(deserialize_with = "lenient_f64")]
    pub feed_rate_tph: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub kiln_outlet_temp_c: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub kiln_inlet_temp_c: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub preheater_bypass_pct: f64,

    // Mill operations
    #[serde(deserialize_with = "lenient_f64")]
    pub mill_load_pct: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub separator_speed_rpm: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub mill_power_kw: f64,

    // Fans & stack
    #[serde(deserialize_with = "lenient_f64")]
    pub id_fan_speed_pct: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub pa_fan_speed_pct: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub stack_temp_c: f64,

    // Alternative fuels
    #[serde(deserialize_with = "lenient_f64")]
    pub af_pct: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub tsr_pct: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub coal_rate_tph: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub biomass_rate_tph: f64,

    // Dust control
    #[serde(deserialize_with = "lenient_f64")]
    pub dp_bagfilter_kpa: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub bag_reverse_cycle_s: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub esp_load_pct: f64,

    // Quality parameters
    #[serde(deserialize_with = "lenient_f64")]
    pub blaine: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub lsf: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub sm: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub am: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub free_lime: f64,
}

impl Default for PlantMetrics {
    fn default() -> Self {
        Self {
            feed_rate_tph: 850.0,
            kiln_outlet_temp_c: 1420.0,
            kiln_inlet_temp_c: 850.0,
            preheater_bypass_pct: 8.0,
            mill_load_pct: 82.0,
            separator_speed_rpm: 1850.0,
            mill_power_kw: 4200.0,
            id_fan_speed_pct: 78.0,
            pa_fan_speed_pct: 68.0,
            stack_temp_c: 265.0,
            af_pct: 48.0,
            tsr_pct: 48.0,
            coal_rate_tph: 12.5,
            biomass_rate_tph: 3.5,
            dp_bagfilter_kpa: 2.8,
            bag_reverse_cycle_s: 180.0,
            esp_load_pct: 62.0,
            blaine: 3420.0,
            lsf: 95.5,
            sm: 2.4,
            am: 1.5,
            free_lime: 1.2,
        }
    }
}

/// Accept a JSON number or a numeric string
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got {:?}", s))),
    }
}

/// The eight predictive model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Energy,
    Quality,
    PmRisk,
    Tsr,
    Maintenance,
    HeatLoss,
    Mill,
    Throughput,
}

impl ModelFamily {
    /// All families in response order
    pub const ALL: [ModelFamily; 8] = [
        ModelFamily::Energy,
        ModelFamily::Quality,
        ModelFamily::PmRisk,
        ModelFamily::Tsr,
        ModelFamily::Maintenance,
        ModelFamily::HeatLoss,
        ModelFamily::Mill,
        ModelFamily::Throughput,
    ];

    /// Short tag passed to the prediction provider
    pub fn tag(&self) -> &'static str {
        match self {
            ModelFamily::Energy => "energy",
            ModelFamily::Quality => "quality",
            ModelFamily::PmRisk => "pm_risk",
            ModelFamily::Tsr => "tsr",
            ModelFamily::Maintenance => "maintenance",
            ModelFamily::HeatLoss => "heat_loss",
            ModelFamily::Mill => "mill",
            ModelFamily::Throughput => "throughput",
        }
    }

    /// Name of the deployed warehouse model backing this family
    pub fn model_name(&self) -> &'static str {
        match self {
            ModelFamily::Energy => "energy_regressor",
            ModelFamily::Quality => "quality_regressor",
            ModelFamily::PmRisk => "pm_risk_classifier",
            ModelFamily::Tsr => "tsr_optimizer",
            ModelFamily::Maintenance => "maintenance_predictor",
            ModelFamily::HeatLoss => "heat_loss_regressor",
            ModelFamily::Mill => "mill_optimizer",
            ModelFamily::Throughput => "throughput_forecaster",
        }
    }

    /// Key of this family's payload in a comprehensive prediction
    pub fn response_key(&self) -> &'static str {
        match self {
            ModelFamily::Energy => "energy_prediction",
            ModelFamily::Quality => "quality_prediction",
            ModelFamily::PmRisk => "pm_risk_prediction",
            ModelFamily::Tsr => "tsr_optimization",
            ModelFamily::Maintenance => "maintenance_prediction",
            ModelFamily::HeatLoss => "heat_loss_prediction",
            ModelFamily::Mill => "mill_optimization",
            ModelFamily::Throughput => "throughput_forecast",
        }
    }

    /// Names of every deployed model, in family order
    pub fn model_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.model_name()).collect()
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Recommendation priority, ordered `Low < Medium < High < Urgent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

/// Actionable recommendation derived from one or more predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub action: String,
    pub impact: String,
    pub savings_usd: u64,
    pub confidence_pct: u8,
    pub priority: Priority,
}

/// Predictions from all eight models plus derived recommendations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensivePrediction {
    pub energy_prediction: EnergyPrediction,
    pub quality_prediction: QualityPrediction,
    pub pm_risk_prediction: PmRiskPrediction,
    pub tsr_optimization: TsrOptimization,
    pub maintenance_prediction: MaintenancePrediction,
    pub heat_loss_prediction: HeatLossPrediction,
    pub mill_optimization: MillOptimization,
    pub throughput_forecast: ThroughputForecast,
    pub recommendations: Vec<Recommendation>,
    pub total_savings_per_day: u64,
    pub timestamp: String,
}
