//! Per-family prediction payloads
//!
//! Field names and units are consumed verbatim by the dashboard and by the
//! recommendation rules, so they must not be renamed.

use crate::models::ModelFamily;
use serde::{Deserialize, Serialize};

/// Risk classification shared by the particulate and maintenance models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Critical => write!(f, "Critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityStatus {
    Optimal,
    Good,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bottleneck {
    Mill,
    Preheater,
    #[serde(rename = "Kiln Feed")]
    KilnFeed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationPotential {
    Medium,
    High,
}

/// energy_regressor output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyPrediction {
    pub predicted_kwh_per_ton: f64,
    pub current_kwh_per_ton: f64,
    pub potential_savings_kwh: f64,
    pub savings_pct: f64,
    pub confidence: u8,
}

/// quality_regressor output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityPrediction {
    pub predicted_quality_score: f64,
    pub current_quality_score: f64,
    pub status: QualityStatus,
    pub blaine_fineness_target: i64,
    pub strength_28d_mpa: f64,
    pub confidence: u8,
}

/// pm_risk_classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmRiskPrediction {
    pub risk_probability: i64,
    pub risk_level: RiskLevel,
    pub current_pm_emission: f64,
    pub threshold_limit: i64,
    pub filter_dp_kpa: f64,
    pub confidence: u8,
}

/// tsr_optimizer output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsrOptimization {
    pub current_tsr_pct: f64,
    pub optimal_tsr_pct: f64,
    pub predicted_co2_reduction_pct: f64,
    pub co2_saved_tons_per_day: i64,
    pub potential_increase_pct: f64,
    pub confidence: u8,
}

/// maintenance_predictor output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenancePrediction {
    pub failure_risk_flag: u8,
    pub failure_probability: i64,
    pub risk_level: RiskLevel,
    pub kiln_drive_vibration_mm_s: f64,
    pub mill_bearing_temp_c: i64,
    pub predicted_failure_hours: u32,
    pub confidence: u8,
}

/// heat_loss_regressor output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatLossPrediction {
    pub stack_heat_loss_kw: f64,
    pub stack_temp_c: f64,
    pub cooler_heat_loss_kw: f64,
    pub total_recoverable_kw: f64,
    pub whr_potential_kwh_day: f64,
    pub savings_potential_usd_day: f64,
    pub confidence: u8,
}

/// mill_optimizer output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MillOptimization {
    pub current_separator_speed_rpm: i64,
    pub optimal_separator_speed_rpm: i64,
    pub speed_adjustment_rpm: i64,
    pub speed_adjustment_pct: f64,
    pub energy_savings_potential_kwh: f64,
    pub confidence: u8,
}

/// throughput_forecaster output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputForecast {
    pub current_throughput_tph: i64,
    pub predicted_throughput_tph: f64,
    pub throughput_increase_pct: f64,
    pub bottleneck_component: Bottleneck,
    pub optimization_potential: OptimizationPotential,
    pub confidence: u8,
}

/// One model family's answer for a single request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "prediction", rename_all = "snake_case")]
pub enum PredictionResult {
    Energy(EnergyPrediction),
    Quality(QualityPrediction),
    PmRisk(PmRiskPrediction),
    Tsr(TsrOptimization),
    Maintenance(MaintenancePrediction),
    HeatLoss(HeatLossPrediction),
    Mill(MillOptimization),
    Throughput(ThroughputForecast),
}

impl PredictionResult {
    /// Family that produced this payload
    pub fn family(&self) -> ModelFamily {
        match self {
            PredictionResult::Energy(_) => ModelFamily::Energy,
            PredictionResult::Quality(_) => ModelFamily::Quality,
            PredictionResult::PmRisk(_) => ModelFamily::PmRisk,
            PredictionResult::Tsr(_) => ModelFamily::Tsr,
            PredictionResult::Maintenance(_) => ModelFamily::Maintenance,
            PredictionResult::HeatLoss(_) => ModelFamily::HeatLoss,
            PredictionResult::Mill(_) => ModelFamily::Mill,
            PredictionResult::Throughput(_) => ModelFamily::Throughput,
        }
    }

    /// Confidence score as an integer percentage
    pub fn confidence(&self) -> u8 {
        match self {
            PredictionResult::Energy(p) => p.confidence,
            PredictionResult::Quality(p) => p.confidence,
            PredictionResult::PmRisk(p) => p.confidence,
            PredictionResult::Tsr(p) => p.confidence,
            PredictionResult::Maintenance(p) => p.confidence,
            PredictionResult::HeatLoss(p) => p.confidence,
            PredictionResult::Mill(p) => p.confidence,
            PredictionResult::Throughput(p) => p.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottleneck_serializes_with_space() {
        let json = serde_json::to_string(&Bottleneck::KilnFeed).unwrap();
        assert_eq!(json, "\"Kiln Feed\"");
    }

    #[test]
    fn test_result_tagged_by_family() {
        let result = PredictionResult::Energy(EnergyPrediction {
            predicted_kwh_per_ton: 66.0,
            current_kwh_per_ton: 68.5,
            potential_savings_kwh: 2.5,
            savings_pct: 3.6,
            confidence: 90,
        });

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["family"], "energy");
        assert_eq!(value["prediction"]["savings_pct"], 3.6);
        assert_eq!(result.family(), ModelFamily::Energy);
        assert_eq!(result.confidence(), 90);
    }
}
