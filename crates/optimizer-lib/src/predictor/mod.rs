//! Prediction engine
//!
//! The eight model families are served by an external prediction provider.
//! This module defines the provider seam, the per-family payloads, the
//! simulated stand-in provider and the synthesizer that turns eight
//! payloads into ranked recommendations.

mod recommendations;
mod results;
mod simulated;
mod synthesizer;

pub use recommendations::{
    derive_recommendations, energy_rule, maintenance_rule, pm_risk_rule, tsr_rule,
    PredictionSet, ENERGY_COST_PER_KWH_USD, ENERGY_SAVINGS_THRESHOLD_PCT,
    FAILURE_PROBABILITY_THRESHOLD, MAINTENANCE_SAVINGS_USD, PM_RISK_SAVINGS_USD,
    PM_RISK_THRESHOLD, TSR_INCREASE_THRESHOLD_PCT,
};
pub use results::{
    Bottleneck, EnergyPrediction, HeatLossPrediction, MaintenancePrediction, MillOptimization,
    OptimizationPotential, PmRiskPrediction, PredictionResult, QualityPrediction,
    QualityStatus, RiskLevel, ThroughputForecast, TsrOptimization,
};
pub use simulated::{
    round_to, simulate_plant_summary, PlantSummary, SimulatedProvider, BASE_ENERGY_KWH_PER_TON,
    BASE_THROUGHPUT_TPH,
};
pub use synthesizer::Synthesizer;

use crate::error::ProviderError;
use crate::models::{ModelFamily, PlantMetrics};
use async_trait::async_trait;

/// Trait for prediction provider implementations
#[async_trait]
pub trait PredictionProvider: Send + Sync {
    /// Run one model family against a metrics snapshot
    async fn predict(
        &self,
        family: ModelFamily,
        metrics: PlantMetrics,
    ) -> Result<PredictionResult, ProviderError>;
}
