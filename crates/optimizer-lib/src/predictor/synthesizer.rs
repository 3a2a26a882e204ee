//! Comprehensive prediction synthesis
//!
//! Fans one metrics snapshot out to all eight model families, then derives
//! recommendations and total savings from the collected payloads.

use super::recommendations::{derive_recommendations, PredictionSet};
use super::{PredictionProvider, PredictionResult};
use crate::error::SynthesisError;
use crate::models::{ComprehensivePrediction, ModelFamily, PlantMetrics};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::debug;

macro_rules! expect_family {
    ($result:expr, $variant:ident) => {
        match $result {
            PredictionResult::$variant(payload) => payload,
            other => {
                return Err(SynthesisError::FamilyMismatch {
                    expected: ModelFamily::$variant,
                    actual: other.family(),
                })
            }
        }
    };
}

/// Aggregates per-family predictions into recommendations
#[derive(Clone)]
pub struct Synthesizer {
    provider: Arc<dyn PredictionProvider>,
}

impl Synthesizer {
    pub fn new(provider: Arc<dyn PredictionProvider>) -> Self {
        Self { provider }
    }

    async fn fetch(
        &self,
        family: ModelFamily,
        metrics: PlantMetrics,
    ) -> Result<PredictionResult, SynthesisError> {
        Ok(self.provider.predict(family, metrics).await?)
    }

    /// Query every family for one snapshot. Families are fetched
    /// concurrently; the first failure aborts the whole synthesis.
    pub async fn collect(&self, metrics: PlantMetrics) -> Result<PredictionSet, SynthesisError> {
        let (energy, quality, pm_risk, tsr, maintenance, heat_loss, mill, throughput) = tokio::try_join!(
            self.fetch(ModelFamily::Energy, metrics),
            self.fetch(ModelFamily::Quality, metrics),
            self.fetch(ModelFamily::PmRisk, metrics),
            self.fetch(ModelFamily::Tsr, metrics),
            self.fetch(ModelFamily::Maintenance, metrics),
            self.fetch(ModelFamily::HeatLoss, metrics),
            self.fetch(ModelFamily::Mill, metrics),
            self.fetch(ModelFamily::Throughput, metrics),
        )?;

        Ok(PredictionSet {
            energy: expect_family!(energy, Energy),
            quality: expect_family!(quality, Quality),
            pm_risk: expect_family!(pm_risk, PmRisk),
            tsr: expect_family!(tsr, Tsr),
            maintenance: expect_family!(maintenance, Maintenance),
            heat_loss: expect_family!(heat_loss, HeatLoss),
            mill: expect_family!(mill, Mill),
            throughput: expect_family!(throughput, Throughput),
        })
    }

    /// Run all models and derive recommendations with total savings
    pub async fn synthesize(
        &self,
        metrics: PlantMetrics,
    ) -> Result<ComprehensivePrediction, SynthesisError> {
        let predictions = self.collect(metrics).await?;
        let recommendations = derive_recommendations(&predictions);
        let total_savings_per_day = recommendations.iter().map(|r| r.savings_usd).sum();

        debug!(
            recommendations = recommendations.len(),
            total_savings_per_day, "Synthesized comprehensive prediction"
        );

        Ok(ComprehensivePrediction {
            energy_prediction: predictions.energy,
            quality_prediction: predictions.quality,
            pm_risk_prediction: predictions.pm_risk,
            tsr_optimization: predictions.tsr,
            maintenance_prediction: predictions.maintenance,
            heat_loss_prediction: predictions.heat_loss,
            mill_optimization: predictions.mill,
            throughput_forecast: predictions.throughput,
            recommendations,
            total_savings_per_day,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        })
    }
}
