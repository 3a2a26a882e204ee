//! Recommendation rules
//!
//! Each rule inspects one family's payload and may emit one recommendation.
//! Rules are independent and run in a fixed order, which fixes the order of
//! the output list. Priority is a property of the rule, not of the data.

use super::results::*;
use crate::models::{Priority, Recommendation};
use crate::text::decimal;

/// Failure probability above which maintenance becomes urgent
pub const FAILURE_PROBABILITY_THRESHOLD: i64 = 90;

/// Fixed downtime avoidance estimate for the maintenance rule
pub const MAINTENANCE_SAVINGS_USD: u64 = 50_000;

/// Minimum TSR headroom (percentage points) worth acting on
pub const TSR_INCREASE_THRESHOLD_PCT: f64 = 3.0;

/// Value of one ton of CO₂ avoided
const CO2_VALUE_USD_PER_TON: u64 = 25;

/// Minimum energy savings percentage worth acting on
pub const ENERGY_SAVINGS_THRESHOLD_PCT: f64 = 2.0;

/// Electricity tariff used for savings projections
pub const ENERGY_COST_PER_KWH_USD: f64 = 0.08;

const PROJECTION_TONS_PER_HOUR: f64 = 850.0;
const HOURS_PER_DAY: f64 = 24.0;
const DAYS_PER_MONTH: f64 = 30.0;

/// Particulate risk probability above which bag filters need attention
pub const PM_RISK_THRESHOLD: i64 = 35;

/// Fixed compliance penalty avoidance estimate for the particulate rule
pub const PM_RISK_SAVINGS_USD: u64 = 5_000;

/// One payload per model family for a single request
#[derive(Debug, Clone)]
pub struct PredictionSet {
    pub energy: EnergyPrediction,
    pub quality: QualityPrediction,
    pub pm_risk: PmRiskPrediction,
    pub tsr: TsrOptimization,
    pub maintenance: MaintenancePrediction,
    pub heat_loss: HeatLossPrediction,
    pub mill: MillOptimization,
    pub throughput: ThroughputForecast,
}

fn confidence_pct(confidence: u8) -> u8 {
    confidence.min(100)
}

/// Truncate a currency projection toward zero, never below zero
fn whole_dollars(amount: f64) -> u64 {
    if amount.is_finite() && amount > 0.0 {
        amount.trunc() as u64
    } else {
        0
    }
}

/// Urgent inspection when the maintenance model predicts imminent failure
pub fn maintenance_rule(prediction: &MaintenancePrediction) -> Option<Recommendation> {
    if prediction.failure_probability <= FAILURE_PROBABILITY_THRESHOLD {
        return None;
    }

    Some(Recommendation {
        title: "🚨 URGENT: Equipment Maintenance Required".to_string(),
        description: format!(
            "Critical failure risk detected. Predicted failure in {} hours.",
            prediction.predicted_failure_hours
        ),
        action: "Schedule immediate inspection of kiln drive and mill bearings".to_string(),
        impact: "Prevent unplanned downtime (Est. $50K+ loss per hour)".to_string(),
        savings_usd: MAINTENANCE_SAVINGS_USD,
        confidence_pct: confidence_pct(prediction.confidence),
        priority: Priority::Urgent,
    })
}

/// Raise alternative fuel share when the TSR optimizer sees headroom
pub fn tsr_rule(prediction: &TsrOptimization) -> Option<Recommendation> {
    if prediction.potential_increase_pct <= TSR_INCREASE_THRESHOLD_PCT {
        return None;
    }

    let co2_tons = prediction.co2_saved_tons_per_day.max(0) as u64;

    Some(Recommendation {
        title: "🌱 Increase Alternative Fuel Usage".to_string(),
        description: format!(
            "TSR can be increased from {}% to {}% safely.",
            decimal(prediction.current_tsr_pct),
            decimal(prediction.optimal_tsr_pct)
        ),
        action: format!(
            "Gradually increase biomass/waste fuel ratio by {}%",
            decimal(prediction.potential_increase_pct)
        ),
        impact: format!(
            "{} tons CO₂ saved per day",
            prediction.co2_saved_tons_per_day
        ),
        savings_usd: co2_tons * CO2_VALUE_USD_PER_TON,
        confidence_pct: confidence_pct(prediction.confidence),
        priority: Priority::Medium,
    })
}

/// Monthly cost projection for a per-ton energy saving
pub fn energy_savings_usd(potential_savings_kwh: f64) -> u64 {
    whole_dollars(
        potential_savings_kwh
            * PROJECTION_TONS_PER_HOUR
            * HOURS_PER_DAY
            * ENERGY_COST_PER_KWH_USD
            * DAYS_PER_MONTH,
    )
}

/// Tune fans and feed when the energy model sees meaningful savings
pub fn energy_rule(prediction: &EnergyPrediction) -> Option<Recommendation> {
    if prediction.savings_pct <= ENERGY_SAVINGS_THRESHOLD_PCT {
        return None;
    }

    Some(Recommendation {
        title: "⚡ Process Parameter Tuning".to_string(),
        description: format!(
            "Energy consumption can be reduced by {}% through fan speed and feed rate optimization.",
            decimal(prediction.savings_pct)
        ),
        action: "Apply recommended ID/PA fan adjustments from control system".to_string(),
        impact: format!("{} kWh/ton saved", decimal(prediction.potential_savings_kwh)),
        savings_usd: energy_savings_usd(prediction.potential_savings_kwh),
        confidence_pct: confidence_pct(prediction.confidence),
        priority: Priority::High,
    })
}

/// Inspect bag filters when particulate emissions risk a limit breach
pub fn pm_risk_rule(prediction: &PmRiskPrediction) -> Option<Recommendation> {
    if prediction.risk_probability <= PM_RISK_THRESHOLD {
        return None;
    }

    Some(Recommendation {
        title: "💨 Bag Filter Maintenance Required".to_string(),
        description: format!(
            "{} risk of PM emissions exceeding limits.",
            prediction.risk_level
        ),
        action: format!(
            "Schedule bag filter inspection. Current DP: {} kPa",
            decimal(prediction.filter_dp_kpa)
        ),
        impact: "Maintain compliance, avoid penalties".to_string(),
        savings_usd: PM_RISK_SAVINGS_USD,
        confidence_pct: confidence_pct(prediction.confidence),
        priority: Priority::Medium,
    })
}

/// Run every rule in order and collect what fires
pub fn derive_recommendations(predictions: &PredictionSet) -> Vec<Recommendation> {
    [
        maintenance_rule(&predictions.maintenance),
        tsr_rule(&predictions.tsr),
        energy_rule(&predictions.energy),
        pm_risk_rule(&predictions.pm_risk),
    ]
    .into_iter()
    .flatten()
    .collect()
}
