//! Prompt construction and the rule-based responder

use super::types::{ChatRequest, PredictionSnapshot};
use crate::predictor::ENERGY_COST_PER_KWH_USD;
use crate::text::{decimal, thousands};

const DEFAULT_PERSONA: &str =
    "You are CementAI Assistant, an expert AI advisor for cement plant optimization.";

const GENERIC_REPLY: &str = "I can help you with energy optimization, CO2 reduction, quality control, and maintenance predictions. What would you like to know?";

/// Persona plus the current plant status block
pub fn build_system_prompt(request: &ChatRequest) -> String {
    let persona = request
        .system_prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PERSONA);
    let snapshot = &request.context.current_predictions;

    format!(
        "{persona}\n\n\
         Current Plant Status:\n\
         - Total Daily Savings: ${total}\n\
         - Energy Efficiency: {energy}% potential savings\n\
         - Quality Score: {quality}\n\
         - CO2 Reduction: {co2}%\n\
         - Maintenance Risk: {risk}\n\n\
         Provide concise, actionable advice. Use specific numbers from the data. \
         Keep responses under 150 words.",
        total = thousands(snapshot.total_savings_per_day.unwrap_or(0.0)),
        energy = shown(snapshot.energy_savings_pct()),
        quality = shown(snapshot.quality_score()),
        co2 = shown(snapshot.co2_reduction_pct()),
        risk = snapshot.maintenance_risk_level(),
    )
}

/// Answer from the latest predictions by keyword
pub fn fallback_reply(message: &str, snapshot: &PredictionSnapshot) -> String {
    let message = message.to_lowercase();

    if message.contains("energy") {
        let monthly = snapshot.energy_savings_kwh() * 850.0 * 24.0 * ENERGY_COST_PER_KWH_USD;
        format!(
            "Based on current data, you can save {}% on energy costs by optimizing fan speeds and feed rates. This could save approximately ${:.0} per month.",
            shown(snapshot.energy_savings_pct()),
            monthly
        )
    } else if message.contains("co2") || message.contains("emission") {
        format!(
            "Your plant can reduce CO2 emissions by {}% by increasing TSR to {}%. This saves {} tons of CO2 daily.",
            shown(snapshot.co2_reduction_pct()),
            shown(snapshot.optimal_tsr_pct()),
            snapshot.co2_saved_tons_per_day()
        )
    } else if message.contains("maintenance") {
        format!(
            "Priority: {} maintenance risk detected with {}% failure probability. Immediate inspection recommended for critical equipment.",
            snapshot.maintenance_risk_level(),
            snapshot.failure_probability()
        )
    } else {
        GENERIC_REPLY.to_string()
    }
}

/// Payload floats keep their decimal point; absent fields read as `0`
fn shown(value: Option<f64>) -> String {
    value.map(decimal).unwrap_or_else(|| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::{EnergySnapshot, MaintenanceSnapshot, TsrSnapshot};

    fn snapshot() -> PredictionSnapshot {
        PredictionSnapshot {
            total_savings_per_day: Some(59400.0),
            energy_prediction: Some(EnergySnapshot {
                savings_pct: Some(3.6),
                potential_savings_kwh: Some(2.5),
            }),
            quality_prediction: None,
            tsr_optimization: Some(TsrSnapshot {
                predicted_co2_reduction_pct: Some(24.3),
                optimal_tsr_pct: Some(52.0),
                co2_saved_tons_per_day: Some(151.0),
            }),
            maintenance_prediction: Some(MaintenanceSnapshot {
                risk_level: Some("Critical".to_string()),
                failure_probability: Some(93.0),
            }),
        }
    }

    #[test]
    fn test_energy_reply_includes_monthly_estimate() {
        let reply = fallback_reply("How can I cut ENERGY use?", &snapshot());
        assert_eq!(
            reply,
            "Based on current data, you can save 3.6% on energy costs by optimizing fan speeds and feed rates. This could save approximately $4080 per month."
        );
    }

    #[test]
    fn test_emissions_reply() {
        let reply = fallback_reply("what about emissions", &snapshot());
        assert_eq!(
            reply,
            "Your plant can reduce CO2 emissions by 24.3% by increasing TSR to 52.0%. This saves 151 tons of CO2 daily."
        );
        assert!(fallback_reply("CO2 outlook?", &snapshot()).starts_with("Your plant"));
    }

    #[test]
    fn test_whole_number_percentages_keep_decimal_point() {
        let mut snapshot = snapshot();
        snapshot.energy_prediction = Some(EnergySnapshot {
            savings_pct: Some(4.0),
            potential_savings_kwh: Some(3.0),
        });
        snapshot.tsr_optimization = Some(TsrSnapshot {
            predicted_co2_reduction_pct: Some(24.0),
            optimal_tsr_pct: Some(52.0),
            co2_saved_tons_per_day: Some(151.0),
        });

        assert!(fallback_reply("energy", &snapshot).contains("save 4.0% on energy"));
        assert!(fallback_reply("co2", &snapshot)
            .starts_with("Your plant can reduce CO2 emissions by 24.0% by increasing TSR to 52.0%."));
    }

    #[test]
    fn test_maintenance_reply() {
        let reply = fallback_reply("maintenance plan", &snapshot());
        assert_eq!(
            reply,
            "Priority: Critical maintenance risk detected with 93% failure probability. Immediate inspection recommended for critical equipment."
        );
    }

    #[test]
    fn test_energy_keyword_wins_over_later_topics() {
        let reply = fallback_reply("energy and maintenance", &snapshot());
        assert!(reply.starts_with("Based on current data"));
    }

    #[test]
    fn test_generic_reply_without_context() {
        let reply = fallback_reply("hello", &PredictionSnapshot::default());
        assert_eq!(reply, GENERIC_REPLY);

        let reply = fallback_reply("maintenance", &PredictionSnapshot::default());
        assert!(reply.starts_with("Priority: Unknown maintenance risk detected with 0%"));
    }

    #[test]
    fn test_system_prompt_embeds_plant_status() {
        let mut request = ChatRequest::new("hi");
        request.context.current_predictions = snapshot();
        let prompt = build_system_prompt(&request);

        assert!(prompt.starts_with(DEFAULT_PERSONA));
        assert!(prompt.contains("- Total Daily Savings: $59,400"));
        assert!(prompt.contains("- Energy Efficiency: 3.6% potential savings"));
        assert!(prompt.contains("- Quality Score: 0"));
        assert!(prompt.contains("- CO2 Reduction: 24.3%"));
        assert!(prompt.contains("- Maintenance Risk: Critical"));
    }

    #[test]
    fn test_custom_persona_replaces_default() {
        let mut request = ChatRequest::new("hi");
        request.system_prompt = Some("You are a kiln operator's aide.".to_string());

        let prompt = build_system_prompt(&request);
        assert!(prompt.starts_with("You are a kiln operator's aide."));
        assert!(!prompt.contains(DEFAULT_PERSONA));
    }
}
