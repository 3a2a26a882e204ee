//! Comprehensive prediction command

use anyhow::{Context, Result};
use colored::Colorize;
use optimizer_lib::{ComprehensivePrediction, ModelFamily, PlantMetrics};
use serde_json::{Map, Value};
use std::path::Path;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_priority, format_timestamp, format_usd, print_heading, print_json, print_table,
    print_warning, OutputFormat,
};

/// Row for the per-model table
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    model: &'static str,
    #[tabled(rename = "Prediction")]
    headline: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

/// Row for the recommendations table
#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Savings/day")]
    savings: String,
}

/// Split `key=value`; numeric values become JSON numbers
pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("Expected key=value, got '{}'", raw))?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() {
        anyhow::bail!("Missing metric name in '{}'", raw);
    }

    let value = match value.parse::<f64>() {
        Ok(number) => serde_json::Number::from_f64(number)
            .map(Value::Number)
            .with_context(|| format!("Metric {} must be finite", key))?,
        Err(_) => Value::String(value.to_string()),
    };
    Ok((key.to_string(), value))
}

/// Metrics from an optional JSON file with `--set` overrides applied.
/// Unspecified metrics take their nominal values.
pub fn build_metrics(file: Option<&Path>, assignments: &[String]) -> Result<PlantMetrics> {
    let mut fields: Map<String, Value> = match file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read metrics file {}", path.display()))?;
            serde_json::from_str(&raw).context("Metrics file must contain a JSON object")?
        }
        None => Map::new(),
    };

    let known = serde_json::to_value(PlantMetrics::default())?;
    for raw in assignments {
        let (key, value) = parse_assignment(raw)?;
        if known.get(&key).is_none() {
            anyhow::bail!("Unknown metric '{}'", key);
        }
        fields.insert(key, value);
    }

    serde_json::from_value(Value::Object(fields)).context("Invalid plant metrics")
}

fn model_rows(prediction: &ComprehensivePrediction) -> Vec<ModelRow> {
    let p = prediction;
    let rows = [
        (
            ModelFamily::Energy,
            format!(
                "{} kWh/t ({}% savings)",
                p.energy_prediction.predicted_kwh_per_ton, p.energy_prediction.savings_pct
            ),
            p.energy_prediction.confidence,
        ),
        (
            ModelFamily::Quality,
            format!(
                "score {} ({:?})",
                p.quality_prediction.predicted_quality_score, p.quality_prediction.status
            ),
            p.quality_prediction.confidence,
        ),
        (
            ModelFamily::PmRisk,
            format!(
                "{}% risk ({})",
                p.pm_risk_prediction.risk_probability, p.pm_risk_prediction.risk_level
            ),
            p.pm_risk_prediction.confidence,
        ),
        (
            ModelFamily::Tsr,
            format!(
                "optimal TSR {}%, CO2 -{}%",
                p.tsr_optimization.optimal_tsr_pct, p.tsr_optimization.predicted_co2_reduction_pct
            ),
            p.tsr_optimization.confidence,
        ),
        (
            ModelFamily::Maintenance,
            format!(
                "{}% failure ({})",
                p.maintenance_prediction.failure_probability, p.maintenance_prediction.risk_level
            ),
            p.maintenance_prediction.confidence,
        ),
        (
            ModelFamily::HeatLoss,
            format!(
                "{} kW recoverable",
                p.heat_loss_prediction.total_recoverable_kw
            ),
            p.heat_loss_prediction.confidence,
        ),
        (
            ModelFamily::Mill,
            format!(
                "separator {} rpm ({:+} rpm)",
                p.mill_optimization.optimal_separator_speed_rpm,
                p.mill_optimization.speed_adjustment_rpm
            ),
            p.mill_optimization.confidence,
        ),
        (
            ModelFamily::Throughput,
            format!(
                "{} t/h (+{}%)",
                p.throughput_forecast.predicted_throughput_tph,
                p.throughput_forecast.throughput_increase_pct
            ),
            p.throughput_forecast.confidence,
        ),
    ];

    rows.into_iter()
        .map(|(family, headline, confidence)| ModelRow {
            model: family.model_name(),
            headline,
            confidence: format!("{}%", confidence),
        })
        .collect()
}

/// Run all models against the given metrics
pub async fn predict(
    client: &ApiClient,
    file: Option<&Path>,
    assignments: &[String],
    format: OutputFormat,
) -> Result<()> {
    let metrics = build_metrics(file, assignments)?;
    let prediction: ComprehensivePrediction = client
        .post("api/predict-comprehensive", &metrics)
        .await?;

    match format {
        OutputFormat::Json => print_json(&prediction)?,
        OutputFormat::Table => {
            print_heading("Comprehensive Prediction");
            print_table(model_rows(&prediction));
            println!();

            if prediction.recommendations.is_empty() {
                print_warning("No recommendations for these metrics");
            } else {
                println!("{}", "Recommendations".bold());
                let rows: Vec<RecommendationRow> = prediction
                    .recommendations
                    .iter()
                    .map(|r| RecommendationRow {
                        priority: color_priority(r.priority),
                        title: r.title.clone(),
                        action: r.action.clone(),
                        savings: format_usd(r.savings_usd),
                    })
                    .collect();
                print_table(rows);
            }

            println!();
            println!(
                "{} {}",
                "Total Savings/day:".bold(),
                format_usd(prediction.total_savings_per_day).green().bold()
            );
            println!(
                "Generated at: {}",
                format_timestamp(&prediction.timestamp).dimmed()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_assignment() {
        let (key, value) = parse_assignment("tsr_pct=52.5").unwrap();
        assert_eq!(key, "tsr_pct");
        assert_eq!(value, serde_json::json!(52.5));

        let (_, value) = parse_assignment("blaine = 3400").unwrap();
        assert_eq!(value, serde_json::json!(3400.0));

        let (_, value) = parse_assignment("lsf=high").unwrap();
        assert_eq!(value, serde_json::json!("high"));

        assert!(parse_assignment("tsr_pct").is_err());
        assert!(parse_assignment("=5").is_err());
    }

    #[test]
    fn test_build_metrics_defaults() {
        let metrics = build_metrics(None, &[]).unwrap();
        assert_eq!(metrics, PlantMetrics::default());
    }

    #[test]
    fn test_build_metrics_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tsr_pct": 40, "feed_rate_tph": 900}}"#).unwrap();

        let metrics =
            build_metrics(Some(file.path()), &["tsr_pct=55".to_string()]).unwrap();

        assert_eq!(metrics.tsr_pct, 55.0);
        assert_eq!(metrics.feed_rate_tph, 900.0);
        assert_eq!(metrics.blaine, PlantMetrics::default().blaine);
    }

    #[test]
    fn test_build_metrics_rejects_unknown_names() {
        let err = build_metrics(None, &["kiln_speed=3".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Unknown metric 'kiln_speed'"));
    }

    #[test]
    fn test_build_metrics_rejects_non_object_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();

        assert!(build_metrics(Some(file.path()), &[]).is_err());
    }
}
