//! Service and plant status commands

use anyhow::Result;
use colored::Colorize;
use optimizer_lib::HealthResponse;
use serde::Serialize;
use tabled::Tabled;

use crate::client::{ApiClient, LegacyHealth, PlantStatus, ServiceInfo};
use crate::output::{
    color_status, format_timestamp, print_heading, print_json, print_table, yes_no, OutputFormat,
};

/// Row for the component health table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

#[derive(Serialize)]
struct StatusReport {
    service: ServiceInfo,
    health: LegacyHealth,
    components: HealthResponse,
}

/// Service identity, warehouse connection and component health
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let service: ServiceInfo = client.get("/").await?;
    let health: LegacyHealth = client.get("health").await?;
    // healthz answers 503 with the same body when a component is unhealthy
    let (_, components): (_, HealthResponse) = client.get_with_status("healthz").await?;

    match format {
        OutputFormat::Json => print_json(&StatusReport {
            service,
            health,
            components,
        })?,
        OutputFormat::Table => {
            print_heading(&service.service);
            println!("Status:                 {}", color_status(&service.status));
            println!("Version:                {}", service.version.cyan());
            println!("Warehouse connected:    {}", yes_no(health.bigquery_connected));
            println!("Models ready:           {}", yes_no(service.models_ready));
            println!("Models configured:      {}", service.models_count);
            println!();

            let mut rows: Vec<ComponentRow> = components
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(&format!("{:?}", component.status)),
                    message: component.message.clone().unwrap_or_default(),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            print_table(rows);

            println!();
            println!("Checked at: {}", format_timestamp(&health.timestamp).dimmed());
        }
    }

    Ok(())
}

/// 24-hour plant aggregates
pub async fn show_plant(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let plant: PlantStatus = client.get("api/plant-status").await?;

    match format {
        OutputFormat::Json => print_json(&plant)?,
        OutputFormat::Table => {
            let s = &plant.summary;
            print_heading("Plant Status (24h)");
            println!("Energy:                 {} kWh/t", s.avg_energy_24h);
            println!("Quality:                {}", s.avg_quality_24h);
            println!("TSR:                    {}%", s.avg_tsr_24h);
            println!("CO2 reduction:          {}%", s.avg_co2_reduction_24h);
            println!("Plant efficiency:       {}%", s.plant_efficiency);
            println!("Uptime:                 {}%", s.uptime_pct.to_string().green());
        }
    }

    Ok(())
}
