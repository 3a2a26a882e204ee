//! Model deployment status command

use anyhow::Result;
use optimizer_lib::model_status::{DeploymentStatus, ModelStatusReport};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_status, print_heading, print_json, print_table, print_warning, yes_no, OutputFormat,
};

/// Row for the models table
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Show which of the eight models are deployed
pub async fn show_models(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let report: ModelStatusReport = client.get("api/models/status").await?;

    if format == OutputFormat::Json {
        return print_json(&report);
    }

    print_heading("Model Status");
    match &report {
        ModelStatusReport::Deployed {
            models_count,
            expected_count,
            models,
            ..
        } => {
            println!("Deployed:               {}/{}", models_count, expected_count);
            println!("All ready:              {}", yes_no(report.all_ready()));
            println!();

            let rows: Vec<ModelRow> = models
                .iter()
                .map(|m| ModelRow {
                    name: m.model_name.clone(),
                    status: color_status(match m.status {
                        DeploymentStatus::Active => "ACTIVE",
                        DeploymentStatus::Pending => "PENDING",
                    }),
                })
                .collect();
            print_table(rows);
        }
        ModelStatusReport::Configured { models, note, .. } => {
            println!("All ready:              {}", yes_no(report.all_ready()));
            print_warning(note);
            println!();

            let rows: Vec<ModelRow> = models
                .iter()
                .map(|name| ModelRow {
                    name: name.clone(),
                    status: "unverified".to_string(),
                })
                .collect();
            print_table(rows);
        }
    }

    Ok(())
}
