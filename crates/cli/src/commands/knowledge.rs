//! Knowledge corpus commands

use anyhow::Result;
use optimizer_lib::UpsertResult;

use crate::client::{ApiClient, RefreshRequest};
use crate::output::{format_timestamp, print_error, print_info, print_json, print_success, OutputFormat};

/// Merge the knowledge catalog into the warehouse.
/// An error result is printed and then returned as a failure.
pub async fn refresh(client: &ApiClient, table: Option<String>, format: OutputFormat) -> Result<()> {
    let request = RefreshRequest { table };
    let (_, result): (_, UpsertResult) = client
        .post_with_status("api/knowledge/refresh", &request)
        .await?;

    if format == OutputFormat::Json {
        print_json(&result)?;
    }

    match result {
        UpsertResult::Success {
            batch_id,
            rows_affected,
            timestamp,
            message,
        } => {
            if format == OutputFormat::Table {
                print_success(&message);
                print_info(&format!("Batch {} affected {} rows", batch_id, rows_affected));
                print_info(&format!(
                    "Completed at {}",
                    format_timestamp(&timestamp.to_rfc3339())
                ));
            }
            Ok(())
        }
        UpsertResult::Error { error, .. } => {
            if format == OutputFormat::Table {
                print_error(&error);
            }
            anyhow::bail!("Knowledge refresh failed: {}", error)
        }
    }
}
