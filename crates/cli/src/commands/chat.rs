//! Plant assistant command

use anyhow::{Context, Result};
use colored::Colorize;
use optimizer_lib::chat::{ChatContext, PredictionSnapshot, ReplySource};
use optimizer_lib::{ChatReply, ChatRequest};
use std::path::Path;

use crate::client::ApiClient;
use crate::output::{print_json, OutputFormat};

/// Context from a saved prediction, e.g. the JSON output of `predict`
pub fn load_context(path: &Path) -> Result<ChatContext> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read prediction file {}", path.display()))?;
    let current_predictions: PredictionSnapshot =
        serde_json::from_str(&raw).context("Prediction file is not valid JSON")?;
    Ok(ChatContext {
        current_predictions,
    })
}

/// Ask the plant assistant one question
pub async fn ask(
    client: &ApiClient,
    message: &str,
    context_file: Option<&Path>,
    system_prompt: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let mut request = ChatRequest::new(message);
    if let Some(path) = context_file {
        request.context = load_context(path)?;
    }
    request.system_prompt = system_prompt;

    let reply: ChatReply = client.post("api/chat", &request).await?;

    match format {
        OutputFormat::Json => print_json(&reply)?,
        OutputFormat::Table => {
            println!("{}", reply.response);
            if reply.source == ReplySource::Fallback {
                println!();
                println!("{}", "(rule-based answer)".dimmed());
            }
        }
    }

    Ok(())
}
