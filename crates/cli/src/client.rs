//! API client for communicating with the optimizer API

use anyhow::{Context, Result};
use optimizer_lib::predictor::PlantSummary;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the optimizer API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let (status, text) = self.get_raw(path).await?;

        if !status.is_success() {
            anyhow::bail!("API error ({}): {}", status, text);
        }

        serde_json::from_str(&text).context("Failed to parse response")
    }

    /// GET whose error responses carry the same body type as successes
    pub async fn get_with_status<T: DeserializeOwned>(&self, path: &str) -> Result<(StatusCode, T)> {
        let (status, text) = self.get_raw(path).await?;
        parse_with_status(status, &text)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let (status, text) = self.post_raw(path, body).await?;

        if !status.is_success() {
            anyhow::bail!("API error ({}): {}", status, text);
        }

        serde_json::from_str(&text).context("Failed to parse response")
    }

    /// POST whose error responses carry the same body type as successes
    pub async fn post_with_status<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(StatusCode, T)> {
        let (status, text) = self.post_raw(path, body).await?;
        parse_with_status(status, &text)
    }

    async fn get_raw(&self, path: &str) -> Result<(StatusCode, String)> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        read_body(response).await
    }

    async fn post_raw<B: Serialize>(&self, path: &str, body: &B) -> Result<(StatusCode, String)> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        read_body(response).await
    }
}

async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String)> {
    let status = response.status();
    let text = response.text().await.context("Failed to read response")?;
    Ok((status, text))
}

fn parse_with_status<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<(StatusCode, T)> {
    match serde_json::from_str(text) {
        Ok(parsed) => Ok((status, parsed)),
        Err(_) if !status.is_success() => anyhow::bail!("API error ({}): {}", status, text),
        Err(e) => Err(e).context("Failed to parse response"),
    }
}

// API response types not shared with the library

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub service: String,
    pub version: String,
    pub models_ready: bool,
    pub models_count: usize,
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyHealth {
    pub status: String,
    pub timestamp: String,
    pub bigquery_connected: bool,
    pub models_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantStatus {
    pub status: String,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    pub summary: PlantSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}
