//! BigQuery REST backend
//!
//! Statements go through `jobs.query` in standard SQL with named
//! parameters. Row values are always bound, never spliced into SQL text.

use super::{validate_identifier, Warehouse};
use crate::error::WarehouseError;
use crate::knowledge::KnowledgeChunk;
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BIGQUERY_ENDPOINT: &str = "https://bigquery.googleapis.com";

/// Server-side wait for a synchronous query
const QUERY_TIMEOUT_MS: u64 = 60_000;

/// Column layout of a knowledge table, in `INSERT` order
const CHUNK_COLUMNS: [(&str, &str); 8] = [
    ("chunk_id", "STRING"),
    ("topic", "STRING"),
    ("title", "STRING"),
    ("content", "STRING"),
    ("url", "STRING"),
    ("word_count", "INT64"),
    ("batch_id", "STRING"),
    ("last_updated", "TIMESTAMP"),
];

#[derive(Debug, Clone)]
pub struct BigQueryConfig {
    pub endpoint: String,
    pub project_id: String,
    pub dataset_id: String,
    pub access_token: String,
    pub timeout: Duration,
}

impl BigQueryConfig {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: DEFAULT_BIGQUERY_ENDPOINT.to_string(),
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            access_token: access_token.into(),
            timeout: Duration::from_secs(90),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

pub struct BigQueryClient {
    client: Client,
    query_url: Url,
    project_id: String,
    dataset_id: String,
    access_token: String,
}

impl BigQueryClient {
    pub fn new(config: BigQueryConfig) -> Result<Self, WarehouseError> {
        validate_identifier(&config.project_id)?;
        validate_identifier(&config.dataset_id)?;

        let mut endpoint = config.endpoint.clone();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let query_url = Url::parse(&endpoint)
            .and_then(|base| {
                base.join(&format!("bigquery/v2/projects/{}/queries", config.project_id))
            })
            .map_err(|e| WarehouseError::Response(format!("invalid endpoint: {}", e)))?;

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            query_url,
            project_id: config.project_id,
            dataset_id: config.dataset_id,
            access_token: config.access_token,
        })
    }

    fn qualified(&self, table: &str) -> Result<String, WarehouseError> {
        let table = validate_identifier(table)?;
        Ok(format!("`{}.{}.{}`", self.project_id, self.dataset_id, table))
    }

    /// MERGE reading its source rows from the `@chunks` parameter
    pub fn merge_statement(&self, table: &str) -> Result<String, WarehouseError> {
        let target = self.qualified(table)?;
        let columns: Vec<&str> = CHUNK_COLUMNS.iter().map(|(name, _)| *name).collect();
        let updates = columns[1..]
            .iter()
            .map(|c| format!("{c} = source.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let column_list = columns.join(", ");

        Ok(format!(
            "MERGE {target} AS target \
             USING (SELECT * FROM UNNEST(@chunks)) AS source \
             ON target.chunk_id = source.chunk_id \
             WHEN MATCHED THEN UPDATE SET {updates} \
             WHEN NOT MATCHED THEN INSERT ({column_list}) VALUES ({column_list})"
        ))
    }

    fn models_statement(&self) -> String {
        format!(
            "SELECT table_name AS model_name FROM `{}.{}.INFORMATION_SCHEMA.TABLES` \
             WHERE table_type = 'MODEL' ORDER BY table_name",
            self.project_id, self.dataset_id
        )
    }

    async fn run_query(&self, request: &QueryRequest) -> Result<QueryResponse, WarehouseError> {
        let response = self
            .client
            .post(self.query_url.clone())
            .bearer_auth(&self.access_token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), message = %message, "BigQuery query rejected");
            return Err(WarehouseError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: QueryResponse = response.json().await?;
        if parsed.job_complete == Some(false) {
            return Err(WarehouseError::Response(
                "query did not complete within the request timeout".to_string(),
            ));
        }
        Ok(parsed)
    }
}

fn chunks_parameter(rows: &[KnowledgeChunk]) -> QueryParameter {
    let struct_types = CHUNK_COLUMNS
        .iter()
        .map(|&(name, kind)| StructField {
            name,
            kind: ParameterType::scalar(kind),
        })
        .collect();

    let array_values = rows
        .iter()
        .map(|row| {
            let values = [
                row.chunk_id.clone(),
                row.topic.clone(),
                row.title.clone(),
                row.content.clone(),
                row.url.clone(),
                row.word_count.to_string(),
                row.batch_id.to_string(),
                row.last_updated.to_rfc3339_opts(SecondsFormat::Micros, true),
            ];
            ParameterValue {
                struct_values: CHUNK_COLUMNS
                    .iter()
                    .map(|(name, _)| *name)
                    .zip(values)
                    .map(|(name, value)| (name, ParameterValue::scalar(value)))
                    .collect(),
                ..Default::default()
            }
        })
        .collect();

    QueryParameter {
        name: "chunks",
        parameter_type: ParameterType {
            kind: "ARRAY",
            array_type: Some(Box::new(ParameterType {
                kind: "STRUCT",
                array_type: None,
                struct_types,
            })),
            struct_types: Vec::new(),
        },
        parameter_value: ParameterValue {
            array_values,
            ..Default::default()
        },
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    fn backend(&self) -> &'static str {
        "bigquery"
    }

    async fn merge_knowledge(
        &self,
        table: &str,
        rows: &[KnowledgeChunk],
    ) -> Result<u64, WarehouseError> {
        let request = QueryRequest {
            query: self.merge_statement(table)?,
            use_legacy_sql: false,
            parameter_mode: "NAMED",
            query_parameters: vec![chunks_parameter(rows)],
            timeout_ms: QUERY_TIMEOUT_MS,
        };

        let response = self.run_query(&request).await?;
        let affected = response
            .num_dml_affected_rows
            .ok_or_else(|| WarehouseError::Response("missing numDmlAffectedRows".to_string()))?
            .parse::<u64>()
            .map_err(|e| WarehouseError::Response(format!("numDmlAffectedRows: {}", e)))?;

        debug!(table, affected, "BigQuery MERGE complete");
        Ok(affected)
    }

    async fn list_deployed_model_names(&self) -> Result<BTreeSet<String>, WarehouseError> {
        let request = QueryRequest {
            query: self.models_statement(),
            use_legacy_sql: false,
            parameter_mode: "NAMED",
            query_parameters: Vec::new(),
            timeout_ms: QUERY_TIMEOUT_MS,
        };

        let response = self.run_query(&request).await?;
        Ok(response
            .rows
            .into_iter()
            .filter_map(|row| row.f.into_iter().next())
            .filter_map(|cell| cell.v.as_str().map(str::to_string))
            .collect())
    }
}

// jobs.query wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    query: String,
    use_legacy_sql: bool,
    parameter_mode: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    query_parameters: Vec<QueryParameter>,
    timeout_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryParameter {
    name: &'static str,
    parameter_type: ParameterType,
    parameter_value: ParameterValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParameterType {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    array_type: Option<Box<ParameterType>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    struct_types: Vec<StructField>,
}

impl ParameterType {
    fn scalar(kind: &'static str) -> Self {
        Self {
            kind,
            array_type: None,
            struct_types: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct StructField {
    name: &'static str,
    #[serde(rename = "type")]
    kind: ParameterType,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParameterValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    array_values: Vec<ParameterValue>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    struct_values: BTreeMap<&'static str, ParameterValue>,
}

impl ParameterValue {
    fn scalar(value: String) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: Option<bool>,
    #[serde(default)]
    num_dml_affected_rows: Option<String>,
    #[serde(default)]
    rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    v: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
