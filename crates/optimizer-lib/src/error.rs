//! Error types shared across the optimizer library

use crate::models::ModelFamily;
use thiserror::Error;

/// Failure reported by a prediction provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("model {model} unavailable: {message}")]
    Unavailable { model: &'static str, message: String },

    #[error("model {model} returned an invalid payload: {message}")]
    InvalidPayload { model: &'static str, message: String },
}

/// Failure of a comprehensive prediction. There is no partial result.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("provider answered {expected} request with a {actual} payload")]
    FamilyMismatch {
        expected: ModelFamily,
        actual: ModelFamily,
    },
}

/// Failure talking to the warehouse
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("warehouse client not initialized: {0}")]
    NotConnected(String),

    #[error("invalid table identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("warehouse request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("warehouse rejected query ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("warehouse task failed: {0}")]
    Task(String),

    #[error("unexpected warehouse response: {0}")]
    Response(String),
}

/// Failure loading a knowledge catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog is empty")]
    Empty,

    #[error("duplicate chunk_id in catalog: {0}")]
    DuplicateKey(String),
}

/// Failure of the generative chat backend
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat backend rejected request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("chat backend returned no text")]
    EmptyResponse,

    #[error("invalid chat endpoint: {0}")]
    InvalidEndpoint(String),
}
