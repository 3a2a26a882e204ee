//! Core library for the cement plant optimizer
//!
//! This crate provides the core functionality for:
//! - Plant metrics and per-model prediction payloads
//! - Recommendation synthesis across the eight model families
//! - Knowledge corpus upserts into the warehouse
//! - Generative chat with a rule-based fallback
//! - Health checks and observability

pub mod chat;
pub mod error;
pub mod health;
pub mod knowledge;
pub mod model_status;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod text;
pub mod warehouse;

pub use chat::{ChatReply, ChatRequest, ChatService};
pub use error::{CatalogError, ChatError, ProviderError, SynthesisError, WarehouseError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use knowledge::{KnowledgeCatalog, KnowledgeUpsertJob, UpsertResult};
pub use model_status::ModelStatusReport;
pub use models::*;
pub use observability::{OptimizerMetrics, StructuredLogger};
pub use predictor::{PredictionProvider, SimulatedProvider, Synthesizer};
pub use warehouse::{Warehouse, WarehouseHandle};
