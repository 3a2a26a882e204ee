//! Plant assistant chat
//!
//! Questions go to a generative backend with the latest predictions in the
//! prompt. When no backend is configured, or the backend fails, a
//! rule-based responder answers from the same predictions.

mod gemini;
mod prompt;
mod types;

pub use gemini::{
    GeminiClient, GeminiConfig, GenerationConfig, DEFAULT_GEMINI_LOCATION, DEFAULT_GEMINI_MODEL,
};
pub use prompt::{build_system_prompt, fallback_reply};
pub use types::{
    ChatContext, ChatReply, ChatRequest, ChatRole, ChatTurn, EnergySnapshot, MaintenanceSnapshot,
    PredictionSnapshot, QualitySnapshot, ReplySource, TsrSnapshot,
};

use crate::error::ChatError;
use crate::observability::{OptimizerMetrics, StructuredLogger};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

/// Everything a backend needs to answer one question
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub history: Vec<ChatTurn>,
    pub message: String,
}

impl ChatPrompt {
    pub fn from_request(request: &ChatRequest) -> Self {
        Self {
            system: build_system_prompt(request),
            history: request.history.clone(),
            message: request.message.clone(),
        }
    }
}

/// Trait for generative chat backends
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &ChatPrompt) -> Result<String, ChatError>;
}

#[derive(Clone)]
pub struct ChatService {
    backend: Option<Arc<dyn ChatBackend>>,
    metrics: OptimizerMetrics,
    logger: StructuredLogger,
}

impl ChatService {
    pub fn new(backend: Option<Arc<dyn ChatBackend>>) -> Self {
        Self {
            backend,
            metrics: OptimizerMetrics::new(),
            logger: StructuredLogger::new("chat"),
        }
    }

    /// Service that always answers from rules
    pub fn rules_only() -> Self {
        Self::new(None)
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|b| b.name())
    }

    /// Answer one request. Never fails; backend errors select the fallback.
    pub async fn respond(&self, request: &ChatRequest) -> ChatReply {
        let failure = match &self.backend {
            Some(backend) => match backend.generate(&ChatPrompt::from_request(request)).await {
                Ok(text) => {
                    return ChatReply {
                        response: text,
                        timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
                        source: ReplySource::Generative,
                    }
                }
                Err(e) => Some(e.to_string()),
            },
            None => None,
        };

        self.metrics.inc_chat_fallbacks();
        self.logger.log_chat_fallback(failure.as_deref());
        ChatReply {
            response: fallback_reply(&request.message, &request.context.current_predictions),
            timestamp: None,
            source: ReplySource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn generate(&self, prompt: &ChatPrompt) -> Result<String, ChatError> {
            Ok(format!("echo: {}", prompt.message))
        }
    }

    struct BrokenBackend;

    #[async_trait]
    impl ChatBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn generate(&self, _prompt: &ChatPrompt) -> Result<String, ChatError> {
            Err(ChatError::EmptyResponse)
        }
    }

    #[tokio::test]
    async fn test_backend_reply_is_timestamped() {
        let service = ChatService::new(Some(Arc::new(EchoBackend)));
        let reply = service.respond(&ChatRequest::new("status?")).await;

        assert_eq!(reply.response, "echo: status?");
        assert_eq!(reply.source, ReplySource::Generative);
        assert!(reply.timestamp.is_some());
        assert_eq!(service.backend_name(), Some("echo"));
    }

    #[tokio::test]
    async fn test_backend_failure_uses_rules() {
        let service = ChatService::new(Some(Arc::new(BrokenBackend)));
        let mut request = ChatRequest::new("Any maintenance concerns?");
        request.context.current_predictions.maintenance_prediction = Some(MaintenanceSnapshot {
            risk_level: Some("High".to_string()),
            failure_probability: Some(88.0),
        });

        let reply = service.respond(&request).await;

        assert_eq!(reply.source, ReplySource::Fallback);
        assert!(reply.timestamp.is_none());
        assert!(reply
            .response
            .starts_with("Priority: High maintenance risk detected with 88% failure probability."));
    }

    #[tokio::test]
    async fn test_rules_only_service() {
        let service = ChatService::rules_only();
        let reply = service.respond(&ChatRequest::new("hello")).await;

        assert_eq!(reply.source, ReplySource::Fallback);
        assert!(reply.response.starts_with("I can help you with"));
        assert_eq!(service.backend_name(), None);
    }

    #[test]
    fn test_prompt_carries_history_and_message() {
        let mut request = ChatRequest::new("and now?");
        request.history.push(ChatTurn {
            role: ChatRole::User,
            content: "earlier".to_string(),
        });

        let prompt = ChatPrompt::from_request(&request);
        assert_eq!(prompt.history.len(), 1);
        assert_eq!(prompt.message, "and now?");
        assert!(prompt.system.contains("Current Plant Status:"));
    }
}
