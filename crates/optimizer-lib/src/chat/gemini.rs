//! Vertex AI Gemini `generateContent` client

use super::types::{ChatRole, ChatTurn};
use super::{ChatBackend, ChatPrompt};
use crate::error::ChatError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GEMINI_LOCATION: &str = "us-central1";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub project_id: String,
    pub location: String,
    pub model: String,
    /// Overrides `https://{location}-aiplatform.googleapis.com`
    pub endpoint: Option<String>,
    pub access_token: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: DEFAULT_GEMINI_LOCATION.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: None,
            access_token: access_token.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Sampling settings sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_output_tokens: 300,
            top_p: 0.8,
            top_k: 40,
        }
    }
}

pub struct GeminiClient {
    client: Client,
    url: Url,
    access_token: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ChatError> {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", config.location));
        let url = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            endpoint.trim_end_matches('/'),
            config.project_id,
            config.location,
            config.model
        );
        let url =
            Url::parse(&url).map_err(|e| ChatError::InvalidEndpoint(format!("{}: {}", url, e)))?;

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            url,
            access_token: config.access_token,
            generation: GenerationConfig::default(),
        })
    }

    fn request_body(&self, prompt: &ChatPrompt) -> GenerateRequest {
        let mut contents: Vec<Content> = prompt
            .history
            .iter()
            .filter_map(history_content)
            .collect();
        contents.push(Content {
            role: "user",
            parts: vec![Part {
                text: format!("User Question: {}", prompt.message),
            }],
        });

        GenerateRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: prompt.system.clone(),
                }],
            },
            contents,
            generation_config: self.generation,
        }
    }
}

/// Gemini knows only `user` and `model` turns
fn history_content(turn: &ChatTurn) -> Option<Content> {
    let role = match turn.role {
        ChatRole::User => "user",
        ChatRole::Assistant => "model",
        ChatRole::System | ChatRole::Other => return None,
    };
    if turn.content.trim().is_empty() {
        return None;
    }
    Some(Content {
        role,
        parts: vec![Part {
            text: turn.content.clone(),
        }],
    })
}

#[async_trait]
impl ChatBackend for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &ChatPrompt) -> Result<String, ChatError> {
        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.access_token)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ChatError::EmptyResponse);
        }
        debug!(chars = text.len(), "Gemini reply received");
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: SystemInstruction,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const MODEL_PATH: &str = "/v1/projects/cementai-optimiser/locations/us-central1/publishers/google/models/gemini-2.0-flash-exp:generateContent";

    fn client_for(server: &mockito::ServerGuard) -> GeminiClient {
        let mut config = GeminiConfig::new("cementai-optimiser", "token-123");
        config.endpoint = Some(server.url());
        GeminiClient::new(config).unwrap()
    }

    fn prompt() -> ChatPrompt {
        ChatPrompt {
            system: "You are CementAI Assistant.".to_string(),
            history: vec![
                ChatTurn {
                    role: ChatRole::User,
                    content: "hello".to_string(),
                },
                ChatTurn {
                    role: ChatRole::Assistant,
                    content: "hi there".to_string(),
                },
                ChatTurn {
                    role: ChatRole::Other,
                    content: "ignored".to_string(),
                },
            ],
            message: "How is the kiln?".to_string(),
        }
    }

    #[test]
    fn test_default_url_uses_location() {
        let client = GeminiClient::new(GeminiConfig::new("proj", "t")).unwrap();
        assert_eq!(
            client.url.as_str(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/proj/locations/us-central1/publishers/google/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn test_request_maps_roles_and_generation_config() {
        let client = GeminiClient::new(GeminiConfig::new("proj", "t")).unwrap();
        let body = serde_json::to_value(client.request_body(&prompt())).unwrap();

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "User Question: How is the kiln?");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 300);
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are CementAI Assistant."
        );
    }

    #[tokio::test]
    async fn test_generate_returns_candidate_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", MODEL_PATH)
            .match_header("authorization", "Bearer token-123")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {"maxOutputTokens": 300, "topK": 40}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "Kiln is "}, {"text": "stable."}]}}]}"#,
            )
            .create_async()
            .await;

        let text = client_for(&server).generate(&prompt()).await.unwrap();

        assert_eq!(text, "Kiln is stable.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", MODEL_PATH)
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let err = client_for(&server).generate(&prompt()).await.unwrap_err();
        assert!(matches!(err, ChatError::Api { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_candidates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let err = client_for(&server).generate(&prompt()).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyResponse));
    }
}
