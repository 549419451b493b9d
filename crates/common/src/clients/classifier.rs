//! Rhetorical role classifier client
//!
//! Sends the title and abstract of both endpoints of a citation edge
//! to an OpenAI-style chat completion endpoint and decodes the JSON
//! verdict into a [`RoleAssignment`]. Missing titles or abstracts
//! degrade to empty strings; the request is still issued with whatever
//! text is available.

use crate::errors::{PipelineError, Result};
use crate::models::CitationRole;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Titles and abstracts for both endpoints of one edge
#[derive(Debug, Clone, Default)]
pub struct EdgeTextPair {
    pub source_title: String,
    pub source_abstract: String,
    pub target_title: String,
    pub target_abstract: String,
}

/// Classifier verdict for one edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: CitationRole,
    pub confidence: Option<f32>,
    pub reason: Option<String>,
}

/// Trait for edge role classification
#[async_trait]
pub trait RoleClassifier: Send + Sync {
    /// Classify why the source paper cites the target paper
    ///
    /// Fails with `Classification` on a malformed response; callers
    /// leave the edge at `UNKNOWN` and count the failure rather than
    /// aborting the run.
    async fn classify(&self, pair: &EdgeTextPair) -> Result<RoleAssignment>;
}

const SYSTEM_PROMPT: &str = "You classify the rhetorical relationship between two academic \
papers. Paper A cites Paper B. Given both titles and abstracts, answer with a JSON object \
{\"role\": \"SUPPORT\" | \"DISPUTE\" | \"BACKGROUND\" | \"METHOD\", \"confidence\": number \
between 0 and 1, \"reason\": short explanation}. Prefer BACKGROUND or METHOD when support or \
dispute cannot be clearly inferred.";

/// OpenAI-backed classifier
pub struct OpenAiClassifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct Verdict {
    role: Option<String>,
    confidence: Option<f32>,
    reason: Option<String>,
}

impl OpenAiClassifier {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config {
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }

    fn user_message(pair: &EdgeTextPair) -> String {
        format!(
            "Classify the relationship between these two papers.\n\n\
             Paper A (citing):\nTITLE: {}\nABSTRACT: {}\n\n\
             Paper B (cited):\nTITLE: {}\nABSTRACT: {}\n",
            pair.source_title, pair.source_abstract, pair.target_title, pair.target_abstract
        )
    }
}

#[async_trait]
impl RoleClassifier for OpenAiClassifier {
    async fn classify(&self, pair: &EdgeTextPair) -> Result<RoleAssignment> {
        let request = ChatRequest {
            model: self.model.clone(),
            response_format: ResponseFormat { kind: "json_object" },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_message(pair),
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        match response.status() {
            status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
                return Err(PipelineError::Transient {
                    message: format!("Classifier returned {status}"),
                });
            }
            status if !status.is_success() => {
                return Err(PipelineError::Classification {
                    message: format!("Classifier returned {status}"),
                });
            }
            _ => {}
        }

        let chat: ChatResponse =
            response.json().await.map_err(|e| PipelineError::Classification {
                message: format!("Failed to decode classifier response: {e}"),
            })?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PipelineError::Classification {
                message: "Classifier response has no choices".into(),
            })?;

        parse_verdict(&content)
    }
}

/// Decode the model's JSON verdict into a role assignment
///
/// Out-of-vocabulary role labels collapse to `Background`; content
/// that is not valid JSON is a classification failure.
pub fn parse_verdict(content: &str) -> Result<RoleAssignment> {
    let verdict: Verdict =
        serde_json::from_str(content).map_err(|e| PipelineError::Classification {
            message: format!("Classifier verdict is not valid JSON: {e}"),
        })?;

    let role = match verdict.role {
        Some(label) => CitationRole::from_label(&label),
        None => CitationRole::Background,
    };
    let confidence = verdict.confidence.map(|c| c.clamp(0.0, 1.0));

    Ok(RoleAssignment {
        role,
        confidence,
        reason: verdict.reason,
    })
}
