// src/llm_extract.rs

use crate::config::{LlmBackend, LlmSection};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Field key → value as read off the checksheet.
pub type ScanFields = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Empty response from LLM")]
    EmptyResponse,

    #[error("No JSON object found in LLM response")]
    NoJson,

    #[error("Failed to parse LLM response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM response is JSON but not an object")]
    NotAnObject,

    #[error("{0} env var required for remote backend")]
    MissingApiKey(String),

    #[error("Ollama is not running at {0}. Start it with: ollama serve")]
    BackendUnreachable(String),
}

/// Reads checksheet fields from a photo.
#[async_trait]
pub trait VisionExtractor: Send + Sync {
    async fn extract(&self, image_jpeg: &[u8], prompt: &str) -> Result<ScanFields, ExtractError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Resolved endpoint configuration ready to make API calls.
#[derive(Debug)]
struct ResolvedEndpoint {
    base_url: String,
    model: String,
    api_key: String,
}

/// Resolve the LLM config section into a concrete endpoint.
fn resolve_endpoint(llm: &LlmSection) -> Result<ResolvedEndpoint, ExtractError> {
    match llm.backend {
        LlmBackend::Ollama => {
            info!(
                url = %llm.ollama.base_url,
                model = %llm.ollama.model,
                "Using Ollama (local) backend"
            );
            Ok(ResolvedEndpoint {
                base_url: llm.ollama.base_url.clone(),
                model: llm.ollama.model.clone(),
                api_key: "ollama".to_string(), // required by API but ignored
            })
        }
        LlmBackend::Remote => {
            let api_key = std::env::var(&llm.remote.api_key_env)
                .map_err(|_| ExtractError::MissingApiKey(llm.remote.api_key_env.clone()))?;
            info!(
                url = %llm.remote.base_url,
                model = %llm.remote.model,
                "Using remote API backend"
            );
            Ok(ResolvedEndpoint {
                base_url: llm.remote.base_url.clone(),
                model: llm.remote.model.clone(),
                api_key,
            })
        }
    }
}

/// Check if the Ollama server is reachable.
async fn check_ollama_health(client: &Client, base_url: &str) -> bool {
    // Ollama's health endpoint is at the root (not under /v1)
    let health_url = base_url.trim_end_matches('/').trim_end_matches("/v1");

    match client
        .get(health_url)
        .timeout(Duration::from_secs(3))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => true,
        Ok(resp) => {
            warn!(status = %resp.status(), "Ollama server returned non-OK status");
            false
        }
        Err(e) => {
            warn!(error = %e, "Ollama server not reachable");
            false
        }
    }
}

/// OpenAI-compatible `/chat/completions` client that sends the photo inline.
pub struct ChatVisionExtractor {
    client: Client,
    endpoint: ResolvedEndpoint,
    backend: LlmBackend,
    temperature: f64,
}

impl ChatVisionExtractor {
    pub fn from_config(llm: &LlmSection) -> Result<Self, ExtractError> {
        let endpoint = resolve_endpoint(llm)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            backend: llm.backend,
            temperature: llm.temperature,
        })
    }
}

#[async_trait]
impl VisionExtractor for ChatVisionExtractor {
    async fn extract(&self, image_jpeg: &[u8], prompt: &str) -> Result<ScanFields, ExtractError> {
        if self.backend == LlmBackend::Ollama
            && !check_ollama_health(&self.client, &self.endpoint.base_url).await
        {
            return Err(ExtractError::BackendUnreachable(
                self.endpoint.base_url.clone(),
            ));
        }

        let started = Instant::now();
        let request = ChatRequest {
            model: &self.endpoint.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:image/jpeg;base64,{}", STANDARD.encode(image_jpeg)),
                        },
                    },
                ],
            }],
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.endpoint.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.endpoint.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api { status, body });
        }

        let chat_response: ChatResponse = response.json().await?;
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ExtractError::EmptyResponse)?;

        let fields = parse_scan_fields(&content)?;
        info!(
            backend = ?self.backend,
            model = %self.endpoint.model,
            image_bytes = image_jpeg.len(),
            fields = fields.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "LLM extraction result"
        );
        Ok(fields)
    }
}

/// Turn the model's reply into a flat field map.
pub fn parse_scan_fields(content: &str) -> Result<ScanFields, ExtractError> {
    // Strip markdown fences if the model added them despite instructions
    let json_str = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let json_str = extract_json_object(json_str)?;

    let Value::Object(map) = serde_json::from_str::<Value>(json_str)? else {
        return Err(ExtractError::NotAnObject);
    };

    Ok(map
        .into_iter()
        .map(|(key, value)| (key, flatten_value(value)))
        .collect())
}

fn flatten_value(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Extract the outermost JSON object from a string that may contain
/// surrounding text.
fn extract_json_object(s: &str) -> Result<&str, ExtractError> {
    let start = s.find('{').ok_or(ExtractError::NoJson)?;
    let end = s.rfind('}').ok_or(ExtractError::NoJson)?;
    if end <= start {
        return Err(ExtractError::NoJson);
    }
    Ok(&s[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_reply() {
        let reply = "```json\n{\"no_batch\": \" 24c15/sb \", \"lebar\": 790, \"cof\": null}\n```";
        let fields = parse_scan_fields(reply).unwrap();
        assert_eq!(fields["no_batch"], "24c15/sb");
        assert_eq!(fields["lebar"], "790");
        assert_eq!(fields["cof"], "");
    }

    #[test]
    fn skips_leading_reasoning_text() {
        let reply = "Here is the data:\n{\"tanggal\": \"02-01-2025\", \"ok\": true}\nDone.";
        let fields = parse_scan_fields(reply).unwrap();
        assert_eq!(fields["tanggal"], "02-01-2025");
        assert_eq!(fields["ok"], "true");
    }

    #[test]
    fn nested_values_are_kept_as_json() {
        let fields = parse_scan_fields(r#"{"cof": [0.12, 0.14]}"#).unwrap();
        assert_eq!(fields["cof"], "[0.12,0.14]");
    }

    #[test]
    fn rejects_replies_without_an_object() {
        assert!(matches!(parse_scan_fields("sorry, unreadable"), Err(ExtractError::NoJson)));
        assert!(matches!(parse_scan_fields("} {"), Err(ExtractError::NoJson)));
        assert!(matches!(parse_scan_fields("{not json}"), Err(ExtractError::Json(_))));
    }

    #[test]
    fn request_serializes_openai_parts() {
        let request = ChatRequest {
            model: "gemini-2.5-flash",
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text { text: "read".into() },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: "data:image/jpeg;base64,AA==".into() },
                    },
                ],
            }],
            temperature: 0.0,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["content"][0]["type"], "text");
        assert_eq!(json["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            json["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,AA=="
        );
    }

    #[test]
    fn ollama_endpoint_needs_no_key() {
        let llm = LlmSection {
            backend: LlmBackend::Ollama,
            ..LlmSection::default()
        };
        let endpoint = resolve_endpoint(&llm).unwrap();
        assert_eq!(endpoint.base_url, "http://localhost:11434/v1");
        assert_eq!(endpoint.api_key, "ollama");
    }

    #[test]
    fn remote_endpoint_requires_key_env() {
        let mut llm = LlmSection::default();
        llm.remote.api_key_env = "QC_SCANNER_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        assert!(matches!(
            resolve_endpoint(&llm),
            Err(ExtractError::MissingApiKey(_))
        ));
    }
}
