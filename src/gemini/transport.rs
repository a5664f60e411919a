use super::GenerationError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;
use serde_json::{json, Value};
use std::env;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

/// One `generateContent` call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub parts: Vec<Part>,
    pub system_instruction: Option<String>,
    /// when set, the model is asked for JSON matching this schema
    pub response_schema: Option<Value>,
    pub temperature: f32,
}

impl GenerateRequest {
    pub fn text(model: &str, prompt: String, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            parts: vec![Part::Text(prompt)],
            system_instruction: None,
            response_schema: None,
            temperature,
        }
    }

    pub fn body(&self) -> Value {
        let parts: Vec<Value> = self
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => json!({ "text": text }),
                Part::InlineData { mime_type, data } => json!({
                    "inlineData": { "mimeType": mime_type, "data": BASE64.encode(data) }
                }),
            })
            .collect();

        let mut generation_config = json!({ "temperature": self.temperature });
        if let Some(schema) = &self.response_schema {
            generation_config["responseMimeType"] = json!("application/json");
            generation_config["responseSchema"] = schema.clone();
        }

        let mut body = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": generation_config,
        });
        if let Some(instruction) = &self.system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }
        body
    }
}

/// Sends a request to the generative backend and returns the raw response text.
pub trait Transport {
    fn generate(&self, request: &GenerateRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    api_key: Option<String>,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Reads the key from the environment on every call.
    pub fn new() -> Self {
        Self {
            base_url: env::var(BASE_URL_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn api_key(&self) -> Result<String, GenerationError> {
        self.api_key
            .clone()
            .or_else(|| env::var(API_KEY_VAR).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)
    }
}

impl Transport for HttpTransport {
    fn generate(&self, request: &GenerateRequest) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            request.model
        );
        debug!("POST {} ({} parts)", url, request.parts.len());

        let response = ureq::post(&url)
            .set("x-goog-api-key", &api_key)
            .set("Content-Type", "application/json")
            .send_json(request.body())
            .map_err(|e| match e {
                ureq::Error::Status(status, response) => GenerationError::Api {
                    status,
                    message: error_message(response.into_string().unwrap_or_default()),
                },
                other => GenerationError::Transport(other.to_string()),
            })?;

        let body: Value = response
            .into_json()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(response_text(&body))
    }
}

/// Concatenated text parts of the first candidate; empty when the model returned nothing.
fn response_text(body: &Value) -> String {
    body.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn error_message(body: String) -> String {
    serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn body_carries_schema_instruction_and_image() {
        let request = GenerateRequest {
            model: String::from("gemini-3-flash-preview"),
            parts: vec![
                Part::InlineData {
                    mime_type: String::from("image/jpeg"),
                    data: vec![0xff, 0xd8, 0xff],
                },
                Part::Text(String::from("remix")),
            ],
            system_instruction: Some(String::from("JSON only")),
            response_schema: Some(json!({ "type": "ARRAY" })),
            temperature: 0.6,
        };

        let body = request.body();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "/9j/");
        assert_eq!(parts[1]["text"], "remix");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "JSON only");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
    }

    #[test]
    fn free_text_body_has_no_schema() {
        let body = GenerateRequest::text("m", String::from("tóm tắt"), 0.5).body();
        assert!(body.get("systemInstruction").is_none());
        assert!(body["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn extracts_candidate_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "[{" }, { "text": "}]" }] } }]
        });
        assert_eq!(response_text(&body), "[{}]");
        assert_eq!(response_text(&json!({})), "");
    }

    #[test]
    fn explicit_empty_key_fails_before_any_request() {
        let transport = HttpTransport::new()
            .with_api_key("  ")
            .with_base_url("http://127.0.0.1:9");
        let result = transport.generate(&GenerateRequest::text("m", String::new(), 0.5));
        assert!(matches!(result, Err(GenerationError::MissingApiKey)));
    }

    #[test]
    fn error_message_prefers_api_message() {
        assert_eq!(
            error_message(String::from(r#"{"error":{"code":429,"message":"Resource exhausted"}}"#)),
            "Resource exhausted"
        );
        assert_eq!(error_message(String::from("bad gateway")), "bad gateway");
    }
}
