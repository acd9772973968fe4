//! OpenAI Responses API client.
//!
//! Create response endpoint: <https://platform.openai.com/docs/api-reference/responses>

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::OpenAiConfig;
use crate::constants::{MAX_OUTPUT_TOKENS, PROBE_MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::error::HaikuError;
use crate::haiku::{haiku_schema, system_instructions, user_message};

/// Header carrying the OpenAI project id.
const OPENAI_PROJECT_HEADER: &str = "OpenAI-Project";

/// A text-generation backend that can write haiku.
pub trait TextModel: Send + Sync {
    /// Asks for one haiku about `text` and returns the model's raw text payload.
    fn request_haiku(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<String, HaikuError>> + Send;

    /// Sends a tiny request to check connectivity, returning the upstream reply verbatim.
    fn probe(&self) -> impl Future<Output = Result<ProbeReply, HaikuError>> + Send;

    /// True when a credential is configured.
    fn has_credential(&self) -> bool;
}

/// Upstream status and body from a connectivity probe.
#[derive(Clone, Debug)]
pub struct ProbeReply {
    /// HTTP status returned upstream
    pub status: u16,
    /// Raw response body
    pub body: String,
}

// -----------------------------
// Wire types
// -----------------------------

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_output_tokens: u32,
    text: TextOptions,
    input: [InputMessage; 2],
}

#[derive(Debug, Serialize)]
struct TextOptions {
    format: TextFormat,
}

#[derive(Debug, Serialize)]
struct TextFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'static str,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Serialize)]
struct InputMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ProbeRequest<'a> {
    model: &'a str,
    input: &'static str,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ResponsesCreateResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<ResponseOutputItem>,
}

#[derive(Debug, Deserialize)]
struct ResponseOutputItem {
    #[serde(default)]
    content: Vec<ResponseContentItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentItem {
    #[serde(rename = "output_text")]
    OutputText { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl ResponsesCreateResponse {
    /// Model output: the first `output_text` item, falling back to the top-level field.
    fn into_text(self) -> Option<String> {
        let Self {
            output_text,
            output,
        } = self;
        output
            .into_iter()
            .flat_map(|item| item.content)
            .find_map(|content| match content {
                ResponseContentItem::OutputText { text } => Some(text),
                ResponseContentItem::Other => None,
            })
            .or(output_text)
    }
}

fn haiku_request<'a>(model: &'a str, text: &str) -> ResponsesRequest<'a> {
    ResponsesRequest {
        model,
        temperature: TEMPERATURE,
        max_output_tokens: MAX_OUTPUT_TOKENS,
        text: TextOptions {
            format: TextFormat {
                kind: "json_schema",
                name: "haiku",
                strict: true,
                schema: haiku_schema(),
            },
        },
        input: [
            InputMessage {
                role: "system",
                content: system_instructions(),
            },
            InputMessage {
                role: "user",
                content: user_message(text),
            },
        ],
    }
}

/// Builds the upstream error from a failed response body.
fn upstream_error(status: reqwest::StatusCode, body: &[u8]) -> HaikuError {
    let mut message = format!(
        "OpenAI API error: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
    .trim_end()
    .to_string();
    if let Ok(envelope) = serde_json::from_slice::<ApiErrorEnvelope>(body)
        && !envelope.error.message.is_empty()
    {
        message.push_str(" - ");
        message.push_str(&envelope.error.message);
    }
    HaikuError::Upstream {
        status: status.as_u16(),
        message,
    }
}

/// Client for `POST /responses` with structured output.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Builds the HTTP client. A missing key is allowed here and reported per call.
    pub fn new(config: OpenAiConfig) -> Result<Self, HaikuError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| HaikuError::Configuration(format!("HTTP client setup failed: {err}")))?;
        Ok(Self { client, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, HaikuError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| HaikuError::Configuration("Missing OpenAI API key".to_string()))
    }

    fn post(&self, api_key: &str) -> Result<reqwest::RequestBuilder, HaikuError> {
        let mut builder = self
            .client
            .post(self.config.responses_url()?)
            .bearer_auth(api_key);
        if let Some(project) = &self.config.project {
            builder = builder.header(OPENAI_PROJECT_HEADER, project);
        }
        Ok(builder)
    }
}

impl TextModel for OpenAiClient {
    async fn request_haiku(&self, text: &str) -> Result<String, HaikuError> {
        let api_key = self.api_key()?;
        let body = haiku_request(&self.config.model, text);

        let resp = self
            .post(api_key)?
            .json(&body)
            .send()
            .await
            .map_err(|err| HaikuError::Transport(err.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| HaikuError::Transport(err.to_string()))?;
        debug!("/responses returned {} ({} bytes)", status, bytes.len());

        if !status.is_success() {
            return Err(upstream_error(status, &bytes));
        }

        let parsed: ResponsesCreateResponse = serde_json::from_slice(&bytes)
            .map_err(|err| HaikuError::MalformedResponse(format!("envelope: {err}")))?;
        parsed
            .into_text()
            .ok_or_else(|| HaikuError::MalformedResponse("missing output text".to_string()))
    }

    async fn probe(&self) -> Result<ProbeReply, HaikuError> {
        let api_key = self.api_key()?;
        let body = ProbeRequest {
            model: &self.config.model,
            input: "Say 'pong'.",
            max_output_tokens: PROBE_MAX_OUTPUT_TOKENS,
        };
        let resp = self
            .post(api_key)?
            .json(&body)
            .send()
            .await
            .map_err(|err| HaikuError::Transport(err.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|err| HaikuError::Transport(err.to_string()))?;
        Ok(ProbeReply { status, body })
    }

    fn has_credential(&self) -> bool {
        self.config.has_api_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_output_items_over_output_text() {
        let parsed: ResponsesCreateResponse = serde_json::from_value(serde_json::json!({
            "output_text": "fallback",
            "output": [
                {"type": "reasoning"},
                {"type": "message", "content": [
                    {"type": "refusal", "refusal": "no"},
                    {"type": "output_text", "text": "primary"}
                ]}
            ]
        }))
        .expect("parse envelope");
        assert_eq!(parsed.into_text().as_deref(), Some("primary"));
    }

    #[test]
    fn falls_back_to_output_text() {
        let parsed: ResponsesCreateResponse =
            serde_json::from_value(serde_json::json!({"output_text": "fallback"}))
                .expect("parse envelope");
        assert_eq!(parsed.into_text().as_deref(), Some("fallback"));

        let parsed: ResponsesCreateResponse =
            serde_json::from_value(serde_json::json!({"output": []})).expect("parse envelope");
        assert!(parsed.into_text().is_none());
    }

    #[test]
    fn request_body_carries_the_contract() {
        let body = serde_json::to_value(haiku_request("gpt-4o-mini", "an old pond"))
            .expect("serialize");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_output_tokens"], 300);
        assert_eq!(body["text"]["format"]["type"], "json_schema");
        assert_eq!(body["text"]["format"]["strict"], true);
        assert_eq!(body["input"][0]["role"], "system");
        assert_eq!(body["input"][1]["content"], "Text: an old pond");
    }

    #[test]
    fn upstream_error_includes_embedded_message() {
        let err = upstream_error(
            reqwest::StatusCode::UNAUTHORIZED,
            br#"{"error": {"message": "Incorrect API key provided"}}"#,
        );
        match err {
            HaikuError::Upstream { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(
                    message,
                    "OpenAI API error: 401 Unauthorized - Incorrect API key provided"
                );
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = upstream_error(reqwest::StatusCode::BAD_GATEWAY, b"<html>");
        assert_eq!(err.to_string(), "OpenAI API error: 502 Bad Gateway");
    }
}
