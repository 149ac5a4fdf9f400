use serde::{Deserialize, Serialize};
use trade_assistant_model::{ModelFinishReason, ModelMessage, ModelRequest};

use crate::GeminiConfig;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub error: Option<ApiError>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub code: Option<u16>,
    pub message: String,
    pub status: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

// ---------------------------
// Types used in both directions
// ---------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    // Non-text parts (inline data, function calls) deserialize with no text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

// -----------
// Conversions
// -----------

const ROLE_USER: &str = "user";
const ROLE_MODEL: &str = "model";

/// Converts the request, merging adjacent turns of the same role into one
/// content with several parts. The API rejects histories where a role
/// repeats, and the persona acknowledgement followed by a seeded greeting
/// produces exactly that.
pub fn create_request(
    req: &ModelRequest,
    config: &GeminiConfig,
) -> GenerateContentRequest {
    let mut contents: Vec<Content> = Vec::with_capacity(req.messages.len());
    for msg in &req.messages {
        let role = if msg.is_user() { ROLE_USER } else { ROLE_MODEL };
        let part = Part {
            text: Some(msg.text().to_owned()),
        };
        match contents.last_mut() {
            Some(last) if last.role.as_deref() == Some(role) => {
                last.parts.push(part);
            }
            _ => contents.push(Content {
                role: Some(role.to_owned()),
                parts: vec![part],
            }),
        }
    }

    GenerateContentRequest {
        contents,
        generation_config: config
            .max_output_tokens
            .map(|max_output_tokens| GenerationConfig { max_output_tokens }),
    }
}

#[inline]
pub fn finish_reason(raw: &str) -> ModelFinishReason {
    match raw {
        "STOP" => ModelFinishReason::Stop,
        "MAX_TOKENS" => ModelFinishReason::MaxTokens,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT"
        | "SPII" => ModelFinishReason::Moderated,
        _ => ModelFinishReason::Other,
    }
}

/// Extracts a readable message from an error body, falling back to a
/// truncated copy of the raw body.
pub fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    body.chars().take(200).collect()
}
