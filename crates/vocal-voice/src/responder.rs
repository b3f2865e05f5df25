use crate::config::OpenAiConfig;
use crate::error::{check_status, VoiceError};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "response generation";

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    instructions: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesBody {
    /// Joins every `output_text` part; reasoning items carry no content and are skipped.
    fn into_text(self) -> Option<String> {
        if let Some(text) = self.output_text.filter(|t| !t.is_empty()) {
            return Some(text);
        }
        let text: String = self
            .output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Text completion over the OpenAI Responses endpoint.
#[derive(Debug, Clone)]
pub struct ResponderService {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl ResponderService {
    pub fn new(client: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }

    /// Generates a reply to `input` under the given instructions.
    pub async fn respond(&self, input: &str, instructions: &str) -> Result<String, VoiceError> {
        let url = format!("{}/v1/responses", self.config.base_url.trim_end_matches('/'));
        let request = ResponsesRequest {
            model: &self.config.response_model,
            input,
            instructions,
        };

        tracing::debug!(
            model = %self.config.response_model,
            instructions_len = instructions.len(),
            "requesting response"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;
        let body: ResponsesBody = check_status(SERVICE, response).await?.json().await?;

        body.into_text().ok_or(VoiceError::MalformedResponse {
            service: SERVICE,
            reason: "no output text".to_string(),
        })
    }
}
