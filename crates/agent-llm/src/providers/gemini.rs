//! Gemini provider implementation
//!
//! Talks to the `generateContent` endpoint, either through Vertex AI
//! (project + location, OAuth bearer token) or through the Gemini
//! Developer API (API key).

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use agent_utils::AccessTokenSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEVELOPER_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models accepted when no explicit list is configured
pub const DEFAULT_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-2.0-flash-001",
    "gemini-2.0-flash-lite",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.5-pro",
];

/// Where requests are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiEndpoint {
    /// Vertex AI publisher model endpoint
    Vertex {
        /// Google Cloud project
        project: String,
        /// Region, or `global`
        location: String,
    },
    /// Gemini Developer API
    DeveloperApi {
        /// API key
        api_key: String,
    },
}

/// Gemini provider configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    endpoint: GeminiEndpoint,
    timeout: Duration,
    supported_models: Vec<String>,
}

impl GeminiConfig {
    /// Vertex AI in `project` / `location`
    pub fn vertex(project: impl Into<String>, location: impl Into<String>) -> Self {
        Self::new(GeminiEndpoint::Vertex {
            project: project.into(),
            location: location.into(),
        })
    }

    /// Gemini Developer API with an API key
    pub fn developer_api(api_key: impl Into<String>) -> Self {
        Self::new(GeminiEndpoint::DeveloperApi {
            api_key: api_key.into(),
        })
    }

    fn new(endpoint: GeminiEndpoint) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_secs(120),
            supported_models: DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the list of accepted model identifiers
    pub fn with_supported_models(mut self, models: Vec<String>) -> Self {
        self.supported_models = models;
        self
    }

    /// Endpoint this configuration targets
    pub fn endpoint(&self) -> &GeminiEndpoint {
        &self.endpoint
    }

    /// `generateContent` URL for `model`
    pub fn generate_url(&self, model: &str) -> String {
        match &self.endpoint {
            GeminiEndpoint::Vertex { project, location } => {
                let host = if location == "global" {
                    "aiplatform.googleapis.com".to_string()
                } else {
                    format!("{location}-aiplatform.googleapis.com")
                };
                format!(
                    "https://{host}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent"
                )
            }
            GeminiEndpoint::DeveloperApi { .. } => {
                format!("{DEVELOPER_API_BASE}/models/{model}:generateContent")
            }
        }
    }
}

/// Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
    credentials: Option<Arc<dyn AccessTokenSource>>,
}

impl GeminiProvider {
    /// Create a provider
    ///
    /// Vertex endpoints need a token source; the Developer API does not.
    pub fn new(
        config: GeminiConfig,
        credentials: Option<Arc<dyn AccessTokenSource>>,
    ) -> Result<Self> {
        if matches!(config.endpoint, GeminiEndpoint::Vertex { .. }) && credentials.is_none() {
            return Err(LLMError::ConfigurationError(
                "Vertex AI endpoint requires an access token source".to_string(),
            ));
        }
        if let GeminiEndpoint::Vertex { project, .. } = &config.endpoint {
            if project.trim().is_empty() {
                return Err(LLMError::ConfigurationError(
                    "Vertex AI endpoint requires a project".to_string(),
                ));
            }
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    async fn authorize(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        match (&self.config.endpoint, &self.credentials) {
            (GeminiEndpoint::DeveloperApi { api_key }, _) => {
                Ok(builder.header("x-goog-api-key", api_key))
            }
            (GeminiEndpoint::Vertex { .. }, Some(source)) => {
                let token = source.access_token().await?;
                Ok(builder.bearer_auth(token))
            }
            (GeminiEndpoint::Vertex { .. }, None) => Err(LLMError::ConfigurationError(
                "No access token source configured".to_string(),
            )),
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    #[instrument(skip(self, request), fields(model = %request.model, tools = request.tools.len()))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Gemini");

        let url = self.config.generate_url(&request.model);
        let body = GenerateContentRequest::from_request(&request);

        let builder = self.client.post(&url).json(&body);
        let response = self.authorize(builder).await?.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(error_text),
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(request.model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let gemini_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        let converted = gemini_response.into_completion()?;
        debug!(
            stop_reason = ?converted.stop_reason,
            input_tokens = converted.usage.input_tokens,
            output_tokens = converted.usage.output_tokens,
            "Received response"
        );
        Ok(converted)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn supports_model(&self, model: &str) -> bool {
        self.config.supported_models.iter().any(|m| m == model)
    }
}

// Wire types for generateContent

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

impl GenerateContentRequest {
    fn from_request(request: &CompletionRequest) -> Self {
        let contents = request.messages.iter().map(GeminiContent::from_message).collect();

        let system_instruction = request.system.as_ref().map(|text| GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: Some(text.clone()),
                ..GeminiPart::default()
            }],
        });

        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTool {
                function_declarations: request
                    .tools
                    .iter()
                    .map(FunctionDeclaration::from_definition)
                    .collect(),
            }]
        };

        Self {
            contents,
            system_instruction,
            tools,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
                stop_sequences: request.stop_sequences.clone(),
            },
        }
    }
}

impl FunctionDeclaration {
    fn from_definition(def: &ToolDefinition) -> Self {
        Self {
            name: def.name.clone(),
            description: def.description.clone(),
            parameters: def.input_schema.clone(),
        }
    }
}

impl GeminiContent {
    fn from_message(message: &Message) -> Self {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "model",
        };

        let parts = match &message.content {
            None => Vec::new(),
            Some(MessageContent::Text(text)) => vec![GeminiPart {
                text: Some(text.clone()),
                ..GeminiPart::default()
            }],
            Some(MessageContent::Blocks(blocks)) => blocks.iter().map(GeminiPart::from_block).collect(),
        };

        Self {
            role: Some(role.to_string()),
            parts,
        }
    }
}

impl GeminiPart {
    fn from_block(block: &ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => Self {
                text: Some(text.clone()),
                ..Self::default()
            },
            ContentBlock::ToolUse { name, input, .. } => Self {
                function_call: Some(FunctionCall {
                    name: name.clone(),
                    args: input.clone(),
                }),
                ..Self::default()
            },
            ContentBlock::ToolResult {
                name,
                content,
                is_error,
                ..
            } => {
                let response = if *is_error {
                    json!({ "error": content })
                } else {
                    json!({ "content": content })
                };
                Self {
                    function_response: Some(FunctionResponse {
                        name: name.clone(),
                        response,
                    }),
                    ..Self::default()
                }
            }
        }
    }
}

impl GenerateContentResponse {
    fn into_completion(self) -> Result<CompletionResponse> {
        let usage = self
            .usage_metadata
            .map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("Response has no candidates".to_string()))?;

        let mut blocks = Vec::new();
        let mut call_index = 0usize;
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(call) = part.function_call {
                blocks.push(ContentBlock::ToolUse {
                    id: format!("call_{call_index}"),
                    name: call.name,
                    input: call.args,
                });
                call_index += 1;
            } else if let Some(text) = part.text {
                blocks.push(ContentBlock::Text { text });
            }
        }

        let finish_reason = candidate.finish_reason.unwrap_or_default();
        let stop_reason = if call_index > 0 {
            StopReason::ToolUse
        } else {
            match finish_reason.as_str() {
                "MAX_TOKENS" => StopReason::MaxTokens,
                "STOP" | "" => StopReason::EndTurn,
                other => {
                    let has_text = blocks
                        .iter()
                        .any(|b| matches!(b, ContentBlock::Text { text } if !text.trim().is_empty()));
                    if !has_text {
                        warn!(finish_reason = other, "Generation blocked without any answer");
                        return Err(LLMError::ResponseBlocked(other.to_string()));
                    }
                    warn!(finish_reason = other, "Generation ended abnormally");
                    StopReason::EndTurn
                }
            }
        };

        Ok(CompletionResponse {
            message: Message::assistant_blocks(blocks),
            stop_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_utils::StaticToken;

    fn vertex_provider() -> GeminiProvider {
        GeminiProvider::new(
            GeminiConfig::vertex("mon-projet", "us-central1"),
            Some(Arc::new(StaticToken::new("token"))),
        )
        .unwrap()
    }

    #[test]
    fn test_generate_urls() {
        let regional = GeminiConfig::vertex("mon-projet", "us-central1");
        assert_eq!(
            regional.generate_url("gemini-2.0-flash"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/mon-projet/locations/us-central1/publishers/google/models/gemini-2.0-flash:generateContent"
        );

        let global = GeminiConfig::vertex("mon-projet", "global");
        assert!(
            global
                .generate_url("gemini-2.0-flash")
                .starts_with("https://aiplatform.googleapis.com/v1/projects/mon-projet/locations/global/")
        );

        let dev = GeminiConfig::developer_api("key");
        assert_eq!(
            dev.generate_url("gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_vertex_requires_credentials() {
        let result = GeminiProvider::new(GeminiConfig::vertex("mon-projet", "global"), None);
        assert!(matches!(result, Err(LLMError::ConfigurationError(_))));

        let result = GeminiProvider::new(GeminiConfig::developer_api("key"), None);
        assert!(result.is_ok());
    }

    #[test]
    fn test_supports_model() {
        let provider = vertex_provider();
        assert_eq!(provider.name(), "gemini");
        assert!(provider.supports_model("gemini-2.0-flash"));
        assert!(!provider.supports_model("gemini-9000"));
    }

    #[test]
    fn test_request_conversion() {
        let request = CompletionRequest::builder("gemini-2.0-flash")
            .system("Tu es un tuteur")
            .add_message(Message::user("photosynthèse"))
            .add_message(Message::assistant_blocks(vec![ContentBlock::ToolUse {
                id: "call_0".into(),
                name: "search_agent".into(),
                input: json!({"request": "photosynthèse"}),
            }]))
            .add_message(Message::tool_results(vec![ContentBlock::tool_error(
                "call_0",
                "search_agent",
                "indisponible",
            )]))
            .tools(vec![ToolDefinition::new(
                "search_agent",
                "Recherche",
                json!({"type": "object"}),
            )])
            .temperature(0.7)
            .build();

        let wire = serde_json::to_value(GenerateContentRequest::from_request(&request)).unwrap();

        assert_eq!(wire["systemInstruction"]["parts"][0]["text"], "Tu es un tuteur");
        assert_eq!(wire["contents"][0]["role"], "user");
        assert_eq!(wire["contents"][1]["role"], "model");
        assert_eq!(
            wire["contents"][1]["parts"][0]["functionCall"]["name"],
            "search_agent"
        );
        assert_eq!(
            wire["contents"][2]["parts"][0]["functionResponse"]["response"]["error"],
            "indisponible"
        );
        assert_eq!(
            wire["tools"][0]["functionDeclarations"][0]["name"],
            "search_agent"
        );
        assert_eq!(wire["generationConfig"]["maxOutputTokens"], 4096);
    }

    #[test]
    fn test_response_with_function_calls() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"functionCall": {"name": "search_agent", "args": {"request": "a"}}},
                        {"functionCall": {"name": "planning_agent", "args": {"request": "b"}}}
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
        });
        let response: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let completion = response.into_completion().unwrap();

        assert_eq!(completion.stop_reason, StopReason::ToolUse);
        let calls = completion.message.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].id, "call_0");
        assert_eq!(calls[1].id, "call_1");
        assert_eq!(calls[1].name, "planning_agent");
        assert_eq!(completion.usage.total(), 15);
    }

    #[test]
    fn test_response_text_and_max_tokens() {
        let raw = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "La photo"}, {"text": "synthèse"}]},
                "finishReason": "MAX_TOKENS"
            }]
        });
        let response: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        let completion = response.into_completion().unwrap();
        assert_eq!(completion.stop_reason, StopReason::MaxTokens);
        assert_eq!(completion.message.text().as_deref(), Some("La photosynthèse"));
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            response.into_completion(),
            Err(LLMError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_blocked_candidate_is_an_error() {
        for reason in ["SAFETY", "RECITATION", "PROHIBITED_CONTENT", "OTHER"] {
            let response: GenerateContentResponse =
                serde_json::from_value(json!({"candidates": [{"finishReason": reason}]})).unwrap();
            let err = response.into_completion().unwrap_err();
            assert!(
                matches!(err, LLMError::ResponseBlocked(ref r) if r == reason),
                "{reason}: {err}"
            );
        }
    }

    #[test]
    fn test_abnormal_finish_keeps_partial_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "La photosynthèse est"}]},
                "finishReason": "OTHER"
            }]
        }))
        .unwrap();
        let completion = response.into_completion().unwrap();
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert_eq!(completion.message.text().as_deref(), Some("La photosynthèse est"));
    }
}
