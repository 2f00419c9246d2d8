//! LLM completion client with corrective-feedback retries.

use serde_json::{Map, Value};
use std::sync::Arc;

use super::config::LlmConfig;
use super::errors::{ErrorClass, ModelError};
use super::messages::{sanitize_content, Message, Role};
use super::transport::{CompletionMessage, CompletionRequest, CompletionTransport, HttpTransport};

/// Model families whose name contains this marker have no native
/// structured-output support; their completions are decoded manually.
pub const MANUAL_DECODE_MARKER: &str = "deepseek";

/// Caller intent for a structured (schema-shaped) result.
///
/// Endpoints without native structured output only consult its presence;
/// the schema itself is available for providers that can enforce it.
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// Normalized result of a completion call.
#[derive(Debug, Clone)]
pub enum LlmResponse {
    /// Field/value mapping decoded from the completion text.
    Structured(Map<String, Value>),
    /// Full message record, passed through unmodified.
    Message(CompletionMessage),
}

impl LlmResponse {
    /// The structured mapping, if this response carries one.
    pub fn as_structured(&self) -> Option<&Map<String, Value>> {
        match self {
            LlmResponse::Structured(map) => Some(map),
            LlmResponse::Message(_) => None,
        }
    }

    /// The full message record, if this response carries one.
    pub fn as_message(&self) -> Option<&CompletionMessage> {
        match self {
            LlmResponse::Structured(_) => None,
            LlmResponse::Message(message) => Some(message),
        }
    }
}

/// Client for generating completions from a conversation.
///
/// Application-level failures (malformed output, validation mismatches)
/// are retried up to `max_retries` times, each retry appending a
/// corrective user message describing the failure. Every other failure
/// class propagates immediately. In particular the transport owns retries
/// for its own class, and re-attempting those here would silently
/// multiply the total.
pub struct LlmClient {
    config: LlmConfig,
    transport: Arc<dyn CompletionTransport>,
}

impl LlmClient {
    /// Create a client backed by the bundled HTTP transport.
    pub fn new(config: LlmConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(
            config.base_url.clone(),
            config.api_key.clone(),
        ));
        Self { config, transport }
    }

    /// Create a client over an existing transport handle.
    pub fn with_transport(config: LlmConfig, transport: Arc<dyn CompletionTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Generate a completion for the conversation.
    ///
    /// Returns a structured mapping when `response_schema` is given and the
    /// configured model belongs to a manual-decode family; the full message
    /// record otherwise. The conversation is only ever appended to across
    /// retries, never reordered or truncated.
    pub async fn generate_response(
        &self,
        conversation: Vec<Message>,
        response_schema: Option<&ResponseSchema>,
    ) -> Result<LlmResponse, ModelError> {
        let mut conversation = conversation;
        let mut retry_count: u32 = 0;
        let mut last_error: Option<ModelError> = None;

        while retry_count <= self.config.max_retries {
            match self.attempt(&conversation, response_schema).await {
                Ok(response) => return Ok(response),
                Err(e) => match e.class() {
                    // These errors should not trigger retries.
                    ErrorClass::RateLimit | ErrorClass::Refusal => return Err(e),
                    // The transport already retried these.
                    ErrorClass::Transport => return Err(e),
                    ErrorClass::Application => {
                        if retry_count >= self.config.max_retries {
                            tracing::error!(
                                "Max retries ({}) exceeded. Last error: {}",
                                self.config.max_retries,
                                e
                            );
                            return Err(e);
                        }

                        retry_count += 1;
                        conversation.push(Message::user(corrective_feedback(&e)));
                        tracing::warn!(
                            "Retrying after application error (attempt {}/{}): {}",
                            retry_count,
                            self.config.max_retries,
                            e
                        );
                        last_error = Some(e);
                    }
                },
            }
        }

        // Unreachable when the loop body is exhaustive; kept defensive.
        Err(last_error.unwrap_or(ModelError::RetriesExhausted(self.config.max_retries)))
    }

    /// One transport invocation: build the request, surface refusals,
    /// normalize the completion.
    async fn attempt(
        &self,
        conversation: &[Message],
        response_schema: Option<&ResponseSchema>,
    ) -> Result<LlmResponse, ModelError> {
        let request = self.build_request(conversation);
        let message = self.transport.complete(&request).await?;

        if let Some(refusal) = message.refusal.as_deref().filter(|r| !r.is_empty()) {
            return Err(ModelError::Refused(refusal.to_string()));
        }

        Ok(self.normalize(message, response_schema.is_some()))
    }

    /// Convert the conversation into the wire request, sanitizing content
    /// and retaining only user and system messages.
    fn build_request(&self, conversation: &[Message]) -> CompletionRequest {
        let mut messages = Vec::with_capacity(conversation.len());
        for message in conversation {
            match message.role {
                Role::User | Role::System => messages.push(Message {
                    role: message.role,
                    content: sanitize_content(&message.content),
                }),
                other => {
                    tracing::debug!("Dropping {:?}-role message from outbound request", other);
                }
            }
        }

        CompletionRequest {
            model: self.config.effective_model().to_string(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    /// Shape the completion for the caller.
    ///
    /// Manual-decode models with a structured result requested get their
    /// completion text parsed as JSON, falling back to wrapping the raw
    /// text under a `content` key. Everything else passes through as the
    /// full message record.
    fn normalize(&self, message: CompletionMessage, wants_structured: bool) -> LlmResponse {
        let manual_decode = self
            .config
            .effective_model()
            .to_lowercase()
            .contains(MANUAL_DECODE_MARKER);

        if manual_decode && wants_structured {
            let raw = message.text();
            return match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => LlmResponse::Structured(map),
                _ => {
                    let mut map = Map::new();
                    map.insert("content".to_string(), Value::String(raw.to_string()));
                    LlmResponse::Structured(map)
                }
            };
        }

        LlmResponse::Message(message)
    }
}

/// Corrective message appended to the conversation before a retry.
fn corrective_feedback(error: &ModelError) -> String {
    format!(
        "The previous response attempt was invalid. \
         Error type: {}. \
         Error details: {}. \
         Please try again with a valid response, ensuring the output matches \
         the expected format and constraints.",
        error.kind(),
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted transport: returns queued results in order and records
    /// every request it receives.
    struct MockTransport {
        script: Mutex<VecDeque<Result<CompletionMessage, ModelError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockTransport {
        fn new(script: Vec<Result<CompletionMessage, ModelError>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionTransport for MockTransport {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionMessage, ModelError> {
            self.requests.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ModelError::EmptyCompletion))
        }
    }

    fn completion(content: &str) -> CompletionMessage {
        CompletionMessage {
            role: "assistant".to_string(),
            content: Some(content.to_string()),
            refusal: None,
            metadata: Map::new(),
        }
    }

    fn schema() -> ResponseSchema {
        ResponseSchema::new("extraction", json!({"type": "object"}))
    }

    fn client_with(
        config: LlmConfig,
        script: Vec<Result<CompletionMessage, ModelError>>,
    ) -> (LlmClient, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new(script));
        let client = LlmClient::with_transport(config, mock.clone());
        (client, mock)
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let config = LlmConfig::default().with_model_name("gpt-4o-mini");
        let (client, mock) = client_with(config, vec![Ok(completion("hello"))]);

        let response = client
            .generate_response(vec![Message::user("hi")], None)
            .await
            .unwrap();

        assert_eq!(response.as_message().unwrap().text(), "hello");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_invocations_bounded_by_max_retries() {
        let config = LlmConfig::default().with_max_retries(2);
        let (client, mock) = client_with(
            config,
            vec![
                Err(ModelError::EmptyCompletion),
                Err(ModelError::EmptyCompletion),
                Err(ModelError::EmptyCompletion),
                Err(ModelError::EmptyCompletion),
            ],
        );

        let result = client
            .generate_response(vec![Message::user("extract")], None)
            .await;

        assert!(matches!(result, Err(ModelError::EmptyCompletion)));
        assert_eq!(mock.calls(), 3); // max_retries + 1
    }

    #[tokio::test]
    async fn test_rate_limit_propagates_without_retry() {
        let (client, mock) = client_with(
            LlmConfig::default(),
            vec![Err(ModelError::RateLimited("quota".into()))],
        );

        let result = client
            .generate_response(vec![Message::user("hi")], None)
            .await;

        assert!(matches!(result, Err(ModelError::RateLimited(_))));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_refusal_propagates_without_retry() {
        let refused = CompletionMessage {
            refusal: Some("cannot help with that".to_string()),
            ..completion("")
        };
        let (client, mock) = client_with(LlmConfig::default(), vec![Ok(refused)]);

        let result = client
            .generate_response(vec![Message::user("hi")], None)
            .await;

        assert!(matches!(result, Err(ModelError::Refused(_))));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_propagates_without_retry() {
        let (client, mock) = client_with(
            LlmConfig::default(),
            vec![Err(ModelError::Timeout("30s elapsed".into()))],
        );

        let result = client
            .generate_response(vec![Message::user("hi")], None)
            .await;

        assert!(matches!(result, Err(ModelError::Timeout(_))));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_conversation_grows_by_one_per_retry() {
        let (client, mock) = client_with(
            LlmConfig::default().with_model_name("gpt-4o-mini"),
            vec![
                Err(ModelError::MalformedPayload("bad json".into())),
                Err(ModelError::EmptyCompletion),
                Ok(completion("recovered")),
            ],
        );

        let conversation = vec![Message::system("extract entities"), Message::user("text")];
        let response = client
            .generate_response(conversation, None)
            .await
            .unwrap();

        assert_eq!(response.as_message().unwrap().text(), "recovered");
        let requests = mock.requests();
        assert_eq!(requests.len(), 3);
        // Exactly one corrective user message appended per retry.
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[2].messages.len(), 4);
        assert!(requests[1].messages[2].content.contains("MalformedPayload"));
        assert!(requests[2].messages[3].content.contains("EmptyCompletion"));
        assert_eq!(requests[2].messages[3].role, Role::User);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_last_error() {
        let (client, _mock) = client_with(
            LlmConfig::default().with_max_retries(2),
            vec![
                Err(ModelError::InvalidRequest {
                    status: 400,
                    message: "first".into(),
                }),
                Err(ModelError::MalformedPayload("second".into())),
                Err(ModelError::EmptyCompletion),
            ],
        );

        let result = client
            .generate_response(vec![Message::user("hi")], None)
            .await;

        assert!(matches!(result, Err(ModelError::EmptyCompletion)));
    }

    #[tokio::test]
    async fn test_structured_json_completion_is_parsed() {
        let (client, _mock) = client_with(
            LlmConfig::default(),
            vec![Ok(completion(r#"{"entities": ["alice"], "relations": []}"#))],
        );

        let response = client
            .generate_response(vec![Message::user("extract")], Some(&schema()))
            .await
            .unwrap();

        let map = response.as_structured().unwrap();
        assert_eq!(map["entities"], json!(["alice"]));
    }

    #[tokio::test]
    async fn test_structured_non_json_completion_is_wrapped() {
        let (client, _mock) = client_with(
            LlmConfig::default(),
            vec![Ok(completion("no json here"))],
        );

        let response = client
            .generate_response(vec![Message::user("extract")], Some(&schema()))
            .await
            .unwrap();

        let map = response.as_structured().unwrap();
        assert_eq!(map["content"], "no json here");
    }

    #[tokio::test]
    async fn test_structured_non_object_json_is_wrapped() {
        let (client, _mock) = client_with(
            LlmConfig::default(),
            vec![Ok(completion(r#"["just", "a", "list"]"#))],
        );

        let response = client
            .generate_response(vec![Message::user("extract")], Some(&schema()))
            .await
            .unwrap();

        let map = response.as_structured().unwrap();
        assert_eq!(map["content"], r#"["just", "a", "list"]"#);
    }

    #[tokio::test]
    async fn test_manual_decode_marker_is_case_insensitive() {
        let (client, _mock) = client_with(
            LlmConfig::default().with_model_name("DeepSeek-R1"),
            vec![Ok(completion(r#"{"ok": true}"#))],
        );

        let response = client
            .generate_response(vec![Message::user("extract")], Some(&schema()))
            .await
            .unwrap();

        assert!(response.as_structured().is_some());
    }

    #[tokio::test]
    async fn test_non_marker_model_returns_full_record() {
        let (client, _mock) = client_with(
            LlmConfig::default().with_model_name("gpt-4o-mini"),
            vec![Ok(completion(r#"{"entities": []}"#))],
        );

        let response = client
            .generate_response(vec![Message::user("extract")], Some(&schema()))
            .await
            .unwrap();

        // Native structured-output models pass through untouched even when
        // a schema was requested.
        assert!(response.as_message().is_some());
    }

    #[tokio::test]
    async fn test_marker_without_schema_returns_full_record() {
        let (client, _mock) = client_with(
            LlmConfig::default(),
            vec![Ok(completion("plain text"))],
        );

        let response = client
            .generate_response(vec![Message::user("hi")], None)
            .await
            .unwrap();

        assert_eq!(response.as_message().unwrap().text(), "plain text");
    }

    #[tokio::test]
    async fn test_request_drops_assistant_messages_and_sanitizes() {
        let (client, mock) = client_with(LlmConfig::default(), vec![Ok(completion("ok"))]);

        let conversation = vec![
            Message::system("sys"),
            Message::assistant("prior turn"),
            Message::user("payload\x00 here"),
        ];
        client.generate_response(conversation, None).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].messages[1].content, "payload here");
    }

    #[tokio::test]
    async fn test_unset_model_name_falls_back_to_default() {
        let (client, mock) = client_with(LlmConfig::default(), vec![Ok(completion("ok"))]);

        client
            .generate_response(vec![Message::user("hi")], None)
            .await
            .unwrap();

        assert_eq!(mock.requests()[0].model, "deepseek");
    }
}
