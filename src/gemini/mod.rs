pub mod models;
pub mod sse;

use crate::chat::AttachedFile;
use crate::config::GeminiConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use models::{
    Content, GenerateContentRequest, ImageGenerationRequest, ImageGenerationResponse,
    ImageInstance, ImageParameters, Part, StreamChunk, SystemInstruction,
};
use sse::SseBuffer;
use std::sync::Mutex;

/// The Charty persona and formatting rules, fixed for every chat session.
pub const SYSTEM_INSTRUCTION: &str = "You are Charty AI, a world-class AI assistant specializing in software development, data analysis, and creative ideation.
- When providing code, always wrap it in markdown code blocks with the language specified (e.g., ```rust).
- When asked to analyze a document, provide a concise summary followed by key insights.
- Be helpful, creative, and professional.
- Your responses should be formatted in Markdown for readability.";

const IMAGE_STYLE_PREFIX: &str = "A vibrant, high-resolution, cinematic-style image of: ";

/// A stateful conversation handle. The Gemini REST API is stateless, so the
/// session carries the turn history that the provider-side session object
/// would otherwise hold.
pub struct ChatSession {
    model: String,
    system_instruction: String,
    history: Mutex<Vec<Content>>,
}

impl ChatSession {
    pub fn new(model: String, system_instruction: String) -> Self {
        Self {
            model,
            system_instruction,
            history: Mutex::new(Vec::new()),
        }
    }

    fn snapshot(&self) -> Vec<Content> {
        self.history.lock().unwrap().clone()
    }

    /// Record a completed exchange so later turns see it as context.
    fn record_turn(&self, user_turn: Content, reply: String) {
        let mut history = self.history.lock().unwrap();
        history.push(user_turn);
        history.push(Content::model(reply));
    }
}

/// The boundary to the generative-AI provider. Any provider offering
/// "create session", "send and stream" and "generate image" fits behind it;
/// tests substitute a stub.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Create a conversation handle bound to the fixed system instruction
    /// and the configured text model.
    fn init_chat(&self) -> ChatSession;

    /// Send one user turn and stream the reply. `on_chunk` is invoked
    /// synchronously for every non-empty text fragment, in arrival order;
    /// the call resolves when the provider's stream ends.
    async fn stream_chat_response(
        &self,
        session: &ChatSession,
        prompt: &str,
        file: Option<&AttachedFile>,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<()>;

    /// Generate exactly one image and return it as a data URL.
    async fn generate_image(&self, prompt: &str) -> Result<String>;
}

/// Production gateway speaking the Gemini REST API over reqwest.
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

/// The user turn sent to the provider. With a file attached the payload is
/// multipart (inline bytes + text), and an empty prompt falls back to asking
/// for an analysis of the named file.
fn build_user_content(prompt: &str, file: Option<&AttachedFile>) -> Content {
    match file {
        Some(file) => {
            let text = if prompt.is_empty() {
                format!("Please analyze this file named {}.", file.name)
            } else {
                prompt.to_string()
            };
            Content::user(vec![
                Part::inline_data(file.mime.clone(), file.inline_base64()),
                Part::text(text),
            ])
        }
        None => Content::user(vec![Part::text(prompt)]),
    }
}

fn styled_image_prompt(prompt: &str) -> String {
    format!("{IMAGE_STYLE_PREFIX}{prompt}")
}

#[async_trait]
impl ChatGateway for GeminiClient {
    fn init_chat(&self) -> ChatSession {
        ChatSession::new(
            self.config.text_model.clone(),
            SYSTEM_INSTRUCTION.to_string(),
        )
    }

    async fn stream_chat_response(
        &self,
        session: &ChatSession,
        prompt: &str,
        file: Option<&AttachedFile>,
        on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<()> {
        let user_turn = build_user_content(prompt, file);
        let mut contents = session.snapshot();
        contents.push(user_turn.clone());

        let request = GenerateContentRequest {
            contents,
            system_instruction: SystemInstruction::from_text(session.system_instruction.clone()),
        };

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.config.api_base, session.model, self.config.api_key
        );

        tracing::debug!(model = %session.model, has_file = file.is_some(), "sending chat request");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error: {status}: {body}");
        }

        let mut stream = response.bytes_stream();
        let mut sse = SseBuffer::new();
        let mut reply = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Gemini stream was interrupted")?;
            for payload in sse.push(&String::from_utf8_lossy(&chunk)) {
                match serde_json::from_str::<StreamChunk>(&payload) {
                    Ok(parsed) => {
                        if let Some(text) = parsed.text() {
                            reply.push_str(&text);
                            on_chunk(&text);
                        }
                    }
                    Err(err) => {
                        tracing::debug!(%err, "skipping unparseable stream payload");
                    }
                }
            }
        }

        tracing::debug!(chars = reply.len(), "chat stream completed");
        session.record_turn(user_turn, reply);
        Ok(())
    }

    async fn generate_image(&self, prompt: &str) -> Result<String> {
        if prompt.is_empty() {
            anyhow::bail!("An image description is required.");
        }

        let request = ImageGenerationRequest {
            instances: vec![ImageInstance {
                prompt: styled_image_prompt(prompt),
            }],
            parameters: ImageParameters {
                sample_count: 1,
                output_mime_type: "image/jpeg".to_string(),
            },
        };

        let url = format!(
            "{}/models/{}:predict?key={}",
            self.config.api_base, self.config.image_model, self.config.api_key
        );

        tracing::debug!(model = %self.config.image_model, "sending image request");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the Imagen API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Imagen API error: {status}: {body}");
        }

        let parsed: ImageGenerationResponse = response
            .json()
            .await
            .context("Failed to parse the Imagen API response")?;

        match parsed.predictions.into_iter().next() {
            Some(prediction) => Ok(format!(
                "data:image/jpeg;base64,{}",
                prediction.bytes_base64_encoded
            )),
            None => anyhow::bail!("Image generation failed to produce an image."),
        }
    }
}
