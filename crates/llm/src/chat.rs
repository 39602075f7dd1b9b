use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use sarathi_core::LanguageTag;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parse::{parse_classifier_output, parse_translation_output};
use crate::prompt::{classifier_prompt, translation_prompt};
use crate::{
    ClassifierQuery, ClassifierVerdict, CollaboratorError, LlmConfig, SemanticClassifier,
    Transcriber, Translator,
};

const USER_AGENT: &str = concat!("sarathi/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// OpenAI-compatible chat completions and audio transcription endpoint.
/// Implements every collaborator contract with one pooled HTTP client.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: Client,
    config: LlmConfig,
}

impl ChatCompletionsClient {
    pub fn new(config: LlmConfig) -> Result<Self, CollaboratorError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn complete(
        &self,
        prompt: &str,
        json_output: bool,
        credential: &str,
        timeout: Duration,
    ) -> Result<String, CollaboratorError> {
        if credential.trim().is_empty() {
            return Err(CollaboratorError::MissingCredential);
        }

        let request = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.1,
            response_format: json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let started = Instant::now();
        let response = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(credential.trim())
            .timeout(timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response.json().await?;
        debug!(
            model = %self.config.chat_model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chat completion returned"
        );

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(CollaboratorError::EmptyOutput)
    }
}

impl SemanticClassifier for ChatCompletionsClient {
    fn model_name(&self) -> &str {
        &self.config.chat_model
    }

    async fn classify(
        &self,
        query: ClassifierQuery<'_>,
        credential: &str,
    ) -> Result<ClassifierVerdict, CollaboratorError> {
        let prompt = classifier_prompt(
            query.english_text,
            query.native_text,
            query.options,
            query.language,
        );
        let content = self
            .complete(&prompt, true, credential, self.config.classifier_timeout)
            .await?;
        parse_classifier_output(&content)
    }
}

impl Translator for ChatCompletionsClient {
    async fn translate(
        &self,
        text: &str,
        source_hint: &str,
        target: &LanguageTag,
        credential: &str,
    ) -> Result<String, CollaboratorError> {
        let prompt = translation_prompt(text, source_hint, target);
        let content = self
            .complete(&prompt, false, credential, self.config.translation_timeout)
            .await?;
        parse_translation_output(&content)
    }
}

impl Transcriber for ChatCompletionsClient {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        language: &LanguageTag,
        credential: &str,
    ) -> Result<String, CollaboratorError> {
        if credential.trim().is_empty() {
            return Err(CollaboratorError::MissingCredential);
        }
        if audio.is_empty() {
            return Err(CollaboratorError::MalformedResponse(
                "audio payload is empty".to_string(),
            ));
        }

        let file = Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.config.stt_model.clone())
            .text("language", stt_language_code(language));

        let response = self
            .http
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(credential.trim())
            .timeout(self.config.transcription_timeout)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: TranscriptionResponse = response.json().await?;
        Ok(body.text.trim().to_string())
    }
}

/// Speech models take the bare ISO code, so `ml-IN` becomes `ml`.
fn stt_language_code(language: &LanguageTag) -> String {
    language
        .code()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}
