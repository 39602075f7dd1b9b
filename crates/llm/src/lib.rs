mod chat;
mod parse;
mod prompt;

use std::time::Duration;

use sarathi_core::LanguageTag;
use thiserror::Error;

pub use chat::ChatCompletionsClient;
pub use parse::{parse_classifier_output, parse_translation_output};
pub use prompt::{classifier_prompt, translation_prompt, GLOSSARY};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_STT_MODEL: &str = "whisper-large-v3";

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("no credential provided")]
    MissingCredential,
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("non-success status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("collaborator returned no output")]
    EmptyOutput,
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Everything the semantic classifier sees about one request.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierQuery<'a> {
    pub english_text: &'a str,
    pub native_text: &'a str,
    pub options: &'a [String],
    pub language: &'a LanguageTag,
}

/// Raw classifier answer. `label` is untrusted until verified against the
/// request's options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierVerdict {
    pub label: String,
    pub corrected_native: Option<String>,
}

pub trait SemanticClassifier: Send + Sync {
    fn model_name(&self) -> &str;

    async fn classify(
        &self,
        query: ClassifierQuery<'_>,
        credential: &str,
    ) -> Result<ClassifierVerdict, CollaboratorError>;
}

pub trait Translator: Send + Sync {
    /// `source_hint` is `"auto"` unless the caller knows the source language.
    async fn translate(
        &self,
        text: &str,
        source_hint: &str,
        target: &LanguageTag,
        credential: &str,
    ) -> Result<String, CollaboratorError>;
}

pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        language: &LanguageTag,
        credential: &str,
    ) -> Result<String, CollaboratorError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub base_url: String,
    pub chat_model: String,
    pub stt_model: String,
    pub connect_timeout: Duration,
    pub classifier_timeout: Duration,
    pub translation_timeout: Duration,
    pub transcription_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            stt_model: DEFAULT_STT_MODEL.to_string(),
            connect_timeout: Duration::from_secs(6),
            classifier_timeout: Duration::from_secs(10),
            translation_timeout: Duration::from_secs(15),
            transcription_timeout: Duration::from_secs(30),
        }
    }
}
