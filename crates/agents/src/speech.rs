use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sarathi_core::{LanguageTag, TranscriptionRequest, TranscriptionResult};
use sarathi_llm::{CollaboratorError, Transcriber};
use sarathi_observability::AppMetrics;
use tracing::{info, instrument, warn};

/// Turns a base64 audio record into text. Lives beside the matcher; the
/// resolver itself never handles audio.
pub struct SpeechAgent<S> {
    transcriber: Arc<S>,
    timeout: Duration,
    metrics: Arc<AppMetrics>,
}

impl<S> SpeechAgent<S>
where
    S: Transcriber,
{
    pub fn new(transcriber: Arc<S>, timeout: Duration, metrics: Arc<AppMetrics>) -> Self {
        Self {
            transcriber,
            timeout,
            metrics,
        }
    }

    #[instrument(skip(self, request), fields(request_id = %uuid::Uuid::new_v4(), language = %request.language))]
    pub async fn handle(&self, request: TranscriptionRequest) -> TranscriptionResult {
        self.metrics.inc_request();

        let audio = match decode_audio(request.audio.as_deref()) {
            Ok(audio) => audio,
            Err(message) => {
                self.metrics.inc_malformed();
                return failed(message);
            }
        };
        let Some(credential) = request.credential() else {
            return failed(CollaboratorError::MissingCredential.to_string());
        };

        let language = LanguageTag::parse(&request.language);
        let outcome = tokio::time::timeout(
            self.timeout,
            self.transcriber.transcribe(audio, &language, credential),
        )
        .await
        .unwrap_or(Err(CollaboratorError::Timeout));

        match outcome {
            Ok(text) => {
                info!(chars = text.chars().count(), "audio transcribed");
                TranscriptionResult { text, error: None }
            }
            Err(err) => {
                self.metrics.inc_collaborator_failure();
                warn!(error = %err, "transcription failed");
                failed(err.to_string())
            }
        }
    }
}

fn failed(message: impl Into<String>) -> TranscriptionResult {
    TranscriptionResult {
        text: String::new(),
        error: Some(message.into()),
    }
}

/// Accepts bare base64 or a `data:<mime>;base64,` URL.
fn decode_audio(audio: Option<&str>) -> Result<Vec<u8>, String> {
    let raw = audio.map(str::trim).unwrap_or_default();
    let payload = raw
        .split_once(";base64,")
        .map(|(_, payload)| payload)
        .unwrap_or(raw);
    if payload.is_empty() {
        return Err("no audio provided".to_string());
    }

    STANDARD
        .decode(payload)
        .map_err(|err| format!("audio is not valid base64: {err}"))
}
