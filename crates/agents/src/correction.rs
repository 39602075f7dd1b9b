use std::sync::Arc;

use sarathi_core::{
    CorrectionConfig, LanguageTag, LexiconTable, TranslationRequest, TranslationResult,
};
use sarathi_llm::{CollaboratorError, Translator};
use sarathi_observability::AppMetrics;
use tracing::{debug, warn};

const AUTO_DETECT: &str = "auto";

/// Best-effort rewrite of native text through the translation collaborator
/// followed by the per-language substitution table.
pub struct Corrector<T> {
    translator: Arc<T>,
    lexicon: Arc<LexiconTable>,
    config: CorrectionConfig,
    metrics: Arc<AppMetrics>,
}

impl<T> Corrector<T>
where
    T: Translator,
{
    pub fn new(
        translator: Arc<T>,
        lexicon: Arc<LexiconTable>,
        config: CorrectionConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            translator,
            lexicon,
            config,
            metrics,
        }
    }

    pub fn apply_lexicon(&self, text: &str, language: &LanguageTag) -> String {
        self.lexicon.apply(language.code(), text)
    }

    /// Returns `native_text` untouched when it is blank, when there is no
    /// credential, or when the collaborator fails in any way.
    pub async fn correct(
        &self,
        native_text: &str,
        language: &LanguageTag,
        credential: Option<&str>,
    ) -> String {
        if native_text.trim().is_empty() {
            return native_text.to_string();
        }
        let Some(credential) = credential else {
            debug!("no credential, native text left uncorrected");
            return native_text.to_string();
        };

        match self
            .run_translation(native_text, language, credential)
            .await
        {
            Ok(corrected) => self.apply_lexicon(&corrected, language),
            Err(err) => {
                self.metrics.inc_collaborator_failure();
                warn!(
                    error = %err,
                    language = language.code(),
                    "correction failed, keeping original text"
                );
                native_text.to_string()
            }
        }
    }

    /// Standalone translation record: same collaborator, but the failure is
    /// reported back next to the untouched text.
    pub async fn translate(&self, request: &TranslationRequest) -> TranslationResult {
        let target = LanguageTag::parse(&request.target_language);
        if request.text.trim().is_empty() {
            return TranslationResult {
                translated: String::new(),
                error: None,
            };
        }
        let Some(credential) = request.credential() else {
            return TranslationResult {
                translated: request.text.clone(),
                error: Some(CollaboratorError::MissingCredential.to_string()),
            };
        };

        match self.run_translation(&request.text, &target, credential).await {
            Ok(translated) => TranslationResult {
                translated: self.apply_lexicon(&translated, &target),
                error: None,
            },
            Err(err) => {
                self.metrics.inc_collaborator_failure();
                warn!(error = %err, target = target.code(), "translation failed");
                TranslationResult {
                    translated: request.text.clone(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn run_translation(
        &self,
        text: &str,
        target: &LanguageTag,
        credential: &str,
    ) -> Result<String, CollaboratorError> {
        tokio::time::timeout(
            self.config.translation_timeout,
            self.translator
                .translate(text, AUTO_DETECT, target, credential),
        )
        .await
        .unwrap_or(Err(CollaboratorError::Timeout))
    }
}
