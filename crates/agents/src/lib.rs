mod correction;
mod resolver;
mod speech;

use std::sync::Arc;
use std::time::Instant;

use sarathi_core::{decode_record, MatchRequest, MatchResult, MatchSource};
use sarathi_llm::{SemanticClassifier, Translator};
use sarathi_observability::AppMetrics;
use tracing::{info, instrument, warn};

pub use correction::Corrector;
pub use resolver::{IntentResolver, Resolution};
pub use speech::SpeechAgent;

/// Runs one `match` record through the resolver tiers and the correction
/// adapter. Always answers; every collaborator failure is absorbed.
pub struct MatchAgent<C, T> {
    resolver: IntentResolver<C>,
    corrector: Corrector<T>,
    metrics: Arc<AppMetrics>,
}

impl<C, T> MatchAgent<C, T>
where
    C: SemanticClassifier,
    T: Translator,
{
    pub fn new(
        resolver: IntentResolver<C>,
        corrector: Corrector<T>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            resolver,
            corrector,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    /// Decodes one raw line and handles it; undecodable lines get a `NONE`
    /// answer carrying the parse error.
    pub async fn handle_line(&self, line: &str) -> MatchResult {
        match decode_record::<MatchRequest>(line) {
            Ok(request) => self.handle(request).await,
            Err(err) => self.reject(err.to_string()),
        }
    }

    /// Answers a record that never made it to a `MatchRequest`.
    pub fn reject(&self, reason: impl Into<String>) -> MatchResult {
        let reason = reason.into();
        self.metrics.inc_request();
        self.metrics.inc_malformed();
        self.metrics.record_source(MatchSource::Fallback);
        warn!(error = %reason, "malformed match record");
        MatchResult::malformed(reason)
    }

    #[instrument(
        skip(self, request),
        fields(request_id = %uuid::Uuid::new_v4(), options = request.options.len())
    )]
    pub async fn handle(&self, request: MatchRequest) -> MatchResult {
        let started = Instant::now();
        self.metrics.inc_request();

        let language = request.language_tag();
        let resolution = self.resolver.resolve(&request).await;

        let corrected_native = match resolution.corrected_native {
            Some(ref classifier_text) => self.corrector.apply_lexicon(classifier_text, &language),
            None => {
                self.corrector
                    .correct(&request.native_query, &language, request.credential())
                    .await
            }
        };

        self.metrics.record_source(resolution.source);
        self.metrics.observe_latency(started.elapsed());
        info!(
            source = resolution.source.as_str(),
            language = language.code(),
            latency_ms = started.elapsed().as_millis() as u64,
            "match handled"
        );

        MatchResult {
            label: resolution.label,
            source: resolution.source,
            corrected_native,
            score: resolution.score,
            error: None,
        }
    }
}
