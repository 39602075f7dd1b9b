use std::sync::Arc;

use sarathi_core::{
    FuzzyMatch, FuzzyMatcher, MatchRequest, MatchSource, ResolverConfig, Tier, NONE_LABEL,
};
use sarathi_llm::{ClassifierQuery, ClassifierVerdict, CollaboratorError, SemanticClassifier};
use sarathi_observability::AppMetrics;
use tracing::{debug, warn};

/// Outcome of the tier walk. `label` is always `NONE` or an element of the
/// request's options.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub label: String,
    pub source: MatchSource,
    pub score: Option<f32>,
    /// Correction the semantic classifier produced alongside its label, if
    /// it was consulted and answered.
    pub corrected_native: Option<String>,
}

impl Resolution {
    fn hit(hit: FuzzyMatch<'_>, source: MatchSource) -> Self {
        Self {
            label: hit.label.to_string(),
            source,
            score: Some(hit.score),
            corrected_native: None,
        }
    }

    fn fallback(corrected_native: Option<String>) -> Self {
        Self {
            label: NONE_LABEL.to_string(),
            source: MatchSource::Fallback,
            score: None,
            corrected_native,
        }
    }
}

pub struct IntentResolver<C> {
    classifier: Arc<C>,
    config: ResolverConfig,
    matcher: FuzzyMatcher,
    metrics: Arc<AppMetrics>,
}

impl<C> IntentResolver<C>
where
    C: SemanticClassifier,
{
    pub fn new(classifier: Arc<C>, config: ResolverConfig, metrics: Arc<AppMetrics>) -> Self {
        let matcher = FuzzyMatcher::from_config(&config);
        Self {
            classifier,
            config,
            matcher,
            metrics,
        }
    }

    /// Walks the configured tiers in order; the first terminal tier wins and
    /// the implicit fallback answers `NONE` otherwise.
    pub async fn resolve(&self, request: &MatchRequest) -> Resolution {
        let options = request.options.as_slice();
        let mut classifier_correction = None;

        for tier in &self.config.tier_order {
            match tier {
                Tier::Direct => {
                    if let Some(hit) = self.matcher.contains(&request.user_query, options) {
                        debug!(label = hit.label, "direct containment hit");
                        return Resolution::hit(hit, MatchSource::Direct);
                    }
                }
                Tier::Fuzzy => {
                    let threshold = self.config.fuzzy_threshold;
                    match self.matcher.find(&request.user_query, options, threshold) {
                        Some(hit) if hit.score > threshold => {
                            debug!(label = hit.label, score = hit.score, "fuzzy hit");
                            return Resolution::hit(hit, MatchSource::Fuzzy);
                        }
                        Some(hit) => {
                            debug!(score = hit.score, "fuzzy score not above threshold");
                        }
                        None => debug!("fuzzy tier inconclusive"),
                    }
                }
                Tier::Semantic => {
                    let Some(credential) = request.credential() else {
                        debug!("no credential, semantic tier skipped");
                        continue;
                    };
                    if options.is_empty() {
                        continue;
                    }

                    let Some(verdict) = self.consult_classifier(request, credential).await else {
                        continue;
                    };
                    classifier_correction = verdict.corrected_native.clone();

                    if let Some(hit) = self.verify(&verdict.label, options) {
                        return Resolution {
                            corrected_native: classifier_correction,
                            ..Resolution::hit(hit, MatchSource::Semantic)
                        };
                    }
                }
            }
        }

        Resolution::fallback(classifier_correction)
    }

    /// Accepts a classifier label only if it names one of `options`: exact
    /// text first, then the stricter fuzzy pass to absorb formatting drift.
    pub fn verify<'a>(&self, candidate: &str, options: &'a [String]) -> Option<FuzzyMatch<'a>> {
        let candidate = candidate.trim();
        if candidate.is_empty() || candidate.eq_ignore_ascii_case(NONE_LABEL) {
            debug!("classifier declined to pick a topic");
            return None;
        }

        if let Some(index) = options.iter().position(|option| option == candidate) {
            return Some(FuzzyMatch {
                label: options[index].as_str(),
                index,
                score: 1.0,
            });
        }

        let verified = self
            .matcher
            .find(candidate, options, self.config.verify_threshold);
        if verified.is_none() {
            self.metrics.inc_verification_reject();
            warn!(candidate, "classifier label outside option set, rejected");
        }
        verified
    }

    async fn consult_classifier(
        &self,
        request: &MatchRequest,
        credential: &str,
    ) -> Option<ClassifierVerdict> {
        let language = request.language_tag();
        let query = ClassifierQuery {
            english_text: &request.user_query,
            native_text: &request.native_query,
            options: &request.options,
            language: &language,
        };

        let outcome = tokio::time::timeout(
            self.config.classifier_timeout,
            self.classifier.classify(query, credential),
        )
        .await
        .unwrap_or(Err(CollaboratorError::Timeout));

        match outcome {
            Ok(verdict) => {
                debug!(
                    model = self.classifier.model_name(),
                    candidate = %verdict.label,
                    "classifier answered"
                );
                Some(verdict)
            }
            Err(err) => {
                self.metrics.inc_collaborator_failure();
                warn!(
                    model = self.classifier.model_name(),
                    error = %err,
                    "semantic classifier failed, falling through"
                );
                None
            }
        }
    }
}
