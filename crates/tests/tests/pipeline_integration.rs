use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sarathi_agents::{Corrector, IntentResolver, MatchAgent};
use sarathi_core::{
    encode_record, parse_tier_order, CorrectionConfig, LanguageTag, LexiconTable, MatchRequest,
    MatchSource, OutputEncoding, ResolverConfig,
};
use sarathi_llm::{
    ClassifierQuery, ClassifierVerdict, CollaboratorError, SemanticClassifier, Translator,
};
use sarathi_observability::AppMetrics;
use serde_json::json;

const SHORT_TIMEOUT: Duration = Duration::from_millis(50);
const HANG: Duration = Duration::from_secs(5);

#[derive(Clone)]
enum Behaviour {
    Answer(&'static str, Option<&'static str>),
    Fail,
    Hang,
}

struct FakeClassifier {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl FakeClassifier {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SemanticClassifier for FakeClassifier {
    fn model_name(&self) -> &str {
        "fake-classifier"
    }

    async fn classify(
        &self,
        query: ClassifierQuery<'_>,
        credential: &str,
    ) -> Result<ClassifierVerdict, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!credential.is_empty());
        assert!(!query.options.is_empty());

        match self.behaviour {
            Behaviour::Answer(label, corrected) => Ok(ClassifierVerdict {
                label: label.to_string(),
                corrected_native: corrected.map(str::to_string),
            }),
            Behaviour::Fail => Err(CollaboratorError::Transport("connection reset".to_string())),
            Behaviour::Hang => {
                tokio::time::sleep(HANG).await;
                Err(CollaboratorError::Timeout)
            }
        }
    }
}

/// Echoes text back unchanged unless told to fail or hang.
struct FakeTranslator {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl FakeTranslator {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Translator for FakeTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_hint: &str,
        _target: &LanguageTag,
        _credential: &str,
    ) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Answer(..) => Ok(text.to_string()),
            Behaviour::Fail => Err(CollaboratorError::EmptyOutput),
            Behaviour::Hang => {
                tokio::time::sleep(HANG).await;
                Ok(text.to_string())
            }
        }
    }
}

fn echo() -> Arc<FakeTranslator> {
    FakeTranslator::new(Behaviour::Answer("", None))
}

fn pipeline(
    classifier: Arc<FakeClassifier>,
    translator: Arc<FakeTranslator>,
    config: ResolverConfig,
) -> MatchAgent<FakeClassifier, FakeTranslator> {
    let metrics = AppMetrics::shared();
    MatchAgent::new(
        IntentResolver::new(
            classifier,
            ResolverConfig {
                classifier_timeout: SHORT_TIMEOUT,
                ..config
            },
            metrics.clone(),
        ),
        Corrector::new(
            translator,
            Arc::new(LexiconTable::builtin()),
            CorrectionConfig {
                translation_timeout: SHORT_TIMEOUT,
            },
            metrics.clone(),
        ),
        metrics,
    )
}

fn request(query: &str, options: &[&str], credential: Option<&str>) -> MatchRequest {
    MatchRequest {
        user_query: query.to_string(),
        native_query: String::new(),
        options: options.iter().map(|option| option.to_string()).collect(),
        language: "Malayalam".to_string(),
        credential: credential.map(str::to_string),
    }
}

#[tokio::test]
async fn direct_containment_answers_without_the_classifier() {
    let classifier = FakeClassifier::new(Behaviour::Answer("GPay", None));
    let agent = pipeline(classifier.clone(), echo(), ResolverConfig::default());

    let result = agent
        .handle(request(
            "how to use whatsapp",
            &["WhatsApp", "GPay", "UPI"],
            Some("key"),
        ))
        .await;

    assert_eq!(result.label, "WhatsApp");
    assert_eq!(result.source, MatchSource::Direct);
    assert_eq!(result.score, Some(1.0));
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn misspelled_query_resolves_through_fuzzy_tier() {
    let classifier = FakeClassifier::new(Behaviour::Fail);
    let agent = pipeline(classifier.clone(), echo(), ResolverConfig::default());

    let result = agent
        .handle(request("whatsap help", &["WhatsApp", "GPay"], Some("key")))
        .await;

    assert_eq!(result.label, "WhatsApp");
    assert_eq!(result.source, MatchSource::Fuzzy);
    assert!(result.score.unwrap() > 0.6);
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn without_credential_no_collaborator_is_called() {
    let classifier = FakeClassifier::new(Behaviour::Answer("GPay", None));
    let translator = echo();
    let agent = pipeline(classifier.clone(), translator.clone(), ResolverConfig::default());

    let mut record = request("send money to amma", &["WhatsApp", "GPay"], None);
    record.native_query = "അമ്മയ്ക്ക് പൈസ അയക്കണം".to_string();
    let result = agent.handle(record).await;

    assert!(result.is_none());
    assert_eq!(result.source, MatchSource::Fallback);
    assert_eq!(result.corrected_native, "അമ്മയ്ക്ക് പൈസ അയക്കണം");
    assert_eq!(classifier.calls(), 0);
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn classifier_label_is_verified_against_options() {
    let classifier = FakeClassifier::new(Behaviour::Answer("Whatsapp.", Some("വാട്‌സാപ്പ്")));
    let translator = echo();
    let agent = pipeline(classifier.clone(), translator.clone(), ResolverConfig::default());

    let result = agent
        .handle(request("send a voice note to my son", &["WhatsApp"], Some("key")))
        .await;

    assert_eq!(result.label, "WhatsApp");
    assert_eq!(result.source, MatchSource::Semantic);
    assert_eq!(result.corrected_native, "വാട്‌സാപ്പ്");
    assert_eq!(classifier.calls(), 1);
    assert_eq!(translator.calls(), 0);
}

#[tokio::test]
async fn invented_labels_never_escape() {
    let classifier = FakeClassifier::new(Behaviour::Answer("Instagram", None));
    let agent = pipeline(classifier.clone(), echo(), ResolverConfig::default());

    let result = agent
        .handle(request("post a reel", &["WhatsApp", "GPay"], Some("key")))
        .await;

    assert!(result.is_none());
    assert_eq!(result.source, MatchSource::Fallback);
    assert_eq!(agent.metrics().snapshot().verification_rejects_total, 1);
}

#[tokio::test]
async fn closed_set_holds_across_tiers() {
    let options = ["WhatsApp", "GPay", "check bank balance", "DigiLocker"];
    let answers = ["GPay", "gpay ", "NONE", "Paytm", "", "Check Bank Balance!"];
    let queries = [
        "how do i open whatsapp",
        "digilokar",
        "what is my balance",
        "",
        "book a train ticket",
    ];

    for answer in answers {
        let agent = pipeline(
            FakeClassifier::new(Behaviour::Answer(answer, None)),
            echo(),
            ResolverConfig::default(),
        );
        for query in queries {
            let result = agent.handle(request(query, &options, Some("key"))).await;
            assert!(
                result.is_none() || options.contains(&result.label.as_str()),
                "{query:?} / {answer:?} produced {:?}",
                result.label
            );
        }
    }
}

#[tokio::test]
async fn hanging_collaborators_are_cut_off() {
    let classifier = FakeClassifier::new(Behaviour::Hang);
    let translator = FakeTranslator::new(Behaviour::Hang);
    let agent = pipeline(classifier.clone(), translator.clone(), ResolverConfig::default());

    let mut record = request("book a train ticket", &["WhatsApp", "GPay"], Some("key"));
    record.native_query = "ട്രെയിൻ ടിക്കറ്റ്".to_string();

    let started = Instant::now();
    let result = agent.handle(record).await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(result.is_none());
    assert_eq!(result.source, MatchSource::Fallback);
    assert_eq!(result.corrected_native, "ട്രെയിൻ ടിക്കറ്റ്");
    assert_eq!(classifier.calls(), 1);
    assert_eq!(translator.calls(), 1);
    assert_eq!(agent.metrics().snapshot().collaborator_failures_total, 2);
}

#[tokio::test]
async fn failing_translator_keeps_native_text() {
    let agent = pipeline(
        FakeClassifier::new(Behaviour::Fail),
        FakeTranslator::new(Behaviour::Fail),
        ResolverConfig::default(),
    );

    let mut record = request("open gpay", &["GPay"], Some("key"));
    record.native_query = "ജിപേ തുറക്കുക".to_string();
    let result = agent.handle(record).await;

    assert_eq!(result.label, "GPay");
    assert_eq!(result.corrected_native, "ജിപേ തുറക്കുക");
}

#[tokio::test]
async fn correction_is_idempotent_on_canonical_text() {
    let agent = pipeline(
        FakeClassifier::new(Behaviour::Fail),
        echo(),
        ResolverConfig::default(),
    );

    let mut record = request("open whatsapp", &["WhatsApp"], Some("key"));
    record.native_query = "വാട്‌സാപ്പ് തുറക്കുക".to_string();
    let first = agent.handle(record.clone()).await;
    record.native_query = first.corrected_native.clone();
    let second = agent.handle(record).await;

    assert_eq!(first.corrected_native, "വാട്‌സാപ്പ് തുറക്കുക");
    assert_eq!(second.corrected_native, first.corrected_native);
}

#[tokio::test]
async fn tier_order_is_configurable() {
    let classifier = FakeClassifier::new(Behaviour::Answer("GPay", None));
    let config = ResolverConfig {
        tier_order: parse_tier_order("semantic, direct, fuzzy").unwrap(),
        ..ResolverConfig::default()
    };
    let agent = pipeline(classifier.clone(), echo(), config);

    let result = agent
        .handle(request("pay with whatsapp", &["WhatsApp", "GPay"], Some("key")))
        .await;

    assert_eq!(result.label, "GPay");
    assert_eq!(result.source, MatchSource::Semantic);
    assert_eq!(classifier.calls(), 1);
}

#[tokio::test]
async fn empty_options_always_fall_back() {
    let classifier = FakeClassifier::new(Behaviour::Answer("WhatsApp", None));
    let agent = pipeline(classifier.clone(), echo(), ResolverConfig::default());

    let result = agent.handle(request("whatsapp", &[], Some("key"))).await;

    assert!(result.is_none());
    assert_eq!(result.source, MatchSource::Fallback);
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn malformed_records_get_a_well_formed_answer() {
    let agent = pipeline(
        FakeClassifier::new(Behaviour::Fail),
        echo(),
        ResolverConfig::default(),
    );

    for line in ["not json", "{\"userQuery\": 42}", "[1, 2, 3]"] {
        let result = agent.handle_line(line).await;
        assert!(result.is_none());
        assert_eq!(result.corrected_native, "");
        assert!(result.error.is_some(), "{line} should carry an error");
    }
    assert_eq!(agent.metrics().snapshot().malformed_total, 3);
}

#[tokio::test]
async fn response_record_uses_wire_field_names() {
    let agent = pipeline(
        FakeClassifier::new(Behaviour::Fail),
        echo(),
        ResolverConfig::default(),
    );

    let result = agent
        .handle_line(r#"{"userQuery": "upi pin reset", "options": ["UPI"], "apiKey": ""}"#)
        .await;
    let line = encode_record(&result, OutputEncoding::Utf8).unwrap();
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();

    assert_eq!(
        value,
        json!({ "match": "UPI", "source": "direct", "correctedNative": "", "score": 1.0 })
    );
}
