use serde::{Deserialize, Serialize};

/// Literal label returned when no option could be trusted.
pub const NONE_LABEL: &str = "NONE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Malayalam,
    Tamil,
    Hindi,
    Kannada,
    Telugu,
    Unknown,
}

impl Language {
    pub fn from_optional_str(value: Option<&str>) -> Self {
        let Some(raw) = value.map(|v| v.trim().to_lowercase()) else {
            return Self::Unknown;
        };
        // "ml-IN" and "ml_IN" both resolve through their primary subtag.
        let primary = raw.split(['-', '_']).next().unwrap_or_default();

        match primary {
            "en" | "eng" | "english" => Self::English,
            "ml" | "mal" | "malayalam" => Self::Malayalam,
            "ta" | "tam" | "tamil" => Self::Tamil,
            "hi" | "hin" | "hindi" => Self::Hindi,
            "kn" | "kan" | "kannada" => Self::Kannada,
            "te" | "tel" | "telugu" => Self::Telugu,
            _ => Self::Unknown,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Malayalam => "ml",
            Self::Tamil => "ta",
            Self::Hindi => "hi",
            Self::Kannada => "kn",
            Self::Telugu => "te",
            Self::Unknown => "unknown",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Malayalam => "Malayalam",
            Self::Tamil => "Tamil",
            Self::Hindi => "Hindi",
            Self::Kannada => "Kannada",
            Self::Telugu => "Telugu",
            Self::Unknown => "Native Language",
        }
    }
}

/// A caller-supplied language tag together with its parsed form.
///
/// Collaborators receive the ISO code or display name when the tag is known
/// and the trimmed raw tag otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTag {
    raw: String,
    language: Language,
}

impl LanguageTag {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.trim().to_string(),
            language: Language::from_optional_str(Some(raw)),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn code(&self) -> &str {
        match self.language {
            Language::Unknown if !self.raw.is_empty() => &self.raw,
            language => language.as_code(),
        }
    }

    pub fn name(&self) -> &str {
        match self.language {
            Language::Unknown if !self.raw.is_empty() => &self.raw,
            language => language.display_name(),
        }
    }
}

fn default_language() -> String {
    Language::English.display_name().to_string()
}

/// One inbound `match` record. `options` is the closed universe of valid
/// outcomes for this request only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    #[serde(default)]
    pub user_query: String,
    #[serde(default)]
    pub native_query: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, alias = "apiKey", skip_serializing)]
    pub credential: Option<String>,
}

impl MatchRequest {
    /// Credential with surrounding whitespace removed; blank counts as absent.
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn language_tag(&self) -> LanguageTag {
        LanguageTag::parse(&self.language)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Direct,
    Fuzzy,
    Semantic,
    Fallback,
}

impl MatchSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Fuzzy => "fuzzy",
            Self::Semantic => "semantic",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    #[serde(rename = "match")]
    pub label: String,
    pub source: MatchSource,
    pub corrected_native: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MatchResult {
    pub fn fallback(corrected_native: impl Into<String>) -> Self {
        Self {
            label: NONE_LABEL.to_string(),
            source: MatchSource::Fallback,
            corrected_native: corrected_native.into(),
            score: None,
            error: None,
        }
    }

    /// Response for a record that could not be read at all.
    pub fn malformed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::fallback(String::new())
        }
    }

    pub fn is_none(&self) -> bool {
        self.label == NONE_LABEL
    }
}

fn default_target_language() -> String {
    Language::English.as_code().to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
    #[serde(default)]
    pub text: String,
    #[serde(
        default = "default_target_language",
        rename = "target_lang",
        alias = "targetLanguage"
    )]
    pub target_language: String,
    #[serde(default, rename = "apiKey", alias = "credential", skip_serializing)]
    pub credential: Option<String>,
}

impl TranslationRequest {
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_transcription_language() -> String {
    "ml-IN".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default = "default_transcription_language")]
    pub language: String,
    #[serde(default, rename = "apiKey", alias = "credential", skip_serializing)]
    pub credential: Option<String>,
}

impl TranscriptionRequest {
    pub fn credential(&self) -> Option<&str> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
