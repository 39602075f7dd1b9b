use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown tier `{0}` (expected direct, fuzzy or semantic)")]
    UnknownTier(String),
    #[error("failed reading lexicon at {path}")]
    LexiconRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid lexicon: {0}")]
    InvalidLexicon(String),
    #[error("malformed record: {0}")]
    MalformedRecord(#[from] serde_json::Error),
}
