pub mod config;
pub mod error;
pub mod fuzzy;
pub mod lexicon;
pub mod models;
pub mod normalize;
pub mod wire;

pub use config::{
    parse_tier_order, Containment, CorrectionConfig, ResolverConfig, Tier,
    DEFAULT_CLASSIFIER_TIMEOUT, DEFAULT_FUZZY_THRESHOLD, DEFAULT_TRANSLATION_TIMEOUT,
    DEFAULT_VERIFY_THRESHOLD,
};
pub use error::CoreError;
pub use fuzzy::{fuzzy_match, similarity_ratio, FuzzyMatch, FuzzyMatcher};
pub use lexicon::{LexiconTable, Substitution};
pub use models::*;
pub use normalize::{normalize_for_compare, normalize_text, strip_diacritics};
pub use wire::{decode_record, encode_record, OutputEncoding};
