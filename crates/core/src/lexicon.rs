use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

impl Substitution {
    fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Per-language lexical fixups applied to corrected text, keyed by ISO code.
/// Loaded from JSON so the domain table can change without a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LexiconTable {
    by_language: HashMap<String, Vec<Substitution>>,
}

impl LexiconTable {
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let table: Self = serde_json::from_str(raw)
            .map_err(|err| CoreError::InvalidLexicon(err.to_string()))?;
        table.validate()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CoreError::LexiconRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Canonical app-name spellings plus a few colloquial loanword
    /// preferences.
    pub fn builtin() -> Self {
        let mut by_language = HashMap::new();
        by_language.insert(
            "ml".to_string(),
            vec![
                Substitution::new("വാട്ട്സ്ആപ്പ്", "വാട്‌സാപ്പ്"),
                Substitution::new("ഡിജി ലോക്കർ", "ഡിജിലോക്കർ"),
                Substitution::new("സന്ദേശം", "മെസ്സേജ്"),
                Substitution::new("ചലഭാഷിണി", "മൊബൈൽ"),
            ],
        );
        by_language.insert(
            "hi".to_string(),
            vec![
                Substitution::new("वॉट्सऐप", "व्हाट्सएप"),
                Substitution::new("डिजी लॉकर", "डिजिलॉकर"),
                Substitution::new("संदेश", "मैसेज"),
                Substitution::new("भुगतान", "पेमेंट"),
            ],
        );
        by_language.insert(
            "ta".to_string(),
            vec![
                Substitution::new("குறுஞ்செய்தி", "மெசேஜ்"),
                Substitution::new("கைபேசி", "மொபைல்"),
            ],
        );
        Self { by_language }
    }

    pub fn validate(self) -> Result<Self, CoreError> {
        for (language, substitutions) in &self.by_language {
            for substitution in substitutions {
                if substitution.from.is_empty() {
                    return Err(CoreError::InvalidLexicon(format!(
                        "empty `from` in `{}` table",
                        language
                    )));
                }
                if substitution.to.contains(&substitution.from) {
                    return Err(CoreError::InvalidLexicon(format!(
                        "`{}` -> `{}` in `{}` table rewrites its own output",
                        substitution.from, substitution.to, language
                    )));
                }
            }
        }
        Ok(self)
    }

    pub fn substitutions(&self, language_code: &str) -> &[Substitution] {
        self.by_language
            .get(language_code)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn apply(&self, language_code: &str, text: &str) -> String {
        self.substitutions(language_code)
            .iter()
            .fold(text.to_string(), |acc, substitution| {
                acc.replace(&substitution.from, &substitution.to)
            })
    }

    pub fn len(&self) -> usize {
        self.by_language.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_language_table_in_order() {
        let table = LexiconTable::from_json(
            r#"{"ml": [{"from": "foo", "to": "bar"}, {"from": "bar baz", "to": "qux"}]}"#,
        )
        .unwrap();
        assert_eq!(table.apply("ml", "foo baz"), "qux");
        assert_eq!(table.apply("hi", "foo baz"), "foo baz");
    }

    #[test]
    fn canonical_text_is_unchanged() {
        let table = LexiconTable::builtin();
        let canonical = "വാട്‌സാപ്പ് മെസ്സേജ് അയയ്ക്കുന്നത് എങ്ങനെ";
        assert_eq!(table.apply("ml", canonical), canonical);
        assert_eq!(table.apply("ml", &table.apply("ml", canonical)), canonical);
    }

    #[test]
    fn prefers_colloquial_loanword() {
        let table = LexiconTable::builtin();
        assert_eq!(table.apply("hi", "संदेश भेजें"), "मैसेज भेजें");
    }

    #[test]
    fn rejects_self_expanding_rules() {
        let err = LexiconTable::from_json(r#"{"hi": [{"from": "pay", "to": "gpay"}]}"#);
        assert!(matches!(err, Err(CoreError::InvalidLexicon(_))));

        let err = LexiconTable::from_json(r#"{"hi": [{"from": "", "to": "x"}]}"#);
        assert!(err.is_err());
    }

    #[test]
    fn builtin_table_is_valid() {
        let table = LexiconTable::builtin();
        assert!(!table.is_empty());
        assert!(table.clone().validate().is_ok());
    }
}
