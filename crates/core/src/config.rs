use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const DEFAULT_FUZZY_THRESHOLD: f32 = 0.6;
pub const DEFAULT_VERIFY_THRESHOLD: f32 = 0.8;
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_TRANSLATION_TIMEOUT: Duration = Duration::from_secs(15);

/// A resolution stage that can be reordered. Fallback is implicit and
/// always runs last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Direct,
    Fuzzy,
    Semantic,
}

impl Tier {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_lowercase().as_str() {
            "direct" | "contains" => Ok(Self::Direct),
            "fuzzy" => Ok(Self::Fuzzy),
            "semantic" | "ai" | "llm" => Ok(Self::Semantic),
            other => Err(CoreError::UnknownTier(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Fuzzy => "fuzzy",
            Self::Semantic => "semantic",
        }
    }
}

/// Parses a comma separated tier list such as `direct,fuzzy,semantic`.
pub fn parse_tier_order(value: &str) -> Result<Vec<Tier>, CoreError> {
    let mut tiers = Vec::new();
    for part in value.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let tier = Tier::parse(part)?;
        if tiers.contains(&tier) {
            return Err(CoreError::InvalidConfig(format!(
                "tier `{}` listed more than once",
                tier.as_str()
            )));
        }
        tiers.push(tier);
    }

    if tiers.is_empty() {
        return Err(CoreError::InvalidConfig("tier order is empty".to_string()));
    }
    Ok(tiers)
}

/// Which side of the comparison must contain the other for a direct hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Containment {
    #[default]
    OptionInQuery,
    QueryInOption,
    Either,
}

impl Containment {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "option-in-query" => Ok(Self::OptionInQuery),
            "query-in-option" => Ok(Self::QueryInOption),
            "either" | "both" => Ok(Self::Either),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown containment direction `{}`",
                other
            ))),
        }
    }

    pub fn matches(self, query: &str, option: &str) -> bool {
        if query.is_empty() || option.is_empty() {
            return false;
        }

        match self {
            Self::OptionInQuery => query.contains(option),
            Self::QueryInOption => option.contains(query),
            Self::Either => query.contains(option) || option.contains(query),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    pub tier_order: Vec<Tier>,
    pub fuzzy_threshold: f32,
    pub verify_threshold: f32,
    pub containment: Containment,
    pub fold_diacritics: bool,
    pub classifier_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tier_order: vec![Tier::Direct, Tier::Fuzzy, Tier::Semantic],
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            verify_threshold: DEFAULT_VERIFY_THRESHOLD,
            containment: Containment::OptionInQuery,
            fold_diacritics: false,
            classifier_timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }
}

impl ResolverConfig {
    pub fn validate(self) -> Result<Self, CoreError> {
        check_threshold("fuzzy_threshold", self.fuzzy_threshold)?;
        check_threshold("verify_threshold", self.verify_threshold)?;

        if self.tier_order.is_empty() {
            return Err(CoreError::InvalidConfig("tier order is empty".to_string()));
        }
        if self.classifier_timeout.is_zero() {
            return Err(CoreError::InvalidConfig(
                "classifier timeout must be positive".to_string(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionConfig {
    pub translation_timeout: Duration,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            translation_timeout: DEFAULT_TRANSLATION_TIMEOUT,
        }
    }
}

fn check_threshold(name: &str, value: f32) -> Result<(), CoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::InvalidConfig(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tier_order() {
        assert_eq!(
            parse_tier_order("fuzzy, direct").unwrap(),
            vec![Tier::Fuzzy, Tier::Direct]
        );
        assert!(parse_tier_order("direct,direct").is_err());
        assert!(parse_tier_order("direct,magic").is_err());
        assert!(parse_tier_order(" , ").is_err());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let config = ResolverConfig {
            verify_threshold: 1.2,
            ..ResolverConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(ResolverConfig::default().validate().is_ok());
    }

    #[test]
    fn containment_directions() {
        assert!(Containment::OptionInQuery.matches("how to use whatsapp", "whatsapp"));
        assert!(!Containment::QueryInOption.matches("how to use whatsapp", "whatsapp"));
        assert!(Containment::QueryInOption.matches("gpay", "gpay payments"));
        assert!(Containment::Either.matches("gpay", "gpay payments"));
        assert!(!Containment::Either.matches("", "gpay"));
    }
}
