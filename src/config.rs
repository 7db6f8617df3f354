//! Parser configuration
//!
//! Deserialized from JSON, e.g. as passed through the FFI layer. Every
//! field has a default so partial documents are accepted.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Selectors for the top-level result groups; the first one matching
    /// anything wins
    pub candidate_selectors: Vec<String>,
    /// Query parameter carrying the pagination offset
    pub pagination_param: String,
    /// Heading text announcing the organic results block
    pub web_results_marker: String,
    /// Class of the content wrapper inside a classical result, until a
    /// different one is learned from the page
    pub wrapper_class: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            candidate_selectors: vec![
                "#rso > *".to_string(),
                "#ires > *".to_string(),
                "body > *".to_string(),
            ],
            pagination_param: "start".to_string(),
            web_results_marker: "Web results".to_string(),
            wrapper_class: "rc".to_string(),
        }
    }
}

impl ParserConfig {
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(|e| ParseError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ParserConfig::from_json(r#"{"pagination_param": "first"}"#).unwrap();
        assert_eq!(config.pagination_param, "first");
        assert_eq!(config.wrapper_class, "rc");
        assert_eq!(config.candidate_selectors.len(), 3);
    }

    #[test]
    fn test_invalid_config() {
        let err = ParserConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ParseError::InvalidConfig(_)));
    }
}
