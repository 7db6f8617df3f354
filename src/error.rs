//! Error types for SERP parsing

use thiserror::Error;

/// Errors raised while parsing a results page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A rule claimed a node but a sub-element its schema requires is absent.
    /// Not caught by the engine: the whole page parse fails.
    #[error("{rule}: required element '{element}' not found")]
    MissingRequiredElement {
        rule: &'static str,
        element: &'static str,
    },

    #[error("Invalid page URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid path query '{expression}': {reason}")]
    InvalidPathQuery { expression: String, reason: String },

    #[error("Invalid parser configuration: {0}")]
    InvalidConfig(String),
}

impl ParseError {
    pub fn missing(rule: &'static str, element: &'static str) -> Self {
        ParseError::MissingRequiredElement { rule, element }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_element_message() {
        let err = ParseError::missing("classical_result", "h3");
        assert_eq!(
            err.to_string(),
            "classical_result: required element 'h3' not found"
        );
    }
}
