//! Subject naming and matching.
//!
//! Subjects are dot-separated tokens scoped per party:
//!
//! - requests: `<namespace>.forVault.<operation>`
//! - responses: `<namespace>.forApp.<operation>`, listened to as
//!   `<namespace>.forApp.>`
//!
//! In patterns `*` matches exactly one token and `>` matches one or more
//! trailing tokens.

use crate::errors::SubjectError;
use std::fmt;

const SINGLE_WILDCARD: &str = "*";
const TAIL_WILDCARD: &str = ">";

/// Subject a request for `operation` is published on.
pub fn vault_subject(namespace: &str, operation: &str) -> String {
    format!("{namespace}.forVault.{operation}")
}

/// Subject the vault answers `operation` on.
pub fn app_subject(namespace: &str, operation: &str) -> String {
    format!("{namespace}.forApp.{operation}")
}

/// Pattern covering every response for `namespace`.
pub fn app_wildcard(namespace: &str) -> String {
    format!("{namespace}.forApp.>")
}

fn check_tokens(subject: &str) -> Result<Vec<&str>, SubjectError> {
    if subject.is_empty() {
        return Err(SubjectError::Empty);
    }
    let tokens: Vec<&str> = subject.split('.').collect();
    for token in &tokens {
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(SubjectError::InvalidToken {
                subject: subject.to_string(),
                token: (*token).to_string(),
            });
        }
    }
    Ok(tokens)
}

/// Validate a concrete subject for publishing (no wildcards).
pub fn validate_publish_subject(subject: &str) -> Result<(), SubjectError> {
    let tokens = check_tokens(subject)?;
    if tokens
        .iter()
        .any(|t| *t == SINGLE_WILDCARD || *t == TAIL_WILDCARD)
    {
        return Err(SubjectError::WildcardNotAllowed(subject.to_string()));
    }
    Ok(())
}

/// A parsed subscription pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectPattern {
    raw: String,
    tokens: Vec<String>,
}

impl SubjectPattern {
    /// Parse and validate a pattern.
    pub fn parse(pattern: &str) -> Result<Self, SubjectError> {
        let tokens = check_tokens(pattern)?;
        if let Some(pos) = tokens.iter().position(|t| *t == TAIL_WILDCARD) {
            if pos != tokens.len() - 1 {
                return Err(SubjectError::MisplacedTailWildcard(pattern.to_string()));
            }
        }
        Ok(Self {
            raw: pattern.to_string(),
            tokens: tokens.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `subject` is covered by this pattern.
    pub fn matches(&self, subject: &str) -> bool {
        let mut subject_tokens = subject.split('.');
        for (i, token) in self.tokens.iter().enumerate() {
            if token == TAIL_WILDCARD {
                // '>' needs at least one remaining token
                return i == self.tokens.len() - 1 && subject_tokens.next().is_some();
            }
            match subject_tokens.next() {
                Some(s) if token == SINGLE_WILDCARD || token == s => {}
                _ => return false,
            }
        }
        subject_tokens.next().is_none()
    }
}

impl fmt::Display for SubjectPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
