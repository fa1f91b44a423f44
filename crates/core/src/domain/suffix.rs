// Suffix value object (validated at the service boundary)

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Characters the base58 alphabet leaves out because they collide visually
/// with other glyphs.
pub const EXCLUDED_CHARS: [char; 4] = ['0', 'O', 'I', 'l'];

/// A suffix that can appear at the end of a base58 public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suffix(String);

impl Suffix {
    /// Validate a raw suffix.
    ///
    /// Excluded characters are checked first so the caller always learns
    /// exactly which of them were present, deduplicated and in order of
    /// first appearance.
    pub fn parse(raw: &str, max_len: usize) -> Result<Self> {
        if raw.is_empty() {
            return Err(DomainError::InvalidSuffix(
                "suffix must not be empty".to_string(),
            ));
        }

        let offending = excluded_chars_in(raw);
        if !offending.is_empty() {
            let listed: Vec<String> = offending.iter().map(|c| format!("'{}'", c)).collect();
            return Err(DomainError::InvalidSuffix(format!(
                "suffix contains characters excluded from base58: {}",
                listed.join(", ")
            )));
        }

        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::InvalidSuffix(
                "suffix must be alphanumeric".to_string(),
            ));
        }

        let len = raw.chars().count();
        if len > max_len {
            return Err(DomainError::InvalidSuffix(format!(
                "suffix too long: {} characters (max {})",
                len, max_len
            )));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Suffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Excluded characters present in `raw`, deduplicated, first appearance first
pub fn excluded_chars_in(raw: &str) -> Vec<char> {
    let mut found = Vec::new();
    for c in raw.chars() {
        if EXCLUDED_CHARS.contains(&c) && !found.contains(&c) {
            found.push(c);
        }
    }
    found
}
