// Keypair request parsing and validation (shared by queued and inline generation)

use crate::config::EngineConfig;
use crate::domain::Suffix;
use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// Request for one or more keypairs ending in `suffix`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeypairRequest {
    pub suffix: String,

    /// Clamped to [1, 10]; missing or unreadable means 1
    #[serde(default, deserialize_with = "lenient_int")]
    pub count: Option<i64>,

    /// Clamped to [1, max]; missing or unreadable means the default
    #[serde(default, deserialize_with = "lenient_int")]
    pub timeout_ms: Option<i64>,
}

impl KeypairRequest {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            ..Default::default()
        }
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// A request that passed boundary validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub suffix: Suffix,
    pub count: u32,
    pub timeout_ms: u64,
}

/// Validate the suffix and clamp count and timeout.
///
/// Only the suffix can be rejected; numeric fields are clamped.
pub fn validate_request(
    req: &KeypairRequest,
    config: &EngineConfig,
    max_suffix_len: usize,
) -> Result<ValidatedRequest> {
    let suffix = Suffix::parse(&req.suffix, max_suffix_len)?;
    Ok(ValidatedRequest {
        suffix,
        count: config.clamp_count(req.count),
        timeout_ms: config.clamp_timeout(req.timeout_ms),
    })
}

/// Accept integers, floats (truncated) and numeric strings; anything else
/// counts as absent so the default applies.
fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> KeypairRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_lenient_numeric_fields() {
        let req = parse(json!({"suffix": "ab", "count": "3", "timeout_ms": 2500.7}));
        assert_eq!(req.count, Some(3));
        assert_eq!(req.timeout_ms, Some(2500));

        let req = parse(json!({"suffix": "ab", "count": "lots", "timeout_ms": null}));
        assert_eq!(req.count, None);
        assert_eq!(req.timeout_ms, None);

        let req = parse(json!({"suffix": "ab"}));
        assert_eq!(req.count, None);
    }

    #[test]
    fn test_validate_clamps_instead_of_rejecting() {
        let config = EngineConfig {
            default_timeout_ms: 1_000,
            max_timeout_ms: 5_000,
            ..Default::default()
        };
        let req = parse(json!({"suffix": "ab", "count": 50, "timeout_ms": "999999"}));

        let validated = validate_request(&req, &config, 8).unwrap();
        assert_eq!(validated.suffix.as_str(), "ab");
        assert_eq!(validated.count, 10);
        assert_eq!(validated.timeout_ms, 5_000);

        let validated = validate_request(&KeypairRequest::new("ab"), &config, 8).unwrap();
        assert_eq!(validated.count, 1);
        assert_eq!(validated.timeout_ms, 1_000);
    }

    #[test]
    fn test_validate_rejects_bad_suffix() {
        let config = EngineConfig::default();
        let err = validate_request(&KeypairRequest::new("O0"), &config, 8).unwrap_err();
        assert!(err.to_string().contains("'O', '0'"));

        let err = validate_request(&KeypairRequest::new("abcde"), &config, 4).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }
}
