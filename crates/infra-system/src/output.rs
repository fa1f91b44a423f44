// Parsing of the generator tool's textual output

use vanity_core::port::GenerationError;

const ADDRESS_MARKERS: [&str; 2] = ["Address:", "Public Key:"];
const SECRET_MARKERS: [&str; 2] = ["Private Key:", "Secret Key:"];
const ELAPSED_MARKER: &str = "Elapsed:";

/// Tokens extracted from one tool run
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub address: String,
    pub secret: String,
    /// Search time as reported by the tool, in seconds
    pub elapsed_seconds: Option<f64>,
}

/// First whitespace-delimited token after any of `markers`
fn token_after<'a>(text: &'a str, markers: &[&str]) -> Option<&'a str> {
    text.lines().find_map(|line| {
        markers.iter().find_map(|marker| {
            line.find(marker)
                .and_then(|at| line[at + marker.len()..].split_whitespace().next())
        })
    })
}

pub fn parse_tool_output(text: &str) -> Result<ToolOutput, GenerationError> {
    let address = token_after(text, &ADDRESS_MARKERS)
        .ok_or_else(|| GenerationError::ParseFailure("no address in generator output".to_string()))?;
    let secret = token_after(text, &SECRET_MARKERS).ok_or_else(|| {
        GenerationError::ParseFailure("no private key in generator output".to_string())
    })?;

    let elapsed_seconds = token_after(text, &[ELAPSED_MARKER])
        .map(|token| token.trim_end_matches('s'))
        .and_then(|token| token.parse::<f64>().ok())
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0);

    Ok(ToolOutput {
        address: address.to_string(),
        secret: secret.to_string(),
        elapsed_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primary_markers() {
        let text = "Searching...\nFound match!\nAddress: 7xKXab\nPrivate Key: 5Jsecret\nElapsed: 12.5s\n";
        let parsed = parse_tool_output(text).unwrap();
        assert_eq!(parsed.address, "7xKXab");
        assert_eq!(parsed.secret, "5Jsecret");
        assert_eq!(parsed.elapsed_seconds, Some(12.5));
    }

    #[test]
    fn test_parse_alternate_markers_without_elapsed() {
        let text = "  Public Key:   9Pubab  \n  Secret Key: 3Sec extra\n";
        let parsed = parse_tool_output(text).unwrap();
        assert_eq!(parsed.address, "9Pubab");
        assert_eq!(parsed.secret, "3Sec");
        assert_eq!(parsed.elapsed_seconds, None);
    }

    #[test]
    fn test_missing_tokens() {
        let err = parse_tool_output("Private Key: abc\n").unwrap_err();
        assert!(matches!(err, GenerationError::ParseFailure(msg) if msg.contains("address")));

        let err = parse_tool_output("Address: abc\nPrivate Key:\n").unwrap_err();
        assert!(matches!(err, GenerationError::ParseFailure(msg) if msg.contains("private key")));
    }

    #[test]
    fn test_unreadable_elapsed_is_ignored() {
        let parsed = parse_tool_output("Address: a\nPrivate Key: b\nElapsed: soon\n").unwrap();
        assert_eq!(parsed.elapsed_seconds, None);
    }
}
