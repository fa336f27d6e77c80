// src/infra/errors.rs — Error types for Promptsmith

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptsmithError {
    // Oracle errors (recovered locally by the engines)
    #[error("Oracle '{oracle}' unavailable: {message}")]
    OracleUnavailable { oracle: String, message: String },

    #[error("Oracle '{oracle}' timed out after {secs}s")]
    OracleTimeout { oracle: String, secs: u64 },

    #[error("Malformed oracle response (expected {expected}): {message}")]
    OracleMalformed { expected: String, message: String },

    #[error("Dynamic analysis unavailable: {0}")]
    AnalysisUnavailable(String),

    // User errors
    #[error("Unknown mode '{0}' (expected fast, balanced, thorough or research)")]
    InvalidMode(String),

    #[error("No ANTHROPIC_API_KEY set. Export it or use the claude-cli oracle.")]
    MissingApiKey,

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PromptsmithError {
    /// Transport-level failures. A timeout is treated exactly like an
    /// unreachable oracle.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            PromptsmithError::OracleUnavailable { .. } | PromptsmithError::OracleTimeout { .. }
        )
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, PromptsmithError::OracleMalformed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_counts_as_unavailable() {
        let e = PromptsmithError::OracleTimeout {
            oracle: "claude-cli".into(),
            secs: 30,
        };
        assert!(e.is_unavailable());
        assert!(!e.is_malformed());
    }

    #[test]
    fn test_malformed_is_not_unavailable() {
        let e = PromptsmithError::OracleMalformed {
            expected: "critique JSON".into(),
            message: "no object found".into(),
        };
        assert!(e.is_malformed());
        assert!(!e.is_unavailable());
    }

    #[test]
    fn test_display_messages() {
        let e = PromptsmithError::OracleUnavailable {
            oracle: "anthropic".into(),
            message: "connection refused".into(),
        };
        assert_eq!(
            e.to_string(),
            "Oracle 'anthropic' unavailable: connection refused"
        );
        assert!(PromptsmithError::InvalidMode("turbo".into())
            .to_string()
            .contains("turbo"));
    }
}
