use thiserror::Error;

/// Failures callers branch on. Everything else travels as a plain
/// `anyhow::Error`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("LETTA_API_KEY environment variable is required")]
    MissingApiKey,

    #[error("No assistant response found")]
    NoAssistantReply,

    #[error("No agent ID recorded in {0}; run `letta-chat setup` first")]
    MissingAgentId(String),
}

impl SetupError {
    /// Steps shown to the user alongside the error, if any
    pub fn remediation(&self) -> &'static [&'static str] {
        match self {
            SetupError::MissingApiKey => &[
                "1. Create an account at https://app.letta.com",
                "2. Get your API key from https://app.letta.com/api-keys",
                "3. Copy env.example to .env.local and add your API key",
            ],
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_lists_three_steps() {
        let steps = SetupError::MissingApiKey.remediation();
        assert_eq!(steps.len(), 3);
        for (i, step) in steps.iter().enumerate() {
            assert!(step.starts_with(&format!("{}. ", i + 1)));
        }
        assert!(steps[1].contains("https://app.letta.com/api-keys"));
        assert!(steps[2].contains(".env.local"));
    }

    #[test]
    fn test_other_errors_have_no_remediation() {
        assert!(SetupError::NoAssistantReply.remediation().is_empty());
        assert!(SetupError::MissingAgentId(".env.local".to_string())
            .remediation()
            .is_empty());
    }
}
