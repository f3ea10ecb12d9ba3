//! Error types for voice-mail.
//!
//! None of these reach the speaker: the orchestrator turns every failure into
//! response text. They exist for the mailbox boundary and the binary.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mailbox backend errors (fetch and send).
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Could not connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    #[error("Authentication failed for {identity}")]
    Auth { identity: String },

    #[error("Mail server protocol error: {0}")]
    Protocol(String),

    #[error("Could not parse message: {0}")]
    Parse(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("No mailbox configured for {identity}")]
    NotConfigured { identity: String },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_error_converts_into_top_level() {
        let err: Error = MailboxError::Auth {
            identity: "alice@example.com".into(),
        }
        .into();
        assert!(matches!(err, Error::Mailbox(MailboxError::Auth { .. })));
        assert_eq!(
            err.to_string(),
            "Mailbox error: Authentication failed for alice@example.com"
        );
    }

    #[test]
    fn config_error_converts_into_top_level() {
        let err: Error = ConfigError::MissingEnvVar("MAIL_APP_PASSWORD".into()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required environment variable: MAIL_APP_PASSWORD"
        );
    }
}
