//! Domain errors for the signal verification system.

use thiserror::Error;

/// Domain-level errors that can occur while auditing and verifying a site.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid target URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid client data: {0}")]
    InvalidClientData(String),

    #[error("Report persistence failed: {0}")]
    ReportPersistence(String),

    #[error("Fix deployment failed: {0}")]
    Deployment(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Verification session cancelled")]
    Cancelled,

    #[error("Verification session timed out after {0}s")]
    SessionTimeout(u64),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

/// Validate that `raw` is an absolute `http`/`https` URL with a host.
pub fn validate_target_url(raw: &str) -> DomainResult<reqwest::Url> {
    let parsed = reqwest::Url::parse(raw.trim()).map_err(|e| DomainError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DomainError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(DomainError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_target_url("https://store.example.com").is_ok());
        assert!(validate_target_url("http://localhost:8080/shop").is_ok());
    }

    #[test]
    fn test_rejects_relative_and_foreign_schemes() {
        assert!(matches!(
            validate_target_url("store.example.com"),
            Err(DomainError::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_target_url("ftp://store.example.com"),
            Err(DomainError::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_target_url("not a url"),
            Err(DomainError::InvalidUrl { .. })
        ));
    }
}
