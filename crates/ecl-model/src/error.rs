use thiserror::Error;

/// Shared error taxonomy for a comparison run.
///
/// Each variant maps to a distinct handling policy: configuration and data
/// load problems abort the run before any query executes, transient network
/// failures are retried a bounded number of times, everything else fails the
/// affected query only.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TermError {
    /// Malformed query specification or missing required configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A static input file is missing or unparseable.
    #[error("data load error in {path}: {message}")]
    DataLoad { path: String, message: String },

    /// Connection failure or timeout talking to the terminology server.
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// Certificate or credential rejected by the server.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// The server understood the request but rejected it.
    ///
    /// Carries the full rendered ECL so the operator can debug the template.
    #[error("query rejected (status {status}): {message}\necl: {ecl}")]
    Query {
        status: u16,
        message: String,
        ecl: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TermError {
    /// Returns true when retrying the same request can succeed.
    ///
    /// Only transient network failures qualify; an invalid query or a bad
    /// certificate will fail the same way on every attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }

    /// Short component-agnostic label used in failure reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::DataLoad { .. } => "data-load",
            Self::TransientNetwork(_) => "transient-network",
            Self::Authentication(_) => "authentication",
            Self::Query { .. } => "query",
            Self::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, TermError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(TermError::TransientNetwork("timeout".to_string()).is_retryable());
        assert!(!TermError::Authentication("bad cert".to_string()).is_retryable());
        assert!(
            !TermError::Query {
                status: 400,
                message: "bad ecl".to_string(),
                ecl: "<< x".to_string(),
            }
            .is_retryable()
        );
        assert!(!TermError::Configuration("missing path".to_string()).is_retryable());
    }

    #[test]
    fn query_error_carries_ecl() {
        let error = TermError::Query {
            status: 422,
            message: "unparsable expression".to_string(),
            ecl: "<< 363787002 : 246093002 = 38082009".to_string(),
        };
        let text = error.to_string();
        assert!(text.contains("422"));
        assert!(text.contains("246093002"));
    }
}
