//! Shared HTTP plumbing for both backends.

use std::time::Duration;

use ecl_model::{Result, TermError};
use reqwest::blocking::Client;

/// Default per-request timeout. Individual backends can override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT_VALUE: &str = concat!("ecl-lab/", env!("CARGO_PKG_VERSION"));

/// Build the blocking client both backends share.
///
/// The optional identity carries the mTLS client certificate; only the
/// OntoServer backend passes one.
pub(crate) fn build_client(
    timeout: Duration,
    identity: Option<reqwest::Identity>,
) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT_VALUE);
    if let Some(identity) = identity {
        builder = builder.identity(identity);
    }
    builder
        .build()
        .map_err(|e| TermError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Classify a transport-level failure (the request never produced a status).
///
/// Connection refusals and timeouts are the only retryable failures; anything
/// else at this layer is a rejected query.
pub(crate) fn transport_error(err: &reqwest::Error, ecl: &str) -> TermError {
    if err.is_timeout() || err.is_connect() {
        TermError::TransientNetwork(err.to_string())
    } else {
        TermError::Query {
            status: err.status().map_or(0, |s| s.as_u16()),
            message: err.to_string(),
            ecl: ecl.to_string(),
        }
    }
}

/// Classify a non-success HTTP status.
pub(crate) fn status_error(status: u16, body: String, ecl: &str) -> TermError {
    match status {
        401 | 403 => TermError::Authentication(format!("server returned {status}: {body}")),
        _ => TermError::Query {
            status,
            message: body,
            ecl: ecl.to_string(),
        },
    }
}

/// A malformed response body from an otherwise successful request.
pub(crate) fn decode_error(message: impl std::fmt::Display, ecl: &str) -> TermError {
    TermError::Query {
        status: 200,
        message: format!("failed to decode response: {message}"),
        ecl: ecl.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_is_authentication_not_query() {
        let err = status_error(403, "certificate required".to_string(), "<< 363787002");
        assert_eq!(err.kind(), "authentication");
        assert!(!err.is_retryable());

        let err = status_error(401, "no credentials".to_string(), "<< 363787002");
        assert_eq!(err.kind(), "authentication");
    }

    #[test]
    fn other_statuses_are_query_errors_carrying_the_ecl() {
        let ecl = "<< 363787002 : 246093002 = 38082009";
        let err = status_error(422, "unparsable expression".to_string(), ecl);
        assert_eq!(err.kind(), "query");
        assert!(err.to_string().contains(ecl));
        assert!(!err.is_retryable());
    }

    #[test]
    fn decode_failures_are_query_errors() {
        let err = decode_error("missing field `items`", "<< 363787002");
        assert_eq!(err.kind(), "query");
        assert!(!err.is_retryable());
    }
}
