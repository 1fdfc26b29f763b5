//! Resolution of CLI flags and environment into client configuration.

use std::path::PathBuf;
use std::time::Duration;

use ecl_client::{
    OntoServer, OntoServerConfig, Pacer, RetryPolicy, SnowstormServer, TerminologyServer,
    ontoserver, snowstorm,
};
use ecl_model::Result;

use crate::cli::{ServerArg, ServerArgs};

/// Fully resolved client settings for one run.
pub struct ClientSettings {
    pub server: Box<dyn TerminologyServer>,
    pub retry: RetryPolicy,
    pub pacer: Pacer,
    pub limit: usize,
}

impl ClientSettings {
    /// Resolve flags plus environment fallbacks into a ready client.
    ///
    /// The certificate location follows the deployment convention of the MII
    /// terminology server: `auth_path`/`auth_file` name the PKCS#12 bundle
    /// and `auth_pw` its password, unless the flags override them.
    pub fn from_args(args: &ServerArgs) -> Result<Self> {
        let timeout = args.timeout_secs.map(Duration::from_secs);

        let server: Box<dyn TerminologyServer> = match args.server {
            ServerArg::Snowstorm => {
                let base = args
                    .base_url
                    .as_deref()
                    .unwrap_or(snowstorm::DEFAULT_BASE_URL);
                let branch = args.branch.as_deref().unwrap_or(snowstorm::DEFAULT_BRANCH);
                Box::new(SnowstormServer::new(base, branch, timeout)?)
            }
            ServerArg::Ontoserver => {
                let base = args
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "https://ontoserver.mii-termserv.de/fhir".to_string());
                let mut config = OntoServerConfig::new(base);
                if let Some(version) = &args.version_url {
                    config.version_url = version.clone();
                } else {
                    config.version_url = ontoserver::DEFAULT_VERSION_URL.to_string();
                }
                config.use_post = args.use_post;
                config.pkcs12_path = args.pkcs12.clone().or_else(pkcs12_path_from_env);
                config.pkcs12_password = args
                    .pkcs12_password
                    .clone()
                    .or_else(|| password_from_env(std::env::var("auth_pw").ok()));
                config.timeout = timeout;
                Box::new(OntoServer::new(config)?)
            }
        };

        Ok(Self {
            server,
            retry: RetryPolicy::new(
                args.retry_attempts,
                Duration::from_millis(args.retry_delay_ms),
            ),
            pacer: Pacer::new(args.request_delay_ms.map(Duration::from_millis)),
            limit: args.limit,
        })
    }
}

fn pkcs12_path_from_env() -> Option<PathBuf> {
    let dir = std::env::var("auth_path").ok()?;
    let file = std::env::var("auth_file").ok()?;
    let file = file.trim_matches(['"', '\'']);
    if dir.is_empty() || file.is_empty() {
        return None;
    }
    Some(PathBuf::from(dir).join(file))
}

/// An empty or literal "none" password means no password.
fn password_from_env(value: Option<String>) -> Option<String> {
    match value {
        Some(pw) if !pw.is_empty() && !pw.eq_ignore_ascii_case("none") => Some(pw),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_passwords_are_dropped() {
        assert_eq!(password_from_env(None), None);
        assert_eq!(password_from_env(Some(String::new())), None);
        assert_eq!(password_from_env(Some("None".to_string())), None);
        assert_eq!(
            password_from_env(Some("s3cret".to_string())),
            Some("s3cret".to_string())
        );
    }
}
