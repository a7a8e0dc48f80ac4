//! Client configuration.
//!
//! Configuration comes either from explicit values or from `SCM_*`
//! environment variables via [`ClientConfig::from_env`].

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::driver::tencentgit::DEFAULT_SERVER;
use crate::error::{Error, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Supported hosting providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// TencentGit (git.code.tencent.com and private deployments)
    #[default]
    TencentGit,
}

impl ProviderKind {
    /// Driver name as accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TencentGit => "tencentgit",
        }
    }

    /// Public server of the provider.
    #[must_use]
    pub fn default_server(&self) -> &'static str {
        match self {
            Self::TencentGit => DEFAULT_SERVER,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tencentgit" => Ok(Self::TencentGit),
            other => Err(Error::Configuration(format!("unknown driver: {other}"))),
        }
    }
}

/// Everything needed to build a [`crate::Client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Provider driver
    pub driver: ProviderKind,
    /// Server base URL; always ends with `/`
    pub server: Url,
    /// Access token sent as `PRIVATE-TOKEN`
    pub token: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration for `driver` against `server`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `server` is not an absolute URL.
    pub fn new(driver: ProviderKind, server: &str) -> Result<Self> {
        Ok(Self {
            driver,
            server: parse_server(server)?,
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Set the access token. An empty token means anonymous access.
    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = (!token.is_empty()).then(|| token.to_string());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `SCM_DRIVER` - Provider driver (optional, default: tencentgit)
    /// * `SCM_SERVER` - Server base URL (optional, default: the provider's public server)
    /// * `SCM_TOKEN` - Access token (optional)
    /// * `SCM_TIMEOUT_SECS` - Request timeout in seconds (optional, default: 30)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if any variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        let driver = match env::var("SCM_DRIVER") {
            Ok(name) if !name.is_empty() => name.parse()?,
            _ => ProviderKind::default(),
        };
        let server = env::var("SCM_SERVER")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| driver.default_server().to_string());
        let mut config = Self::new(driver, &server)?;

        if let Ok(token) = env::var("SCM_TOKEN") {
            config = config.with_token(&token);
        }
        if let Ok(secs) = env::var("SCM_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Configuration(format!("Invalid SCM_TIMEOUT_SECS: {secs}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

/// Parse a server URL, normalizing it to end with `/`.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if `server` is not an absolute URL.
pub fn parse_server(server: &str) -> Result<Url> {
    let mut url = Url::parse(server.trim())
        .map_err(|e| Error::Configuration(format!("Invalid server URL {server}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("tencentgit".parse::<ProviderKind>().unwrap(), ProviderKind::TencentGit);
        assert_eq!(" TencentGit ".parse::<ProviderKind>().unwrap(), ProviderKind::TencentGit);
        assert!(matches!(
            "gitea".parse::<ProviderKind>(),
            Err(Error::Configuration(_))
        ));
        assert_eq!(ProviderKind::TencentGit.to_string(), "tencentgit");
    }

    #[test]
    fn test_parse_server_appends_slash() {
        assert_eq!(
            parse_server("https://git.example.com/scm").unwrap().as_str(),
            "https://git.example.com/scm/"
        );
        assert_eq!(
            parse_server("https://git.code.tencent.com").unwrap().as_str(),
            "https://git.code.tencent.com/"
        );
        assert!(parse_server("not a url").is_err());
    }

    #[test]
    fn test_config_builders() {
        let config = ClientConfig::new(ProviderKind::TencentGit, DEFAULT_SERVER)
            .unwrap()
            .with_token("")
            .with_timeout(Duration::from_secs(5));
        assert!(config.token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(5));

        let config = config.with_token("9edf3260d727e29d906bdb10c8a099a");
        assert_eq!(config.token.as_deref(), Some("9edf3260d727e29d906bdb10c8a099a"));
    }
}
