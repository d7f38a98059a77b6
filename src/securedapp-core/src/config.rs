//! Configuration for the security layer.

use std::time::Duration;

use securedapp_keyring::SignerPolicy;

use crate::error::GuardError;

/// Environment variable overriding [`GuardConfig::base_url`].
pub const ENV_BASE_URL: &str = "SECUREDAPP_BASE_URL";
/// Environment variable overriding [`GuardConfig::timeout`], in seconds.
pub const ENV_TIMEOUT_SECS: &str = "SECUREDAPP_TIMEOUT_SECS";
/// Environment variable overriding [`GuardConfig::signer_policy`].
pub const ENV_SIGNER_POLICY: &str = "SECUREDAPP_SIGNER_POLICY";

/// Configuration for SecuredApp.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Backend base URL, with trailing slash.
    pub base_url: String,
    /// Path of the sensitive data endpoint, relative to `base_url`.
    pub sensitive_data_path: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// How to derive the app identity when several signers are present.
    pub signer_policy: SignerPolicy,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            base_url: "https://securedappbackend.onrender.com/".into(),
            sensitive_data_path: "api/v1/sensitive-data".into(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("securedapp/", env!("CARGO_PKG_VERSION")).into(),
            signer_policy: SignerPolicy::default(),
        }
    }
}

impl GuardConfig {
    /// Defaults overridden by `SECUREDAPP_*` environment variables.
    pub fn from_env() -> Result<Self, GuardError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GuardError> {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = timeout.trim().parse().map_err(|_| {
                GuardError::config(format!("{} must be whole seconds, got '{}'", ENV_TIMEOUT_SECS, timeout))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(policy) = lookup(ENV_SIGNER_POLICY) {
            config.signer_policy = policy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), GuardError> {
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(GuardError::config(format!(
                "base URL must be http(s), got '{}'",
                self.base_url
            )));
        }
        if !self.base_url.ends_with('/') {
            return Err(GuardError::config("base URL must end with '/'"));
        }
        if self.sensitive_data_path.starts_with('/') {
            return Err(GuardError::config("endpoint path must be relative"));
        }
        if self.timeout.is_zero() {
            return Err(GuardError::config("timeout must be non-zero"));
        }
        Ok(())
    }

    /// Absolute URL of the sensitive data endpoint.
    pub fn sensitive_data_url(&self) -> String {
        format!("{}{}", self.base_url, self.sensitive_data_path)
    }
}
