use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Session cookie and lifetime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Only send the cookie over HTTPS.
    #[serde(default = "default_true")]
    pub secure: bool,

    /// Session lifetime in seconds, refreshed on every save.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure: true,
            ttl_secs: default_ttl(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cookie_name.is_empty() {
            return Err(ConfigError::Validation(
                "session.cookie_name cannot be empty".into(),
            ));
        }
        if self.ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "session.ttl_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn default_cookie_name() -> String {
    "gk_session".to_string()
}

fn default_ttl() -> u64 {
    86400 // 24 hours
}

fn default_true() -> bool {
    true
}
