//! Relay server configuration parsed from environment variables.

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_CHECK_PATH: &str = "/api/v1/auth/me";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Base URL of the backend service, without a trailing slash.
    pub backend_url: String,
    pub port: u16,
    /// Backend path that resolves a credential to the current user.
    pub session_check_path: String,
}

impl RelayConfig {
    /// Build typed config from the process environment.
    ///
    /// Optional:
    /// - `BACKEND_URL`: default `http://localhost:8000`
    /// - `PORT`: default 3000
    /// - `SESSION_CHECK_PATH`: default `/api/v1/auth/me`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = non_empty(lookup("BACKEND_URL"))
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            return Err(ConfigError::Invalid { key: "BACKEND_URL", value: backend_url });
        }

        let port = match non_empty(lookup("PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let session_check_path =
            non_empty(lookup("SESSION_CHECK_PATH")).unwrap_or_else(|| DEFAULT_SESSION_CHECK_PATH.to_owned());
        if !session_check_path.starts_with('/') {
            return Err(ConfigError::Invalid { key: "SESSION_CHECK_PATH", value: session_check_path });
        }

        Ok(Self { backend_url, port, session_check_path })
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
