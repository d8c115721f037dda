use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_TUTOR_AGENT_ID: &str = "699a8dc8e6195f9129d6b906";
pub const DEFAULT_KNOWLEDGE_AGENT_ID: &str = "699a8dc9c2eec05acd279dc7";
pub const DEFAULT_RAG_ID: &str = "699a8da43dc9e9e5282826a2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// Where the agent service lives and how to authenticate with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentEndpoint {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl AgentEndpoint {
    /// Build an endpoint, validating the base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBaseUrl` if `base_url` does not parse.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim();
        Url::parse(trimmed).map_err(|_| ConfigError::InvalidBaseUrl(trimmed.to_owned()))?;
        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_owned(),
            api_key: api_key
                .map(|key| key.trim().to_owned())
                .filter(|key| !key.is_empty()),
        })
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Agent identifiers and transport settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentConfig {
    /// `None` leaves the agents disabled.
    pub endpoint: Option<AgentEndpoint>,
    pub tutor_agent_id: String,
    pub knowledge_agent_id: String,
    pub rag_id: String,
    pub timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            tutor_agent_id: DEFAULT_TUTOR_AGENT_ID.into(),
            knowledge_agent_id: DEFAULT_KNOWLEDGE_AGENT_ID.into(),
            rag_id: DEFAULT_RAG_ID.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AgentConfig {
    /// Read configuration from `PM_TUTOR_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL or timeout is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let endpoint = non_empty("PM_TUTOR_AGENT_BASE_URL")
            .map(|base| AgentEndpoint::new(&base, non_empty("PM_TUTOR_API_KEY")))
            .transpose()?;

        let timeout = match non_empty("PM_TUTOR_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| ConfigError::InvalidTimeout(raw.clone()))?;
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        Ok(Self {
            endpoint,
            tutor_agent_id: non_empty("PM_TUTOR_TUTOR_AGENT_ID").unwrap_or(defaults.tutor_agent_id),
            knowledge_agent_id: non_empty("PM_TUTOR_KB_AGENT_ID")
                .unwrap_or(defaults.knowledge_agent_id),
            rag_id: non_empty("PM_TUTOR_RAG_ID").unwrap_or(defaults.rag_id),
            timeout,
        })
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_base_url_disables_agents() {
        let config = AgentConfig::from_lookup(lookup(&[])).unwrap();
        assert!(!config.enabled());
        assert_eq!(config.tutor_agent_id, DEFAULT_TUTOR_AGENT_ID);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn reads_endpoint_ids_and_timeout() {
        let config = AgentConfig::from_lookup(lookup(&[
            ("PM_TUTOR_AGENT_BASE_URL", "https://agents.example.com/v1/"),
            ("PM_TUTOR_API_KEY", " secret "),
            ("PM_TUTOR_KB_AGENT_ID", "kb-1"),
            ("PM_TUTOR_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();

        let endpoint = config.endpoint.unwrap();
        assert_eq!(endpoint.base_url, "https://agents.example.com/v1");
        assert_eq!(endpoint.api_key.as_deref(), Some("secret"));
        assert_eq!(endpoint.url("/agent/chat"), "https://agents.example.com/v1/agent/chat");
        assert_eq!(config.knowledge_agent_id, "kb-1");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn rejects_invalid_values() {
        let err = AgentConfig::from_lookup(lookup(&[("PM_TUTOR_AGENT_BASE_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));

        let err = AgentConfig::from_lookup(lookup(&[("PM_TUTOR_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
    }
}
