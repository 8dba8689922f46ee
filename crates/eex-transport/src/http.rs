//! HTTP client for the EEX transparency event endpoint.
//!
//! ## Usage
//!
//! ```ignore
//! let client = EexClient::new(EexClientConfig {
//!     base_url: "https://api.eex-group.com".into(),
//!     event_path: "/pub/transparency/events".into(),
//!     username: "user".into(),
//!     password: "secret".into(),
//!     ..Default::default()
//! });
//! let envelope = client.query_events(&query)?;
//! ```

use anyhow::anyhow;
use base64::Engine;
use std::time::Duration;
use tracing::debug;

use crate::source::{EventQuery, EventSource, ResultList, SourceError};

/// Connection settings for [`EexClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EexClientConfig {
    pub base_url: String,
    pub event_path: String,
    pub username: String,
    pub password: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for EexClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            event_path: String::new(),
            username: String::new(),
            password: String::new(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
        }
    }
}

/// Blocking client issuing one GET per [`EventQuery`].
#[derive(Clone)]
pub struct EexClient {
    endpoint: String,
    authorization: Option<String>,
    agent: ureq::Agent,
}

impl EexClient {
    pub fn new(config: EexClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.read_timeout)
            .build();
        Self {
            endpoint: join_url(&config.base_url, &config.event_path),
            authorization: basic_auth_header(&config.username, &config.password),
            agent,
        }
    }

    /// Full URL of the event endpoint, without query parameters.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EventSource for EexClient {
    fn query_events(&self, query: &EventQuery) -> Result<ResultList, SourceError> {
        let params = query.params();
        debug!(
            "URL: {}?{}",
            self.endpoint,
            params
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("&")
        );

        let mut request = self.agent.get(&self.endpoint);
        for (name, value) in &params {
            request = request.query(name, value);
        }
        if let Some(auth) = &self.authorization {
            request = request.set("Authorization", auth);
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(503, response)) => {
                return Err(SourceError::Unavailable(format!(
                    "503 {}",
                    response.status_text()
                )));
            }
            Err(ureq::Error::Status(code, response)) => {
                return Err(SourceError::Other(anyhow!(
                    "Event request rejected `{} {}`",
                    code,
                    response.status_text()
                )));
            }
            Err(e) => return Err(SourceError::Other(anyhow!("Event request failed: {}", e))),
        };

        response
            .into_json::<ResultList>()
            .map_err(|e| SourceError::Other(anyhow!("Failed to parse event response: {}", e)))
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

fn basic_auth_header(username: &str, password: &str) -> Option<String> {
    if username.is_empty() && password.is_empty() {
        return None;
    }
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    Some(format!("Basic {}", token))
}
