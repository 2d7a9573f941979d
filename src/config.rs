// Client configuration shared by both facades
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.zillow.com/webservice";

pub const DEFAULT_USER_AGENT: &str = concat!("zillow-client-rs/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    // None leaves reqwest's own behaviour in place (no timeout)
    pub timeout_ms: Option<u64>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// `<base_url>/<endpoint>.htm`, tolerating a trailing slash on the base.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}.htm", self.base_url.trim_end_matches('/'), endpoint)
    }
}
