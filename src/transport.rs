// HTTP transport shim: one GET per call, no retries
use crate::config::ClientConfig;
use crate::error::{Result, ZillowError};
use crate::url_builder::build_url;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// The seam between the facades and the network. Implementations must map
// their own failures into ZillowError::Transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ZillowError::Config(e.to_string()))?;

        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(RawResponse { status, body })
    }
}

/// Request `url` with `params` appended to its query string.
///
/// Only GET is supported; any other method is rejected before the transport
/// is touched.
pub async fn request_url<T, K, V>(
    transport: &T,
    url: &str,
    method: HttpMethod,
    params: &[(K, Option<V>)],
) -> Result<RawResponse>
where
    T: Transport + ?Sized,
    K: AsRef<str>,
    V: AsRef<str>,
{
    if method != HttpMethod::Get {
        return Err(ZillowError::UnsupportedMethod(method));
    }

    let url = build_url(url, &[], params);
    debug!(url = %redact_key(&url), "issuing GET request");

    let response = transport.get(&url).await?;
    debug!(status = response.status, bytes = response.body.len(), "response received");

    Ok(response)
}

// Keep the API key out of logs
fn redact_key(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(k, v)| {
                    let v = if k == "zws-id" { "***".to_string() } else { v.into_owned() };
                    (k.into_owned(), v)
                })
                .collect();
            if !pairs.is_empty() {
                parsed.query_pairs_mut().clear().extend_pairs(pairs);
            }
            parsed.into()
        }
        Err(_) => url.to_string(),
    }
}
