use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde_json::Value;

/// Anything that can turn a URL into a JSON document.
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header(USER_AGENT, "Mozilla/5.0")
            .header(ACCEPT, "application/json, text/plain, */*")
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JsonSource for HttpSource {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.request(url).send().await.map_err(network)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(network)?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Routes every request through an optional URL-prefix proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyRewrite {
    base: Option<String>,
}

impl ProxyRewrite {
    pub fn new(base: Option<String>) -> Self {
        Self {
            base: base.filter(|b| !b.trim().is_empty()),
        }
    }

    pub fn direct() -> Self {
        Self { base: None }
    }

    pub fn apply(&self, target: &str) -> String {
        match &self.base {
            Some(base) => format!("{}{}", base, urlencoding::encode(target)),
            None => target.to_string(),
        }
    }

    /// Rewrite a `next` cursor; absent and empty cursors both mean "no more pages".
    pub fn apply_cursor(&self, cursor: Option<&str>) -> Option<String> {
        cursor
            .filter(|c| !c.is_empty())
            .map(|c| self.apply(c))
    }
}
