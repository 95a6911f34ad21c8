//! Document transport.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ResolutionError;

/// Fetch a JSON document by URL.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, ResolutionError>;
}

/// In-memory documents keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    documents: HashMap<String, Value>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: &str, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    pub fn insert(&mut self, url: &str, document: Value) {
        self.documents.insert(url.to_string(), document);
    }
}

#[async_trait]
impl DocumentLoader for StaticLoader {
    async fn fetch(&self, url: &str) -> Result<Value, ResolutionError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound(url.to_string()))
    }
}

#[cfg(feature = "http")]
pub use http::HttpLoader;

#[cfg(feature = "http")]
mod http {
    use super::*;

    pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
    const ACCEPT: &str = "application/did+ld+json, application/ld+json, application/json";

    /// Loader over HTTP(S).
    #[derive(Debug, Clone)]
    pub struct HttpLoader {
        client: reqwest::Client,
    }

    impl HttpLoader {
        pub fn new() -> Result<Self, ResolutionError> {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                reqwest::header::USER_AGENT,
                reqwest::header::HeaderValue::from_static(USER_AGENT),
            );
            headers.insert(
                reqwest::header::ACCEPT,
                reqwest::header::HeaderValue::from_static(ACCEPT),
            );
            let client = reqwest::Client::builder()
                .default_headers(headers)
                .build()
                .map_err(|err| ResolutionError::Transport {
                    url: String::new(),
                    message: format!("unable to build HTTP client: {err}"),
                })?;
            Ok(Self { client })
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl DocumentLoader for HttpLoader {
        async fn fetch(&self, url: &str) -> Result<Value, ResolutionError> {
            let transport = |err: reqwest::Error| ResolutionError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            };
            let resp = self.client.get(url).send().await.map_err(transport)?;
            let status = resp.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ResolutionError::NotFound(url.to_string()));
            }
            if !status.is_success() {
                return Err(ResolutionError::Http {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            let body = resp.bytes().await.map_err(transport)?;
            serde_json::from_slice(&body).map_err(|source| ResolutionError::Malformed {
                url: url.to_string(),
                source,
            })
        }
    }
}
