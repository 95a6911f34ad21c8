//! Identifier to document resolution.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::error::ResolutionError;
use crate::loader::DocumentLoader;

pub const DID_WEB_PREFIX: &str = "did:web:";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How an identifier is turned into a fetchable location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMethod {
    /// [did:web](https://w3c-ccg.github.io/did-method-web/)
    DidWeb,
    /// `http:` and `https:` URLs, fetched as given.
    Url,
}

impl ResolutionMethod {
    pub fn for_uri(uri: &str) -> Result<Self, ResolutionError> {
        if uri.starts_with(DID_WEB_PREFIX) {
            return Ok(Self::DidWeb);
        }
        if uri.starts_with("https:") || uri.starts_with("http:") {
            return Ok(Self::Url);
        }
        let scheme = match uri.split_once(':') {
            Some(("did", rest)) => match rest.split_once(':') {
                Some((method, _)) => format!("did:{method}"),
                None => "did".to_string(),
            },
            Some((scheme, _)) => scheme.to_string(),
            None => uri.to_string(),
        };
        Err(ResolutionError::UnsupportedScheme(scheme))
    }

    /// URL to fetch for `uri`.
    pub fn location(&self, uri: &str) -> Result<String, ResolutionError> {
        match self {
            Self::DidWeb => did_web_url(uri),
            Self::Url => Ok(uri.to_string()),
        }
    }
}

/// <https://w3c-ccg.github.io/did-method-web/#read-resolve>
pub fn did_web_url(did: &str) -> Result<String, ResolutionError> {
    let rest = did
        .strip_prefix(DID_WEB_PREFIX)
        .ok_or_else(|| ResolutionError::InvalidDid(did.to_string()))?;
    let mut parts = rest.split(':');
    let authority = match parts.next() {
        Some(authority) if !authority.is_empty() => authority.replacen("%3A", ":", 1),
        _ => return Err(ResolutionError::InvalidDid(did.to_string())),
    };
    let mut url = format!("https://{authority}");
    for segment in parts {
        if segment.is_empty() {
            return Err(ResolutionError::InvalidDid(did.to_string()));
        }
        url.push('/');
        url.push_str(segment);
    }
    url.push_str("/did.json");
    Ok(url)
}

/// Resolves DIDs and URLs to JSON documents through an injected loader.
#[derive(Clone)]
pub struct DocumentResolver {
    loader: Arc<dyn DocumentLoader>,
    timeout: Duration,
}

impl DocumentResolver {
    pub fn new(loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            loader,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn resolve(&self, uri: &str) -> Result<Value, ResolutionError> {
        let url = ResolutionMethod::for_uri(uri)?.location(uri)?;
        debug!("resolving {} at {}", uri, url);
        match tokio::time::timeout(self.timeout, self.loader.fetch(&url)).await {
            Ok(result) => result,
            Err(_) => Err(ResolutionError::Timeout {
                url,
                timeout: self.timeout,
            }),
        }
    }
}

impl fmt::Debug for DocumentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
