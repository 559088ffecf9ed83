//! Collaborators the connector service depends on but does not implement.
//!
//! The connector store and the image fetcher live outside this crate. They
//! are reached through [`KeyRegistry`] and [`IconResolver`], shared as
//! `Arc<dyn Trait>` so one instance can serve concurrent requests.

use crate::error::{CdsError, CdsResult};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::debug;
use url::Url;

/// Prefix of an inline icon.
pub const DATA_URI_PREFIX: &str = "data:";

/// Answers whether a connector key is already taken.
#[async_trait]
pub trait KeyRegistry: Send + Sync {
    /// Returns `true` if a connector with `key` exists.
    async fn key_exists(&self, key: &str) -> Result<bool>;
}

/// A [`KeyRegistry`] backed by an in-memory set.
///
/// Used by the CLI, which has no connector store, and by tests.
#[derive(Debug, Default)]
pub struct InMemoryKeyRegistry {
    keys: RwLock<HashSet<String>>,
}

impl InMemoryKeyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding `keys`.
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: RwLock::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// Records `key` as taken. Returns `false` if it already was.
    pub fn insert(&self, key: impl Into<String>) -> bool {
        match self.keys.write() {
            Ok(mut keys) => keys.insert(key.into()),
            Err(poisoned) => poisoned.into_inner().insert(key.into()),
        }
    }
}

#[async_trait]
impl KeyRegistry for InMemoryKeyRegistry {
    async fn key_exists(&self, key: &str) -> Result<bool> {
        let keys = self
            .keys
            .read()
            .map_err(|_| anyhow::anyhow!("key registry lock poisoned"))?;
        Ok(keys.contains(key))
    }
}

/// Converts a remote image into a `data:` URI.
#[async_trait]
pub trait IconResolver: Send + Sync {
    /// Fetches the image at `url` and returns it as a data URI.
    async fn to_data_uri(&self, url: &Url) -> Result<String>;
}

/// An [`IconResolver`] that refuses every URL.
///
/// For callers that only accept inline icons.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineOnlyIconResolver;

#[async_trait]
impl IconResolver for InlineOnlyIconResolver {
    async fn to_data_uri(&self, url: &Url) -> Result<String> {
        anyhow::bail!("remote icons are not supported, pass a data: URI instead of {url}")
    }
}

/// Resolves the icon of a compile request.
///
/// `data:` URIs and strings that are not `http(s)` URLs are returned
/// verbatim; `http(s)` URLs go through `resolver`.
///
/// # Errors
///
/// Returns [`CdsError::IconResolution`] if the resolver fails.
pub async fn resolve_icon(
    icon: Option<&str>,
    resolver: &dyn IconResolver,
) -> CdsResult<Option<String>> {
    let Some(icon) = icon else {
        return Ok(None);
    };
    if icon.starts_with(DATA_URI_PREFIX) {
        return Ok(Some(icon.to_string()));
    }
    match Url::parse(icon) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            debug!(%url, "resolving icon");
            let data_uri = resolver
                .to_data_uri(&url)
                .await
                .map_err(|e| CdsError::icon(format!("{url}: {e:#}")))?;
            Ok(Some(data_uri))
        }
        _ => Ok(Some(icon.to_string())),
    }
}
