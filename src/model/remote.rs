//! Store-side identifiers: store URLs and store-issued ids

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Identifier issued by a store
///
/// Only meaningful relative to the store URL that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(i64);

impl RemoteId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A store URL that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid store url: {0}")]
pub struct InvalidStoreUrl(pub String);

/// Base URL of a store
///
/// Always http or https, always has a host, always ends with `/` so that
/// resource paths can be appended directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreUrl(String);

impl StoreUrl {
    /// Validate and normalise a user-supplied store URL
    pub fn parse(raw: &str) -> Result<Self, InvalidStoreUrl> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|_| InvalidStoreUrl(trimmed.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(InvalidStoreUrl(trimmed.to_string()));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(InvalidStoreUrl(trimmed.to_string()));
        }

        let mut normalised = url.to_string();
        if !normalised.ends_with('/') {
            normalised.push('/');
        }
        Ok(Self(normalised))
    }

    /// Wrap a literal already in normalised form
    pub(crate) fn from_normalised(url: &str) -> Self {
        Self(url.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for StoreUrl {
    type Error = InvalidStoreUrl;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoreUrl> for String {
    fn from(url: StoreUrl) -> Self {
        url.0
    }
}
