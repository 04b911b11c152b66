//! Per-call out-of-band headers.

use tonic::Request;
use tonic::metadata::{Ascii, KeyAndValueRef, MetadataKey, MetadataMap, MetadataValue};
use uuid::Uuid;

use crate::driver::error::CallError;
use crate::token_cache::TokenCache;
use crate::token_cache::error::AuthError;

pub const AUTHORIZATION: &str = "Authorization";
pub const REQUEST_ID: &str = "x-request-id";

/// Whether a call must carry the cached bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Authenticated,
    Anonymous,
}

/// An ordered list of header pairs. Duplicate keys are kept as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMetadata {
    entries: Vec<(String, String)>,
}

impl CallMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every value stored under `key`, compared case-insensitively as transports do.
    pub fn get_all<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> {
        self.iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).next()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Collect every entry of a received header or trailer map.
    ///
    /// Binary (`-bin`) values are reported in their base64 wire form.
    pub fn from_metadata_map(map: &MetadataMap) -> Self {
        map.iter()
            .map(|entry| match entry {
                KeyAndValueRef::Ascii(key, value) => (
                    key.as_str().to_string(),
                    String::from_utf8_lossy(value.as_encoded_bytes()).into_owned(),
                ),
                KeyAndValueRef::Binary(key, value) => (
                    key.as_str().to_string(),
                    String::from_utf8_lossy(value.as_encoded_bytes()).into_owned(),
                ),
            })
            .collect()
    }

    /// Convert into a transport metadata map, appending so that duplicates survive.
    pub fn into_metadata_map(self) -> Result<MetadataMap, CallError> {
        let mut map = MetadataMap::with_capacity(self.entries.len());
        for (key, value) in self.entries {
            let parsed_key = MetadataKey::<Ascii>::from_bytes(key.as_bytes())
                .map_err(|_| CallError::InvalidMetadata { key: key.clone() })?;
            let parsed_value = MetadataValue::<Ascii>::try_from(value.as_str())
                .map_err(|_| CallError::InvalidMetadata { key: key.clone() })?;
            map.append(parsed_key, parsed_value);
        }
        Ok(map)
    }

    /// Wrap `message` in a request carrying these headers.
    pub fn into_request<T>(self, message: T) -> Result<Request<T>, CallError> {
        let mut request = Request::new(message);
        *request.metadata_mut() = self.into_metadata_map()?;
        Ok(request)
    }
}

impl<K, V> FromIterator<(K, V)> for CallMetadata
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for CallMetadata {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Assembles the header set for each call from the [`TokenCache`] and caller fields.
#[derive(Debug, Clone, Copy)]
pub struct MetadataBuilder<'a> {
    tokens: &'a TokenCache,
}

impl<'a> MetadataBuilder<'a> {
    pub fn new(tokens: &'a TokenCache) -> Self {
        Self { tokens }
    }

    /// Build the headers for one call.
    ///
    /// Authenticated calls start with `Authorization: Bearer <token>`. Caller fields follow in
    /// the order given, then an `x-request-id` unless the caller supplied one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoCredential`] for an authenticated call when the cache holds no
    /// usable credential.
    pub fn build(&self, kind: CallKind, extra: &CallMetadata) -> Result<CallMetadata, AuthError> {
        let mut metadata = CallMetadata::new();

        if kind == CallKind::Authenticated {
            let credential = self.tokens.current().ok_or(AuthError::NoCredential)?;
            metadata.push(AUTHORIZATION, credential.bearer());
        }

        for (key, value) in extra.iter() {
            metadata.push(key, value);
        }

        if !metadata.contains_key(REQUEST_ID) {
            metadata.push(REQUEST_ID, Uuid::new_v4().to_string());
        }

        Ok(metadata)
    }
}
