//! Validators and the comparison of a stored representation against an
//! incoming conditional request.
//!
//! An entity tag always takes precedence: when the client supplies
//! `If-None-Match`, `If-Modified-Since` is not consulted at all.

use std::time::SystemTime;

use sha2::{Digest, Sha256};

use crate::http::{Headers, date, names};

/// The single validator an origin handler chooses for a representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorKind {
    /// An application-supplied key, turned into a quoted entity tag.
    ETag(String),
    /// A modification time, sent as `Last-Modified`.
    LastModified(SystemTime),
    /// The representation cannot be revalidated.
    None,
}

impl ValidatorKind {
    /// Resolves the variant into header-ready [`Validators`].
    pub fn to_validators(&self) -> Validators {
        match self {
            Self::ETag(key) => Validators {
                etag: Some(entity_tag(key)),
                last_modified: None,
            },
            Self::LastModified(time) => Validators {
                etag: None,
                last_modified: Some(date::truncate_to_seconds(*time)),
            },
            Self::None => Validators::default(),
        }
    }
}

/// Derives the strong entity tag for an application key: the quoted
/// SHA-256 hex digest of the key.
///
/// # Examples
///
/// ```
/// use rttp_cache::validation::entity_tag;
///
/// let tag = entity_tag("1");
/// assert!(tag.starts_with('"') && tag.ends_with('"'));
/// assert_eq!(tag, entity_tag("1"));
/// assert_ne!(tag, entity_tag("2"));
/// ```
pub fn entity_tag(key: &str) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(key.as_bytes())))
}

/// Validators carried by a response or a stored entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    /// The `ETag` header value, quotes included.
    pub etag: Option<String>,
    /// The `Last-Modified` time, second precision.
    pub last_modified: Option<SystemTime>,
}

impl Validators {
    /// Reads `ETag` and `Last-Modified` from response headers.
    pub fn from_headers(headers: &Headers) -> Self {
        Self {
            etag: headers
                .get(names::ETAG)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned),
            last_modified: headers.get(names::LAST_MODIFIED).and_then(date::parse),
        }
    }

    /// Writes the validators onto response headers, replacing older values.
    pub fn apply(&self, headers: &mut Headers) {
        if let Some(etag) = &self.etag {
            headers.set(names::ETAG, etag.as_str());
        }
        if let Some(value) = self.last_modified.and_then(date::format) {
            headers.set(names::LAST_MODIFIED, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// The conditional part of an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalRequest {
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<SystemTime>,
}

impl ConditionalRequest {
    /// Reads `If-None-Match` and `If-Modified-Since`.
    ///
    /// A malformed `If-Modified-Since` is treated as absent.
    pub fn from_headers(headers: &Headers) -> Self {
        Self {
            if_none_match: headers
                .get(names::IF_NONE_MATCH)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned),
            if_modified_since: headers.get(names::IF_MODIFIED_SINCE).and_then(date::parse),
        }
    }

    /// Builds the conditional headers a cache sends when revalidating `stored`.
    ///
    /// Each validator the entry carries replaces the client's matching
    /// header; fields the entry lacks keep the client's value.
    pub fn revalidating(&self, stored: &Validators) -> Self {
        Self {
            if_none_match: stored.etag.clone().or_else(|| self.if_none_match.clone()),
            if_modified_since: stored.last_modified.or(self.if_modified_since),
        }
    }

    /// Rewrites a request's conditional headers to match `self`.
    pub fn apply(&self, headers: &mut Headers) {
        headers.remove(names::IF_NONE_MATCH);
        headers.remove(names::IF_MODIFIED_SINCE);
        if let Some(tag) = &self.if_none_match {
            headers.insert(names::IF_NONE_MATCH, tag.as_str());
        }
        if let Some(value) = self.if_modified_since.and_then(date::format) {
            headers.insert(names::IF_MODIFIED_SINCE, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.if_none_match.is_none() && self.if_modified_since.is_none()
    }
}

/// Returns `true` if `incoming` confirms the representation described by
/// `stored` is unchanged.
///
/// - With `If-None-Match`, the result is exact equality with the stored
///   entity tag, and `If-Modified-Since` is ignored.
/// - Otherwise, with `If-Modified-Since`, the stored `Last-Modified` must be
///   no later than it, both truncated to whole seconds.
/// - With neither header nothing can be confirmed.
pub fn matches(stored: &Validators, incoming: &ConditionalRequest) -> bool {
    if let Some(tag) = &incoming.if_none_match {
        return stored.etag.as_deref() == Some(tag.as_str());
    }
    match (stored.last_modified, incoming.if_modified_since) {
        (Some(modified), Some(since)) => {
            date::truncate_to_seconds(modified) <= date::truncate_to_seconds(since)
        }
        _ => false,
    }
}
