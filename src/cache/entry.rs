//! Stored responses.

use std::time::{Duration, SystemTime};

use bytes::Bytes;

use super::CacheKey;
use crate::freshness::FreshnessPolicy;
use crate::http::{Headers, Response, StatusCode, names};
use crate::validation::Validators;

/// Headers that describe one hop or one transaction and never enter the store.
const UNSTORED_HEADERS: [&str; 3] = [names::CONNECTION, names::CONTENT_LENGTH, names::AGE];

/// An immutable snapshot of an origin response.
///
/// Revalidation never mutates an entry; it builds a replacement with
/// [`CachedEntry::refreshed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub key: CacheKey,
    pub status: StatusCode,
    pub headers: Headers,
    pub body: Bytes,
    pub validators: Validators,
    pub policy: FreshnessPolicy,
    pub stored_at: SystemTime,
}

impl CachedEntry {
    /// Captures `response` under `key`. Validators and policy are read from
    /// the response's own headers; `diagnostic_header` is stripped.
    pub fn capture(
        key: CacheKey,
        response: &Response,
        diagnostic_header: &str,
        now: SystemTime,
    ) -> Self {
        let mut headers = response.headers().clone();
        for name in UNSTORED_HEADERS {
            headers.remove(name);
        }
        headers.remove(diagnostic_header);
        Self::from_parts(key, response.status(), headers, response.payload().clone(), now)
    }

    fn from_parts(
        key: CacheKey,
        status: StatusCode,
        headers: Headers,
        body: Bytes,
        stored_at: SystemTime,
    ) -> Self {
        let validators = Validators::from_headers(&headers);
        let policy = FreshnessPolicy::from_header(headers.get(names::CACHE_CONTROL));
        Self {
            key,
            status,
            headers,
            body,
            validators,
            policy,
            stored_at,
        }
    }

    /// Builds the replacement entry after the origin answered 304.
    ///
    /// The 304's headers override this entry's, except the body-describing
    /// ones; validators and policy are recomputed from the merged set.
    pub fn refreshed(
        &self,
        not_modified: &Response,
        diagnostic_header: &str,
        now: SystemTime,
    ) -> Self {
        let mut headers = self.headers.clone();
        let mut skip: Vec<&str> = vec![names::CONTENT_TYPE];
        skip.extend(UNSTORED_HEADERS);
        skip.push(diagnostic_header);
        headers.merge_from(not_modified.headers(), &skip);
        Self::from_parts(self.key.clone(), self.status, headers, self.body.clone(), now)
    }

    /// Time since the entry was stored. An entry stamped in the future has age zero.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.stored_at).unwrap_or(Duration::ZERO)
    }

    /// Returns `true` if the entry may be served without contacting the origin.
    ///
    /// Only public entries with a max-age qualify, and only while younger
    /// than it. Clock skew that puts `stored_at` ahead of `now` counts as fresh.
    pub fn is_fresh(&self, now: SystemTime) -> bool {
        if !self.policy.is_shared() {
            return false;
        }
        let Some(max_age) = self.policy.max_age_duration() else {
            return false;
        };
        match now.duration_since(self.stored_at) {
            Ok(age) => age < max_age,
            Err(_) => true,
        }
    }

    /// Rebuilds a response carrying the stored status, headers, and body.
    pub fn to_response(&self) -> Response {
        Response::from_parts(self.status, self.headers.clone(), self.body.clone())
    }
}
