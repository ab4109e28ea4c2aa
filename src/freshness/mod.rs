//! Freshness directives: building and reading `Cache-Control`.
//!
//! Origins describe how long a representation may be reused with a
//! [`FreshnessPolicy`]; [`build_policy`] turns the policy into the header
//! value, and [`FreshnessPolicy::parse`] reads one back on the cache side.
//!
//! Only `public`, `private`, `max-age` and `must-revalidate` are understood.
//!
//! | Visibility | max-age | `Cache-Control`                        |
//! |------------|---------|----------------------------------------|
//! | public     | `n`     | `max-age=n, public`                    |
//! | private    | `n`     | `private, max-age=n`                   |
//! | public     | none    | `public`                               |
//! | private    | none    | `must-revalidate, private, max-age=0`  |

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::http::StatusCode;

/// Errors raised while building a freshness policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("max-age must be non-negative, got {max_age}")]
    NegativeMaxAge { max_age: i64 },

    #[error("a response cannot be both public and private")]
    ConflictingVisibility,

    #[error("last-modified time cannot be expressed as an HTTP date")]
    LastModifiedOutOfRange,
}

/// Who may reuse a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Any cache, including the shared store, may keep the response.
    Public,
    /// Only the requesting client may keep the response.
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Freshness metadata attached to one response.
///
/// `max_age` of `None` means the response relies purely on validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub visibility: Visibility,
    pub max_age: Option<u64>,
    pub must_revalidate: bool,
}

impl FreshnessPolicy {
    /// Renders the policy as a `Cache-Control` header value.
    ///
    /// A private policy with no max-age always forces revalidation, whatever
    /// `must_revalidate` says.
    pub fn cache_control(&self) -> String {
        let mut value = match (self.visibility, self.max_age) {
            (Visibility::Public, Some(n)) => format!("max-age={n}, public"),
            (Visibility::Private, Some(n)) => format!("private, max-age={n}"),
            (Visibility::Public, None) => "public".to_owned(),
            (Visibility::Private, None) => return "must-revalidate, private, max-age=0".to_owned(),
        };
        if self.must_revalidate {
            value.push_str(", must-revalidate");
        }
        value
    }

    /// Returns the max-age as a [`Duration`].
    pub fn max_age_duration(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }

    /// Returns `true` if the shared store may serve this response to
    /// anyone but the original requester.
    pub fn is_shared(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Reads a `Cache-Control` header value.
    ///
    /// Unknown directives and unparsable `max-age` values are ignored. When
    /// both `public` and `private` appear, `private` wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use rttp_cache::freshness::{FreshnessPolicy, Visibility};
    ///
    /// let policy = FreshnessPolicy::parse("max-age=10, public");
    /// assert_eq!(policy.visibility, Visibility::Public);
    /// assert_eq!(policy.max_age, Some(10));
    /// ```
    pub fn parse(header: &str) -> Self {
        let mut private = false;
        let mut max_age = None;
        let mut must_revalidate = false;

        for part in header.split(',') {
            let part = part.trim();
            if part.eq_ignore_ascii_case("private") {
                private = true;
            } else if part.eq_ignore_ascii_case("must-revalidate") {
                must_revalidate = true;
            } else if let Some((name, value)) = part.split_once('=') {
                if name.trim().eq_ignore_ascii_case("max-age") {
                    max_age = value.trim().trim_matches('"').parse::<u64>().ok();
                }
            }
        }

        Self {
            visibility: if private {
                Visibility::Private
            } else {
                Visibility::Public
            },
            max_age,
            must_revalidate,
        }
    }

    /// Reads an optional header; a missing `Cache-Control` is a public,
    /// validator-only policy.
    pub fn from_header(header: Option<&str>) -> Self {
        header.map(Self::parse).unwrap_or(Self {
            visibility: Visibility::Public,
            max_age: None,
            must_revalidate: false,
        })
    }
}

/// Computes a policy and its `Cache-Control` value.
///
/// # Errors
///
/// [`PolicyError::NegativeMaxAge`] when `max_age` is below zero.
///
/// # Examples
///
/// ```
/// use rttp_cache::freshness::{build_policy, Visibility};
///
/// let (_, header) = build_policy(Visibility::Public, Some(10), false).unwrap();
/// assert_eq!(header, "max-age=10, public");
///
/// let (policy, header) = build_policy(Visibility::Private, None, false).unwrap();
/// assert_eq!(header, "must-revalidate, private, max-age=0");
/// assert!(policy.must_revalidate);
/// ```
pub fn build_policy(
    visibility: Visibility,
    max_age: Option<i64>,
    must_revalidate: bool,
) -> Result<(FreshnessPolicy, String), PolicyError> {
    let max_age = match max_age {
        Some(n) if n < 0 => return Err(PolicyError::NegativeMaxAge { max_age: n }),
        Some(n) => Some(n.unsigned_abs()),
        None => None,
    };
    let must_revalidate =
        must_revalidate || (visibility == Visibility::Private && max_age.is_none());
    let policy = FreshnessPolicy {
        visibility,
        max_age,
        must_revalidate,
    };
    let header = policy.cache_control();
    Ok((policy, header))
}

/// Decides whether the shared store may keep a response.
///
/// The status must be cacheable, the policy public, and the response must
/// either carry a positive max-age or be revalidatable.
pub fn is_cacheable(status: StatusCode, policy: &FreshnessPolicy, has_validators: bool) -> bool {
    if !status.is_cacheable() || !policy.is_shared() {
        return false;
    }
    has_validators || policy.max_age.is_some_and(|n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_forms() {
        let cases = [
            (Visibility::Public, Some(10), "max-age=10, public"),
            (Visibility::Private, Some(10), "private, max-age=10"),
            (Visibility::Public, None, "public"),
            (Visibility::Private, None, "must-revalidate, private, max-age=0"),
        ];
        for (visibility, max_age, expected) in cases {
            let (_, header) = build_policy(visibility, max_age, false).unwrap();
            assert_eq!(header, expected);
        }
    }

    #[test]
    fn must_revalidate_override_is_appended() {
        let (_, header) = build_policy(Visibility::Public, Some(60), true).unwrap();
        assert_eq!(header, "max-age=60, public, must-revalidate");
        let (_, header) = build_policy(Visibility::Private, None, true).unwrap();
        assert_eq!(header, "must-revalidate, private, max-age=0");
    }

    #[test]
    fn negative_max_age_is_rejected() {
        assert_eq!(
            build_policy(Visibility::Public, Some(-1), false),
            Err(PolicyError::NegativeMaxAge { max_age: -1 })
        );
    }

    #[test]
    fn zero_max_age_is_allowed() {
        let (policy, header) = build_policy(Visibility::Public, Some(0), false).unwrap();
        assert_eq!(policy.max_age, Some(0));
        assert_eq!(header, "max-age=0, public");
    }

    #[test]
    fn parse_private_revalidate_form() {
        let policy = FreshnessPolicy::parse("must-revalidate, private, max-age=0");
        assert_eq!(policy.visibility, Visibility::Private);
        assert_eq!(policy.max_age, Some(0));
        assert!(policy.must_revalidate);
    }

    #[test]
    fn parse_ignores_unknown_and_garbage() {
        let policy = FreshnessPolicy::parse("no-transform, max-age=soon, immutable");
        assert_eq!(policy.visibility, Visibility::Public);
        assert_eq!(policy.max_age, None);
        assert!(!policy.must_revalidate);
    }

    #[test]
    fn private_wins_over_public() {
        let policy = FreshnessPolicy::parse("public, private");
        assert_eq!(policy.visibility, Visibility::Private);
    }

    #[test]
    fn missing_header_is_public_validator_only() {
        let policy = FreshnessPolicy::from_header(None);
        assert!(policy.is_shared());
        assert_eq!(policy.max_age, None);
    }

    #[test]
    fn cacheability() {
        let public_ttl = FreshnessPolicy::parse("max-age=10, public");
        let public_bare = FreshnessPolicy::parse("public");
        let private_ttl = FreshnessPolicy::parse("private, max-age=10");

        assert!(is_cacheable(StatusCode::Ok, &public_ttl, false));
        assert!(is_cacheable(StatusCode::Ok, &public_bare, true));
        assert!(!is_cacheable(StatusCode::Ok, &public_bare, false));
        assert!(!is_cacheable(StatusCode::Ok, &private_ttl, true));
        assert!(!is_cacheable(StatusCode::InternalServerError, &public_ttl, true));
    }
}
