//! Request fingerprints used as store keys.

use std::fmt;

use crate::http::Request;

/// Identifies one cacheable variant of a resource.
///
/// Rendered as `METHOD path[?query][|name=value...]`: trailing slashes are
/// stripped from the path (except the root), query pairs are sorted, and the
/// configured vary headers follow in configured order with lower-cased names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key for `request`, varying on `vary_headers`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rttp_cache::cache::CacheKey;
    /// use rttp_cache::http::{Method, Request};
    ///
    /// let vary: [&str; 0] = [];
    /// let a = Request::new(Method::Get, "/items/?b=2&a=1");
    /// let b = Request::new(Method::Get, "/items?a=1&b=2");
    /// assert_eq!(CacheKey::for_request(&a, &vary), CacheKey::for_request(&b, &vary));
    /// assert_eq!(CacheKey::for_request(&a, &vary).as_str(), "GET /items?a=1&b=2");
    /// ```
    pub fn for_request<S: AsRef<str>>(request: &Request, vary_headers: &[S]) -> Self {
        let mut key = String::with_capacity(64);
        key.push_str(request.method().as_str());
        key.push(' ');
        key.push_str(normalize_path(request.path()));

        if let Some(query) = request.query_string() {
            let mut pairs: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
            if !pairs.is_empty() {
                pairs.sort_unstable();
                key.push('?');
                key.push_str(&pairs.join("&"));
            }
        }

        for name in vary_headers {
            let name = name.as_ref();
            let values: Vec<&str> = request.headers().get_all(name).collect();
            key.push('|');
            key.push_str(&name.to_ascii_lowercase());
            key.push('=');
            key.push_str(&values.join(","));
        }

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    #[test]
    fn root_path_survives_normalization() {
        let req = Request::new(Method::Get, "/");
        assert_eq!(CacheKey::for_request(&req, &[] as &[&str]).as_str(), "GET /");
    }

    #[test]
    fn method_distinguishes_keys() {
        let get = Request::new(Method::Get, "/a");
        let head = Request::new(Method::Head, "/a");
        assert_ne!(
            CacheKey::for_request(&get, &[] as &[&str]),
            CacheKey::for_request(&head, &[] as &[&str])
        );
    }

    #[test]
    fn query_flags_distinguish_keys() {
        let public = Request::new(Method::Get, "/expires/expires_header");
        let private = Request::new(Method::Get, "/expires/expires_header?private=true");
        assert_ne!(
            CacheKey::for_request(&public, &[] as &[&str]),
            CacheKey::for_request(&private, &[] as &[&str])
        );
    }

    #[test]
    fn vary_headers_are_included() {
        let gzip = Request::new(Method::Get, "/a").with_header("Accept-Encoding", "gzip");
        let plain = Request::new(Method::Get, "/a");
        let vary = ["Accept-Encoding"];
        let gzip_key = CacheKey::for_request(&gzip, &vary);
        assert_eq!(gzip_key.as_str(), "GET /a|accept-encoding=gzip");
        assert_ne!(gzip_key, CacheKey::for_request(&plain, &vary));
    }

    #[test]
    fn empty_query_is_dropped() {
        let req = Request::new(Method::Get, "/a?");
        assert_eq!(CacheKey::for_request(&req, &[] as &[&str]).as_str(), "GET /a");
    }
}
