//! HTTP-date helpers for `Last-Modified` and `If-Modified-Since`.
//!
//! HTTP dates carry whole seconds only, so every timestamp that crosses this
//! module is truncated to second precision first.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// First instant an IMF-fixdate cannot express (`10000-01-01T00:00:00Z`).
const MAX_SECONDS: u64 = 253_402_300_800;

/// Returns `true` if `time` falls between the Unix epoch and the end of
/// year 9999, the range an HTTP-date can carry.
pub fn is_representable(time: SystemTime) -> bool {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs() < MAX_SECONDS,
        Err(_) => false,
    }
}

/// Formats a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
///
/// Returns `None` for times outside [`is_representable`].
pub fn format(time: SystemTime) -> Option<String> {
    if !is_representable(time) {
        tracing::debug!(?time, "timestamp has no HTTP-date form");
        return None;
    }
    Some(httpdate::fmt_http_date(time))
}

/// Parses an HTTP-date header value. Malformed input yields `None`.
pub fn parse(value: &str) -> Option<SystemTime> {
    match httpdate::parse_http_date(value.trim()) {
        Ok(time) => Some(time),
        Err(e) => {
            tracing::debug!(value, error = %e, "ignoring unparsable HTTP date");
            None
        }
    }
}

/// Drops any sub-second component of `time`.
///
/// Times before the Unix epoch are returned unchanged.
pub fn truncate_to_seconds(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => UNIX_EPOCH + Duration::from_secs(since.as_secs()),
        Err(_) => time,
    }
}
