//! Status-driven retry policy.
//!
//! Retries are immediate and bounded. Only the method, the caller's retry
//! setting and the response status take part in the decision; interceptors
//! and transport failures never do.

use crate::http::HttpMethod;
use crate::options::Retry;

pub const RETRYABLE_STATUS_CODES: [u16; 8] = [
    408, // Request Timeout
    409, // Conflict
    425, // Too Early
    429, // Too Many Requests
    500, // Internal Server Error
    502, // Bad Gateway
    503, // Service Unavailable
    504, // Gateway Timeout
];

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&status)
}

/// Additional attempts allowed when the caller did not choose a count.
pub fn default_retries(method: HttpMethod) -> u32 {
    if method.is_payload() {
        0
    } else {
        1
    }
}

/// Retries still allowed for a call, or `None` when retry is disabled.
pub fn allowed_retries(method: HttpMethod, retry: Option<Retry>) -> Option<u32> {
    match retry {
        Some(Retry::Disabled) => None,
        Some(Retry::Count(count)) => Some(count),
        None => Some(default_retries(method)),
    }
}

/// Decide whether a failed attempt is retried.
///
/// Returns the retry count to carry into the next attempt, which is always
/// one less than the count allowed for this one.
pub fn next_retry(method: HttpMethod, retry: Option<Retry>, status: u16) -> Option<Retry> {
    let allowed = allowed_retries(method, retry)?;
    if allowed > 0 && is_retryable_status(status) {
        Some(Retry::Count(allowed - 1))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_methods_default_to_no_retry() {
        for method in [HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete, HttpMethod::Patch] {
            assert_eq!(next_retry(method, None, 503), None, "{method}");
        }
    }

    #[test]
    fn get_defaults_to_one_retry() {
        assert_eq!(next_retry(HttpMethod::Get, None, 503), Some(Retry::Count(0)));
        assert_eq!(next_retry(HttpMethod::Get, Some(Retry::Count(0)), 503), None);
    }

    #[test]
    fn non_retryable_status_is_never_retried() {
        assert_eq!(next_retry(HttpMethod::Get, Some(Retry::Count(5)), 404), None);
        assert_eq!(next_retry(HttpMethod::Get, None, 400), None);
        assert_eq!(next_retry(HttpMethod::Get, None, 501), None);
    }

    #[test]
    fn explicit_count_overrides_method_default() {
        assert_eq!(next_retry(HttpMethod::Post, Some(Retry::Count(2)), 429), Some(Retry::Count(1)));
    }

    #[test]
    fn disabled_never_retries() {
        assert_eq!(allowed_retries(HttpMethod::Get, Some(Retry::Disabled)), None);
        assert_eq!(next_retry(HttpMethod::Get, Some(Retry::Disabled), 503), None);
    }

    #[test]
    fn explicit_count_decreases_to_zero_and_stops() {
        let mut retry = Some(Retry::Count(3));
        let mut attempts = 1;
        while let Some(next) = next_retry(HttpMethod::Get, retry, 500) {
            retry = Some(next);
            attempts += 1;
        }
        assert_eq!(attempts, 4);
        assert_eq!(retry, Some(Retry::Count(0)));
    }

    #[test]
    fn retryable_set_is_exact() {
        for status in [408, 409, 425, 429, 500, 502, 503, 504] {
            assert!(is_retryable_status(status), "{status}");
        }
        for status in [200, 301, 400, 401, 403, 404, 501, 505] {
            assert!(!is_retryable_status(status), "{status}");
        }
    }
}
