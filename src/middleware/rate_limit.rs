//! Rate limiting middleware
//!
//! Per-client-IP token buckets for endpoints that are attractive to brute
//! force: signup, login and the password reset flow.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::utils::errors::WaddleError;

/// Keyed limiter shared between requests
#[derive(Clone)]
pub struct IpRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    clock: DefaultClock,
}

impl IpRateLimiter {
    /// Allow `per_minute` requests per client, bursting up to the same amount
    pub fn per_minute(per_minute: u32) -> Self {
        let rate = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(rate))),
            clock: DefaultClock::default(),
        }
    }

    /// `Err(seconds to wait)` when the client is over its quota
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        self.limiter
            .check_key(&ip)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()).as_secs().max(1))
    }

    /// Forget idle clients
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }
}

/// Client address from proxy headers, falling back to loopback
pub fn client_ip(headers: &HeaderMap) -> IpAddr {
    if let Some(forwarded) = headers.get("X-Forwarded-For").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = forwarded
            .split(',')
            .next()
            .and_then(|first| first.trim().parse::<IpAddr>().ok())
        {
            return ip;
        }
    }

    if let Some(ip) = headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
    {
        return ip;
    }

    IpAddr::from([127, 0, 0, 1])
}

pub async fn rate_limit_middleware(State(limiter): State<IpRateLimiter>, req: Request, next: Next) -> Response {
    let ip = client_ip(req.headers());
    match limiter.check(ip) {
        Ok(()) => next.run(req).await,
        Err(wait_secs) => {
            warn!(client_ip = %ip, path = %req.uri().path(), "Rate limit exceeded");
            let mut response = WaddleError::RateLimitExceeded.into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(wait_secs));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_priority() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), IpAddr::from([127, 0, 0, 1]));

        headers.insert("X-Real-IP", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers), IpAddr::from([10, 0, 0, 2]));

        headers.insert("X-Forwarded-For", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&headers), IpAddr::from([203, 0, 113, 7]));

        headers.insert("X-Forwarded-For", HeaderValue::from_static("garbage"));
        assert_eq!(client_ip(&headers), IpAddr::from([10, 0, 0, 2]));
    }

    #[test]
    fn test_limiter_is_per_client() {
        let limiter = IpRateLimiter::per_minute(2);
        let a = IpAddr::from([192, 0, 2, 1]);
        let b = IpAddr::from([192, 0, 2, 2]);

        assert!(limiter.check(a).is_ok());
        assert!(limiter.check(a).is_ok());
        let wait = limiter.check(a).unwrap_err();
        assert!(wait >= 1);

        assert!(limiter.check(b).is_ok());
    }

    #[test]
    fn test_zero_quota_still_allows_one() {
        let limiter = IpRateLimiter::per_minute(0);
        let ip = IpAddr::from([192, 0, 2, 9]);
        assert!(limiter.check(ip).is_ok());
        assert!(limiter.check(ip).is_err());
    }
}
