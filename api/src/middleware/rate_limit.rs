//! Per-client-IP throttle for the code-issuing endpoints
//!
//! Fixed windows kept in process memory. Wrapped around `send-otp` and
//! `resend-otp` only; verify and status are bounded by the per-session
//! attempt counter instead.

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::{
    collections::HashMap,
    future::{ready, Ready},
    rc::Rc,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use pv_shared::config::RateLimitConfig;
use pv_shared::errors::{error_codes, ErrorResponse};

/// Windows kept before a sweep is attempted
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStatus {
    Ok { remaining: u32 },
    Exceeded { retry_after_seconds: u64 },
}

/// Rate limiter middleware factory
///
/// Clones share the same counters, so one limiter can wrap several
/// resources and they draw from a single budget per IP.
#[derive(Debug, Clone)]
pub struct IpRateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    config: RateLimitConfig,
}

impl IpRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Limiter that lets everything through
    pub fn disabled() -> Self {
        Self::new(RateLimitConfig::disabled())
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_seconds)
    }

    /// Count a request from `client` at `now`
    pub fn check(&self, client: &str, now: Instant) -> RateLimitStatus {
        let limit = self.config.otp_requests_per_window;
        if !self.config.enabled {
            return RateLimitStatus::Ok { remaining: limit };
        }

        let window = self.window();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() >= SWEEP_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= limit {
            let elapsed = now.duration_since(entry.started);
            let left = window.saturating_sub(elapsed);
            // Round up so clients never retry a moment too early
            let retry_after_seconds = left.as_secs() + u64::from(left.subsec_nanos() > 0);
            return RateLimitStatus::Exceeded {
                retry_after_seconds: retry_after_seconds.max(1),
            };
        }

        entry.count += 1;
        RateLimitStatus::Ok {
            remaining: limit - entry.count,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IpRateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = IpRateLimiterMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IpRateLimiterMiddleware {
            service: Rc::new(service),
            limiter: self.clone(),
        }))
    }
}

/// Rate limiter middleware service
pub struct IpRateLimiterMiddleware<S> {
    service: Rc<S>,
    limiter: IpRateLimiter,
}

impl<S, B> Service<ServiceRequest> for IpRateLimiterMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let client_ip = get_client_ip(&req, self.limiter.config.trust_proxy_headers);
        let status = self.limiter.check(&client_ip, Instant::now());

        Box::pin(async move {
            match status {
                RateLimitStatus::Ok { .. } => {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                RateLimitStatus::Exceeded {
                    retry_after_seconds,
                } => {
                    tracing::warn!(
                        client_ip = %client_ip,
                        path = %req.path(),
                        retry_after_seconds = retry_after_seconds,
                        event = "ip_rate_limited",
                        "Too many OTP requests from client"
                    );
                    let body = ErrorResponse::new(
                        error_codes::IP_RATE_LIMITED,
                        format!(
                            "Too many requests. Please try again in {} seconds",
                            retry_after_seconds
                        ),
                    )
                    .add_detail("retry_after_seconds", retry_after_seconds);
                    let response = HttpResponse::TooManyRequests()
                        .insert_header((header::RETRY_AFTER, retry_after_seconds.to_string()))
                        .json(body);
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Client address used as the throttle key
///
/// With `trust_proxy_headers` the first `X-Forwarded-For` hop wins, then
/// `X-Real-IP`. Without it those headers are client-controlled and ignored,
/// and only the socket peer counts.
fn get_client_ip(req: &ServiceRequest, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(req) {
            return ip;
        }
    }

    req.connection_info()
        .peer_addr()
        .unwrap_or("unknown")
        .to_string()
}

fn forwarded_ip(req: &ServiceRequest) -> Option<String> {
    if let Some(forwarded_for) = req.headers().get("X-Forwarded-For") {
        if let Ok(forwarded_str) = forwarded_for.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Some(ip.to_string());
                }
            }
        }
    }

    req.headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn limiter(limit: u32, window_seconds: u64) -> IpRateLimiter {
        IpRateLimiter::new(RateLimitConfig {
            enabled: true,
            otp_requests_per_window: limit,
            window_seconds,
            trust_proxy_headers: false,
        })
    }

    #[test]
    fn test_limit_within_window() {
        let limiter = limiter(3, 60);
        let now = Instant::now();

        assert_eq!(limiter.check("1.2.3.4", now), RateLimitStatus::Ok { remaining: 2 });
        assert_eq!(limiter.check("1.2.3.4", now), RateLimitStatus::Ok { remaining: 1 });
        assert_eq!(limiter.check("1.2.3.4", now), RateLimitStatus::Ok { remaining: 0 });
        assert_eq!(
            limiter.check("1.2.3.4", now + Duration::from_secs(10)),
            RateLimitStatus::Exceeded {
                retry_after_seconds: 50
            }
        );

        // Other clients have their own budget
        assert_eq!(limiter.check("5.6.7.8", now), RateLimitStatus::Ok { remaining: 2 });
    }

    #[test]
    fn test_window_resets() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(matches!(limiter.check("ip", now), RateLimitStatus::Ok { .. }));
        assert!(matches!(
            limiter.check("ip", now + Duration::from_secs(59)),
            RateLimitStatus::Exceeded { .. }
        ));
        assert!(matches!(
            limiter.check("ip", now + Duration::from_secs(60)),
            RateLimitStatus::Ok { .. }
        ));
    }

    #[test]
    fn test_disabled_never_limits() {
        let limiter = IpRateLimiter::disabled();
        let now = Instant::now();
        for _ in 0..100 {
            assert!(matches!(limiter.check("ip", now), RateLimitStatus::Ok { .. }));
        }
    }

    #[test]
    fn test_clones_share_counters() {
        let a = limiter(1, 60);
        let b = a.clone();
        let now = Instant::now();

        assert!(matches!(a.check("ip", now), RateLimitStatus::Ok { .. }));
        assert!(matches!(b.check("ip", now), RateLimitStatus::Exceeded { .. }));
    }

    #[test]
    fn test_client_ip_precedence_behind_trusted_proxy() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
            .insert_header(("X-Real-IP", "198.51.100.2"))
            .peer_addr("192.0.2.1:4000".parse().unwrap())
            .to_srv_request();
        assert_eq!(get_client_ip(&req, true), "203.0.113.7");

        let req = TestRequest::default()
            .insert_header(("X-Real-IP", "198.51.100.2"))
            .peer_addr("192.0.2.1:4000".parse().unwrap())
            .to_srv_request();
        assert_eq!(get_client_ip(&req, true), "198.51.100.2");

        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", " "))
            .peer_addr("192.0.2.1:4000".parse().unwrap())
            .to_srv_request();
        assert_eq!(get_client_ip(&req, true), "192.0.2.1");
    }

    #[test]
    fn test_forwarding_headers_ignored_by_default() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7"))
            .insert_header(("X-Real-IP", "198.51.100.2"))
            .peer_addr("192.0.2.1:4000".parse().unwrap())
            .to_srv_request();
        assert_eq!(get_client_ip(&req, false), "192.0.2.1");

        let req = TestRequest::default().to_srv_request();
        assert_eq!(get_client_ip(&req, false), "unknown");
    }
}
