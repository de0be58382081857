//! Per-IP rate limiting middleware
//!
//! Each client IP gets a bucket of `max_requests` that refills evenly over
//! `window_secs`, using `governor`'s keyed limiter. Requests over the limit
//! are rejected with 429 before reaching a handler.
//!
//! The client IP is the first `X-Forwarded-For` hop when present, else the
//! peer address.

use crate::config::RateLimitSettings;
use crate::error::AppError;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Rate limit middleware factory
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    settings: RateLimitSettings,
}

impl RateLimitMiddleware {
    pub fn new(settings: RateLimitSettings) -> Result<Self, AppError> {
        let burst = NonZeroU32::new(settings.max_requests).ok_or_else(|| {
            AppError::Internal("RATE_LIMIT_MAX_REQUESTS must be > 0".to_string())
        })?;
        let window = Duration::from_secs(settings.window_secs.max(1));
        let quota = Quota::with_period(window / burst.get())
            .ok_or_else(|| AppError::Internal("rate limit period must be > 0".to_string()))?
            .allow_burst(burst);

        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            settings,
        })
    }

    /// Drop state for IPs whose buckets have fully refilled.
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let limiter = self.limiter.clone();
        let settings = self.settings.clone();

        Box::pin(async move {
            Ok(RateLimitMiddlewareService {
                service,
                limiter,
                settings,
            })
        })
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: S,
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    settings: RateLimitSettings,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let ip = extract_client_ip(&req);

        if self.limiter.check_key(&ip).is_err() {
            warn!(%ip, "Rate limit exceeded");
            let response = HttpResponse::build(StatusCode::TOO_MANY_REQUESTS).json(
                serde_json::json!({
                    "error": format!(
                        "Too many requests: limit is {} per {} seconds",
                        self.settings.max_requests, self.settings.window_secs
                    ),
                    "status": StatusCode::TOO_MANY_REQUESTS.as_u16(),
                }),
            );
            let res = req.into_response(response).map_into_right_body();
            return Box::pin(async move { Ok(res) });
        }

        debug!(%ip, "Rate limit check passed");

        let fut = self.service.call(req);
        Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
    }
}

/// Extract client IP from request, respecting X-Forwarded-For header
fn extract_client_ip(req: &ServiceRequest) -> IpAddr {
    if let Some(x_forwarded_for) = req.headers().get("X-Forwarded-For") {
        if let Ok(header_value) = x_forwarded_for.to_str() {
            if let Some(first_ip) = header_value.split(',').next() {
                if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                    return ip;
                }
            }
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    fn settings(max_requests: u32) -> RateLimitSettings {
        RateLimitSettings {
            max_requests,
            window_secs: 900,
        }
    }

    #[::core::prelude::v1::test]
    fn zero_requests_is_rejected() {
        assert!(RateLimitMiddleware::new(settings(0)).is_err());
    }

    #[actix_web::test]
    async fn limits_each_ip_independently() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(settings(2)).unwrap())
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let from = |ip: &str| {
            test::TestRequest::get()
                .uri("/")
                .insert_header(("X-Forwarded-For", ip.to_string()))
                .to_request()
        };

        assert_eq!(test::call_service(&app, from("10.0.0.1")).await.status(), StatusCode::OK);
        assert_eq!(test::call_service(&app, from("10.0.0.1")).await.status(), StatusCode::OK);
        assert_eq!(
            test::call_service(&app, from("10.0.0.1")).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(test::call_service(&app, from("10.0.0.2")).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn forwarded_for_uses_first_hop() {
        let req = test::TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
            .to_srv_request();
        assert_eq!(extract_client_ip(&req), "203.0.113.7".parse::<IpAddr>().unwrap());
    }
}
