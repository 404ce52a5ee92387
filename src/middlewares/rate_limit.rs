//! 固定窗口速率限制
//!
//! 已认证请求按用户计数，否则按客户端 IP 计数；超过限制返回 429 并带 `Retry-After`。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::{ApiResponse, ErrorCode, users::entities::User};

/// 窗口计数，键为 `前缀:身份:窗口序号`
static WINDOW_COUNTERS: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        // 覆盖最长的窗口，过期的窗口序号不会再被访问
        .time_to_live(Duration::from_secs(3600))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: &'static str,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64, key_prefix: &'static str) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.clamp(1, 3600),
            key_prefix,
        }
    }

    pub fn login() -> Self {
        Self::new(5, 60, "login")
    }

    pub fn register() -> Self {
        Self::new(3, 60, "register")
    }

    pub fn refresh_token() -> Self {
        Self::new(10, 60, "refresh")
    }

    pub fn file_upload() -> Self {
        Self::new(10, 60, "upload")
    }

    /// 试卷、测试题、摘要等调用 LLM 的生成端点
    pub fn generation() -> Self {
        Self::new(5, 60, "generation")
    }

    pub fn chat() -> Self {
        Self::new(30, 60, "chat")
    }
}

/// 当前时间所在的窗口序号
fn window_bucket(now_secs: u64, window_secs: u64) -> u64 {
    now_secs / window_secs
}

/// 距离当前窗口结束的秒数，至少为 1
fn seconds_until_reset(now_secs: u64, window_secs: u64) -> u64 {
    (window_secs - now_secs % window_secs).max(1)
}

/// 优先使用连接信息中的地址，其次是代理头
fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    if let Some(ref ip) = connection_ip
        && ip.parse::<IpAddr>().is_ok()
    {
        return ip.clone();
    }

    for header in ["X-Forwarded-For", "X-Real-IP"] {
        if let Some(value) = req.headers().get(header).and_then(|v| v.to_str().ok())
            && let Some(ip) = value.split(',').next().map(str::trim)
            && ip.parse::<IpAddr>().is_ok()
        {
            return ip.to_string();
        }
    }

    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

fn rate_limited_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .json(ApiResponse::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limit = self.limit.clone();

        Box::pin(async move {
            let identity = req
                .extensions()
                .get::<User>()
                .map(|user| format!("user:{}", user.id))
                .unwrap_or_else(|| format!("ip:{}", extract_client_ip(&req)));

            let now = chrono::Utc::now().timestamp().max(0) as u64;
            let key = format!(
                "{}:{}:{}",
                limit.key_prefix,
                identity,
                window_bucket(now, limit.window_secs)
            );

            let count = WINDOW_COUNTERS
                .entry(key.clone())
                .and_upsert_with(|existing| {
                    let next = existing.map(|e| e.into_value()).unwrap_or(0) + 1;
                    std::future::ready(next)
                })
                .await
                .into_value();

            if count > limit.max_requests {
                warn!("速率限制触发: {} ({}/{})", key, count, limit.max_requests);
                let retry_after = seconds_until_reset(now, limit.window_secs);
                return Ok(req.into_response(
                    rate_limited_response(retry_after).map_into_right_body(),
                ));
            }

            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let login = RateLimit::login();
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.key_prefix, "login");

        let generation = RateLimit::generation();
        assert_eq!(generation.max_requests, 5);
        assert_eq!(generation.window_secs, 60);
    }

    #[test]
    fn test_window_is_clamped() {
        assert_eq!(RateLimit::new(1, 0, "x").window_secs, 1);
        assert_eq!(RateLimit::new(1, 86_400, "x").window_secs, 3600);
    }

    #[test]
    fn test_window_bucket_and_reset() {
        assert_eq!(window_bucket(119, 60), 1);
        assert_eq!(window_bucket(120, 60), 2);
        assert_eq!(seconds_until_reset(119, 60), 1);
        assert_eq!(seconds_until_reset(120, 60), 60);
        assert_eq!(seconds_until_reset(130, 60), 50);
    }
}
