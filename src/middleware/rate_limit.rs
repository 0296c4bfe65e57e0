use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;

use crate::{
    config::Config,
    utils::{error_codes, error_to_api_response},
};

/// 限流计数的键前缀，与公开详情缓存共用同一个 Redis 实例
const RATE_LIMIT_KEY_PREFIX: &str = "hotel:rate:";

/// 固定窗口限流：按客户端 IP 计数，窗口和阈值来自配置
#[derive(Clone)]
pub struct RateLimiter {
    redis: Arc<redis::Client>,
    config: Arc<Config>,
}

/// 取客户端 IP：优先代理头，退化到连接对端地址
fn client_ip(req: &Request<Body>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

impl RateLimiter {
    pub fn new(redis: redis::Client, config: Config) -> Self {
        Self {
            redis: Arc::new(redis),
            config: Arc::new(config),
        }
    }

    pub async fn check_rate_limit(
        self: Arc<Self>,
        req: Request<Body>,
        next: Next,
    ) -> Result<Response, StatusCode> {
        let ip = client_ip(&req);
        let window_secs = self.config.rate_limit_window().as_secs();
        let key = format!("{}{}", RATE_LIMIT_KEY_PREFIX, ip);

        // 限流器故障时放行：检索和审核流程不因 Redis 不可用而中断
        let mut conn = match self.redis.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Rate limiter unavailable, letting request through: {}", e);
                return Ok(next.run(req).await);
            }
        };

        // INCR + 首次设置过期时间，构成一个固定窗口计数器
        let count: i64 = match conn.incr(&key, 1).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Rate limit INCR failed for {}: {}", ip, e);
                return Ok(next.run(req).await);
            }
        };
        if count == 1 {
            let _: Result<(), redis::RedisError> = conn.expire(&key, window_secs as i64).await;
        }

        if count > self.config.rate_limit_requests as i64 {
            tracing::debug!("Rate limit hit for {}: {} requests in window", ip, count);
            return Ok((
                StatusCode::OK,
                error_to_api_response::<()>(
                    error_codes::RATE_LIMIT,
                    format!("请求过于频繁，请在{}秒后重试", window_secs),
                ),
            )
                .into_response());
        }

        Ok(next.run(req).await)
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request<Body> {
        Request::builder().body(Body::empty()).unwrap()
    }

    #[test]
    fn client_ip_prefers_real_ip_header() {
        let mut req = request();
        req.headers_mut()
            .insert("x-real-ip", "203.0.113.7".parse().unwrap());
        req.headers_mut()
            .insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&req), "203.0.113.7");
    }

    #[test]
    fn client_ip_takes_first_forwarded_entry() {
        let mut req = request();
        req.headers_mut()
            .insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&req), "10.0.0.1");
    }

    #[test]
    fn client_ip_falls_back_to_peer_address() {
        let mut req = request();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(client_ip(&req), "192.0.2.1");

        assert_eq!(client_ip(&request()), "unknown");
    }
}
