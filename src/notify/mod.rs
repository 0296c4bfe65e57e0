//! 实时事件推送
//!
//! 生命周期动作产生的事件通过 [`Notifier`] 发出，按房间号路由：
//! 商户订阅 `user:<商户ID>`，管理员订阅 `admin`。推送是尽力而为的
//! 旁路通道，失败只记日志，绝不回滚或阻塞业务写入。

use std::sync::Arc;

use redis::AsyncCommands;
use serde::Serialize;

pub const ADMIN_TOPIC: &str = "admin";

pub fn user_topic(user_id: &str) -> String {
    format!("user:{}", user_id)
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub event: &'static str,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(event: &'static str, payload: serde_json::Value) -> Self {
        Self { event, payload }
    }
}

pub trait Notifier: Send + Sync {
    /// 发布到指定房间，立即返回，不保证送达
    fn publish(&self, topic: &str, event: Event);
}

/// 经 Redis PUB/SUB 广播，网关侧按频道转发给已连接的客户端
pub struct RedisNotifier {
    redis: Arc<redis::Client>,
}

impl RedisNotifier {
    pub fn new(redis: Arc<redis::Client>) -> Self {
        Self { redis }
    }
}

impl Notifier for RedisNotifier {
    fn publish(&self, topic: &str, event: Event) {
        let redis = self.redis.clone();
        let topic = topic.to_string();
        tokio::spawn(async move {
            let payload = match serde_json::to_string(&event) {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!("Failed to serialize event {}: {}", event.event, e);
                    return;
                }
            };
            match redis.get_multiplexed_async_connection().await {
                Ok(mut conn) => {
                    let result: redis::RedisResult<i64> = conn.publish(&topic, payload).await;
                    if let Err(e) = result {
                        tracing::warn!("Failed to publish {} to {}: {}", event.event, topic, e);
                    } else {
                        tracing::debug!("Published {} to {}", event.event, topic);
                    }
                }
                Err(e) => {
                    tracing::warn!("Redis unavailable, dropping event {}: {}", event.event, e);
                }
            }
        });
    }
}

/// 测试与脚本场景下的空实现
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn publish(&self, _topic: &str, _event: Event) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics() {
        assert_eq!(user_topic("m1"), "user:m1");
        assert_eq!(ADMIN_TOPIC, "admin");
    }

    #[test]
    fn event_wire_shape() {
        let event = Event::new("hotel:submitted", serde_json::json!({ "hotelId": "h1" }));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "hotel:submitted");
        assert_eq!(json["payload"]["hotelId"], "h1");
    }
}
