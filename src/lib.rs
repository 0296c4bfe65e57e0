use std::sync::Arc;

use config::Config;
use notify::Notifier;
use redis::Client as RedisClient;
use sqlx::PgPool;

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod notify;
pub mod utils;

pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub redis: Arc<RedisClient>,
    pub notifier: Arc<dyn Notifier>,
}
