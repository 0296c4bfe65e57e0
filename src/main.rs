use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use hotel_backend::{
    AppState,
    config::Config,
    middleware::{RateLimiter, auth_middleware, rate_limit},
    notify::RedisNotifier,
    routes,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'hotel_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    // 设置 Redis 客户端
    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");
    let redis_arc = Arc::new(redis_client.clone());

    // 设置应用状态
    let state = AppState {
        pool,
        config: config.clone(),
        redis: redis_arc.clone(),
        notifier: Arc::new(RedisNotifier::new(redis_arc)),
    };

    // 设置限流器
    let rate_limiter = Arc::new(RateLimiter::new(redis_client, config.clone()));

    // 将路由分为公开路由和受保护路由
    let public_routes = Router::new()
        // 注册登录
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        // 面向端侧的公开检索
        .route("/public/hotels/search", post(routes::public::search_hotels))
        .route("/public/hotels", get(routes::public::list_hotels))
        .route("/public/hotels/{id}", get(routes::public::get_hotel_detail));

    let protected_routes = Router::new()
        // 商户酒店路由
        .route(
            "/hotels",
            post(routes::hotel::create_hotel).get(routes::hotel::list_my_hotels),
        )
        .route(
            "/hotels/{id}",
            put(routes::hotel::update_hotel).get(routes::hotel::get_my_hotel),
        )
        .route("/hotels/{id}/submit", post(routes::hotel::submit_hotel))
        // 管理员路由
        .route("/admin/hotels", get(routes::admin::list_hotels))
        .route("/admin/hotels/{id}/review", post(routes::admin::review_hotel))
        .route("/admin/hotels/{id}/publish", post(routes::admin::publish_hotel))
        .route("/admin/hotels/{id}/offline", post(routes::admin::offline_hotel))
        .route("/admin/hotels/{id}/restore", post(routes::admin::restore_hotel))
        .route("/admin/hotels/{id}/audits", get(routes::admin::list_audit_logs))
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // 创建基础路由
    let router = Router::new().nest(
        &config.api_base_uri.clone(),
        Router::new().merge(public_routes).merge(protected_routes),
    );

    // 添加限流中间件；服务端错误在 AppError 映射处统一记录日志
    let router = router.layer(axum::middleware::from_fn_with_state(
        rate_limiter,
        rate_limit,
    ));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        let cors = CorsLayer::permissive();
        router.layer(cors)
    };

    // 添加应用状态
    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
