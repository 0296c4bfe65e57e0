use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{AppState, error::AppError, utils::verify_token};

/// 校验 Authorization: Bearer <token>，把解出的 Claims 挂到请求上
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let token = match token {
        Some(t) => t,
        None => {
            return AppError::Unauthorized("未登录或缺少 token".to_string()).into_response();
        }
    };

    match verify_token(token, &state.config) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!("Token verification failed: {}", e);
            AppError::Unauthorized("token 无效或已过期".to_string()).into_response()
        }
    }
}
