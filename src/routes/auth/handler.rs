use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{AppState, error::AppError, utils::{generate_token, success_to_api_response, verify_password}};

use super::model::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, User, UserInfo, valid_username,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 检查用户名格式
    if !valid_username(&req.username) {
        return Err(AppError::Validation(
            "用户名格式无效，需为3-30位字母、数字或下划线".to_string(),
        ));
    }
    if req.password.len() < 6 {
        return Err(AppError::Validation("密码长度至少为6位".to_string()));
    }

    let user = User::create(&state.pool, &req.username, &req.password, req.role).await?;
    tracing::info!("Registered user {} with role {:?}", user.username, user.role);

    Ok((
        StatusCode::OK,
        success_to_api_response(RegisterResponse {
            user: UserInfo::from(&user),
        }),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = User::find_by_username(&state.pool, &req.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("账号或密码错误".to_string()))?;

    // 验证密码：用户不存在和密码错误返回同一条消息
    let ok = verify_password(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
    if !ok {
        return Err(AppError::Unauthorized("账号或密码错误".to_string()));
    }

    let token = generate_token(&user.id, &user.username, user.role, &state.config)
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;

    Ok((
        StatusCode::OK,
        success_to_api_response(LoginResponse {
            token,
            user: UserInfo::from(&user),
        }),
    ))
}
