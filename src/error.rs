use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::lifecycle::{HotelStatus, LifecycleAction};
use crate::utils::{error_codes, error_to_api_response};

/// 业务错误分类
///
/// 调用方（以及测试）依赖这些变体相互可区分：权限不足、状态不允许、
/// 资源不存在是三类不同的失败，不能混成一个笼统的"操作失败"。
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入不合法（缺字段、日期格式、驳回缺原因等）
    #[error("{0}")]
    Validation(String),
    /// 目标资源不存在
    #[error("{0}")]
    NotFound(String),
    /// 已认证但无权操作目标资源
    #[error("{0}")]
    Forbidden(String),
    /// 当前状态不允许该动作
    #[error("当前状态({current})不允许{action}")]
    InvalidTransition {
        current: HotelStatus,
        action: LifecycleAction,
    },
    /// 唯一约束冲突（如用户名已存在）
    #[error("{0}")]
    Conflict(String),
    /// 未登录或凭证无效
    #[error("{0}")]
    Unauthorized(String),
    #[error("数据库错误")]
    Database(#[from] sqlx::Error),
    #[error("内部服务器错误")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, error_codes::PERMISSION_DENIED),
            AppError::InvalidTransition { .. } => {
                (StatusCode::BAD_REQUEST, error_codes::INVALID_TRANSITION)
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, error_codes::CONFLICT),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
            }
        };

        (status, error_to_api_response::<()>(code, self.to_string())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_reports_current_status_and_action() {
        let err = AppError::InvalidTransition {
            current: HotelStatus::Approved,
            action: LifecycleAction::Approve,
        };
        assert_eq!(err.to_string(), "当前状态(APPROVED)不允许审核通过");
    }

    #[test]
    fn error_kinds_stay_distinguishable() {
        // 三类失败各自映射到不同的语义码
        fn code(e: &AppError) -> i32 {
            match e {
                AppError::Forbidden(_) => error_codes::PERMISSION_DENIED,
                AppError::NotFound(_) => error_codes::NOT_FOUND,
                AppError::InvalidTransition { .. } => error_codes::INVALID_TRANSITION,
                _ => error_codes::INTERNAL_ERROR,
            }
        }
        let forbidden = AppError::Forbidden("无权限".into());
        let not_found = AppError::NotFound("酒店不存在".into());
        let invalid = AppError::InvalidTransition {
            current: HotelStatus::Draft,
            action: LifecycleAction::Publish,
        };
        assert_ne!(code(&forbidden), code(&not_found));
        assert_ne!(code(&not_found), code(&invalid));
        assert_ne!(code(&forbidden), code(&invalid));
    }
}
