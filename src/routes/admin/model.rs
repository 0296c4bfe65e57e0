use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::AppError;
use crate::lifecycle::{self, HotelStatus, LifecycleAction, Transition};
use crate::routes::hotel::model::Hotel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewResult {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub result: ReviewResult,
    pub reason: Option<String>,
}

/// 管理端列表项：酒店主体 + 所属商户用户名
#[derive(Debug, Serialize, FromRow)]
pub struct AdminHotelItem {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub hotel: Hotel,
    pub merchant_username: String,
}

/// 管理员流转统一入口：行锁内做前置检查，更新与审计同一事务。
/// 并发下后到的请求会看到已变化的状态并收到 InvalidTransition。
pub(crate) async fn apply_admin_transition(
    pool: &PgPool,
    hotel_id: &str,
    operator_id: &str,
    action: LifecycleAction,
    reason: Option<String>,
) -> Result<(Hotel, Transition), AppError> {
    let mut tx = pool.begin().await?;

    let hotel = Hotel::find_for_update(&mut tx, hotel_id)
        .await?
        .ok_or_else(|| AppError::NotFound("酒店不存在".to_string()))?;
    let t = lifecycle::transition(hotel.status, action, hotel.offline_from_status)?;

    let note = match action {
        LifecycleAction::Approve => "approve".to_string(),
        LifecycleAction::Reject => reason.clone().unwrap_or_default(),
        LifecycleAction::Publish => "publish".to_string(),
        LifecycleAction::Offline => "offline".to_string(),
        LifecycleAction::Restore => format!("restore to {}", t.to),
        _ => action.to_string(),
    };

    let updated =
        Hotel::persist_transition(&mut tx, hotel_id, &t, reason.as_deref(), operator_id, &note)
            .await?;

    tx.commit().await?;

    Ok((updated, t))
}

pub async fn list_hotels(
    pool: &PgPool,
    status: Option<HotelStatus>,
    merchant_id: Option<&str>,
    page: i64,
    page_size: i64,
) -> Result<(i64, Vec<AdminHotelItem>), sqlx::Error> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM hotels
        WHERE ($1 IS NULL OR status = $1) AND ($2 IS NULL OR merchant_id = $2)
        "#,
    )
    .bind(status)
    .bind(merchant_id)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, AdminHotelItem>(
        r#"
        SELECT h.*, u.username AS merchant_username
        FROM hotels h
        JOIN users u ON u.id = h.merchant_id
        WHERE ($1 IS NULL OR h.status = $1) AND ($2 IS NULL OR h.merchant_id = $2)
        ORDER BY h.updated_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(status)
    .bind(merchant_id)
    .bind(page_size)
    .bind((page - 1) * page_size)
    .fetch_all(pool)
    .await?;

    Ok((total, items))
}
