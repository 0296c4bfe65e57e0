use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::AppError,
    lifecycle::{self, HotelStatus, LifecycleAction, Role, Transition},
    notify::{self, Event},
    routes::hotel::handler::parse_status_filter,
    routes::hotel::model::{AuditLog, Hotel},
    routes::public,
    utils::{Claims, Paged, clamp_page, success_to_api_response},
};

use super::model::{self, ReviewRequest, ReviewResult};

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub status: Option<String>,
    pub merchant_id: Option<String>,
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

#[axum::debug_handler]
pub async fn list_hotels(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<AdminListQuery>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_role(Role::Admin)?;

    // 缺省看待审列表，显式传空串看全部
    let status = match query.status.as_deref() {
        None => Some(HotelStatus::Submitted),
        some => parse_status_filter(some)?,
    };
    let (page, page_size) = clamp_page(query.page, query.page_size);

    let (total, items) = model::list_hotels(
        &state.pool,
        status,
        query.merchant_id.as_deref(),
        page,
        page_size,
    )
    .await?;

    Ok((
        StatusCode::OK,
        success_to_api_response(Paged {
            page,
            page_size,
            total,
            items,
        }),
    ))
}

#[axum::debug_handler]
pub async fn review_hotel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(hotel_id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_role(Role::Admin)?;

    let (action, reason) = match req.result {
        ReviewResult::Approve => (LifecycleAction::Approve, None),
        ReviewResult::Reject => {
            let reason = lifecycle::validate_reject_reason(req.reason.as_deref())?;
            (LifecycleAction::Reject, Some(reason))
        }
    };

    let (hotel, t) =
        model::apply_admin_transition(&state.pool, &hotel_id, &claims.sub, action, reason).await?;

    notify_merchant(&state, &hotel, &t);
    public::model::invalidate_detail_cache(&state.redis, &hotel_id).await;

    Ok((StatusCode::OK, success_to_api_response(hotel)))
}

#[axum::debug_handler]
pub async fn publish_hotel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(hotel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_role(Role::Admin)?;

    let (hotel, t) = model::apply_admin_transition(
        &state.pool,
        &hotel_id,
        &claims.sub,
        LifecycleAction::Publish,
        None,
    )
    .await?;

    notify_merchant(&state, &hotel, &t);
    public::model::invalidate_detail_cache(&state.redis, &hotel_id).await;

    Ok((StatusCode::OK, success_to_api_response(hotel)))
}

#[axum::debug_handler]
pub async fn offline_hotel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(hotel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_role(Role::Admin)?;

    let (hotel, t) = model::apply_admin_transition(
        &state.pool,
        &hotel_id,
        &claims.sub,
        LifecycleAction::Offline,
        None,
    )
    .await?;

    notify_merchant(&state, &hotel, &t);
    public::model::invalidate_detail_cache(&state.redis, &hotel_id).await;

    Ok((StatusCode::OK, success_to_api_response(hotel)))
}

#[axum::debug_handler]
pub async fn restore_hotel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(hotel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_role(Role::Admin)?;

    let (hotel, t) = model::apply_admin_transition(
        &state.pool,
        &hotel_id,
        &claims.sub,
        LifecycleAction::Restore,
        None,
    )
    .await?;

    notify_merchant(&state, &hotel, &t);
    public::model::invalidate_detail_cache(&state.redis, &hotel_id).await;

    Ok((StatusCode::OK, success_to_api_response(hotel)))
}

#[axum::debug_handler]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(hotel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_role(Role::Admin)?;

    // 目标不存在时与详情接口保持一致的 NotFound
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hotels WHERE id = $1")
        .bind(&hotel_id)
        .fetch_one(&state.pool)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("酒店不存在".to_string()));
    }

    let logs = AuditLog::list_for_hotel(&state.pool, &hotel_id).await?;

    Ok((StatusCode::OK, success_to_api_response(logs)))
}

/// 审核结果实时推送给所属商户
fn notify_merchant(state: &AppState, hotel: &Hotel, t: &Transition) {
    let payload = match t.event {
        "hotel:reviewed" => serde_json::json!({
            "hotelId": hotel.id,
            "status": hotel.status,
            "rejectReason": hotel.reject_reason,
        }),
        "hotel:restored" => serde_json::json!({
            "hotelId": hotel.id,
            "status": hotel.status,
        }),
        _ => serde_json::json!({ "hotelId": hotel.id }),
    };
    state
        .notifier
        .publish(&notify::user_topic(&hotel.merchant_id), Event::new(t.event, payload));
}
