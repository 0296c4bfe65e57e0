use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::AppError,
    lifecycle::{HotelStatus, Role},
    notify::{self, Event},
    utils::{Claims, Paged, clamp_page, success_to_api_response},
};

use super::model::{Hotel, HotelUpsertRequest};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

#[axum::debug_handler]
pub async fn create_hotel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<HotelUpsertRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_role(Role::Merchant)?;

    let detail = Hotel::create(&state.pool, &claims.sub, &req).await?;

    // 保存成功后实时推送给该商户
    state.notifier.publish(
        &notify::user_topic(&claims.sub),
        Event::new(
            "hotel:updated",
            serde_json::json!({
                "hotelId": detail.hotel.id,
                "hotel": serde_json::to_value(&detail).unwrap_or(serde_json::Value::Null),
            }),
        ),
    );

    Ok((StatusCode::CREATED, success_to_api_response(detail)))
}

#[axum::debug_handler]
pub async fn update_hotel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(hotel_id): Path<String>,
    Json(req): Json<HotelUpsertRequest>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_role(Role::Merchant)?;

    let (detail, t) = Hotel::update(&state.pool, &hotel_id, &claims.sub, &req).await?;

    state.notifier.publish(
        &notify::user_topic(&claims.sub),
        Event::new(
            t.event,
            serde_json::json!({
                "hotelId": detail.hotel.id,
                "hotel": serde_json::to_value(&detail).unwrap_or(serde_json::Value::Null),
            }),
        ),
    );

    Ok((StatusCode::OK, success_to_api_response(detail)))
}

#[axum::debug_handler]
pub async fn submit_hotel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(hotel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_role(Role::Merchant)?;

    let (hotel, t) = Hotel::submit(&state.pool, &hotel_id, &claims.sub).await?;

    // 推送给管理员端：有新的待审
    state.notifier.publish(
        notify::ADMIN_TOPIC,
        Event::new(t.event, serde_json::json!({ "hotelId": hotel.id })),
    );

    Ok((StatusCode::OK, success_to_api_response(hotel)))
}

#[axum::debug_handler]
pub async fn list_my_hotels(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_role(Role::Merchant)?;

    let status = parse_status_filter(query.status.as_deref())?;
    let (page, page_size) = clamp_page(query.page, query.page_size);

    let (total, items) =
        Hotel::list(&state.pool, Some(&claims.sub), status, page, page_size).await?;

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
pub async fn get_my_hotel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(hotel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.require_role(Role::Merchant)?;

    let detail = Hotel::find_detail(&state.pool, &hotel_id)
        .await?
        .ok_or_else(|| AppError::NotFound("酒店不存在".to_string()))?;
    if detail.hotel.merchant_id != claims.sub {
        return Err(AppError::Forbidden("无权限".to_string()));
    }

    Ok((StatusCode::OK, success_to_api_response(detail)))
}

/// 状态筛选参数：缺省或空串表示不过滤，未知 token 报参数错误
pub(crate) fn parse_status_filter(raw: Option<&str>) -> Result<Option<HotelStatus>, AppError> {
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => HotelStatus::parse(s)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("未知的状态: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_parsing() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("")).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("PUBLISHED")).unwrap(),
            Some(HotelStatus::Published)
        );
        // 历史小写 token 在入口归一化
        assert_eq!(
            parse_status_filter(Some("draft")).unwrap(),
            Some(HotelStatus::Draft)
        );
        assert!(parse_status_filter(Some("WHATEVER")).is_err());
    }
}
