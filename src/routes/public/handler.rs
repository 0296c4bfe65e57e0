use axum::{
    extract::{Json, Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::AppError,
    utils::{Paged, clamp_page, success_to_api_response},
};

use super::model::{
    self, SEARCH_INTERNAL_ERROR, SEARCH_INVALID_PARAMS, SEARCH_CITY_UNSUPPORTED, SearchEnvelope,
    SearchOutcome, SearchRequest,
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

/// 公开搜索：无论成功失败都返回成功外壳，code 表达语义
#[axum::debug_handler]
pub async fn search_hotels(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(_) => {
            return (
                StatusCode::OK,
                Json(SearchEnvelope::failure(SEARCH_INVALID_PARAMS, "参数校验失败")),
            );
        }
    };

    match model::search(&state.pool, &req).await {
        Ok(SearchOutcome::Invalid(message)) => (
            StatusCode::OK,
            Json(SearchEnvelope::failure(SEARCH_INVALID_PARAMS, message)),
        ),
        Ok(SearchOutcome::CityNotSupported) => (
            StatusCode::OK,
            Json(SearchEnvelope::failure(
                SEARCH_CITY_UNSUPPORTED,
                "城市不支持或不存在",
            )),
        ),
        Ok(SearchOutcome::Results(list)) => (StatusCode::OK, Json(SearchEnvelope::ok(list))),
        Err(e) => {
            tracing::error!("Hotel search failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SearchEnvelope::failure(SEARCH_INTERNAL_ERROR, "服务内部异常")),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn list_hotels(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (page, page_size) = clamp_page(query.page, query.page_size);

    let (total, items) = model::list_published(&state.pool, page, page_size).await?;

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
pub async fn get_hotel_detail(
    State(state): State<AppState>,
    Path(hotel_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = model::find_published_detail(&state.pool, &state.redis, &hotel_id)
        .await?
        .ok_or_else(|| AppError::NotFound("酒店不存在或未发布".to_string()))?;

    Ok((StatusCode::OK, success_to_api_response(detail)))
}
