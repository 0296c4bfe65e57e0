use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::lifecycle::HotelStatus;
use crate::routes::hotel::model::{Hotel, HotelDetail, NearbyPlace};

// 搜索接口的语义码：永远以成功外壳返回，code 区分结果
pub const SEARCH_OK: i32 = 0;
pub const SEARCH_INVALID_PARAMS: i32 = 1001;
pub const SEARCH_CITY_UNSUPPORTED: i32 = 1002;
pub const SEARCH_INTERNAL_ERROR: i32 = 2000;

// 公开详情缓存
const PUBLIC_HOTEL_CACHE_EXPIRE: u64 = 600; // 缓存过期时间，单位秒
const PUBLIC_HOTEL_CACHE_PREFIX: &str = "hotel:public:";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub city: String,
    pub keyword: Option<String>,
    pub check_in_date: String,
    pub check_out_date: String,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub hotel_id: String,
    pub hotel_name: String,
    pub address: String,
    pub cover_image: String,
    pub tags: Vec<String>,
    pub min_price: i64,
    pub score: f64,
    pub comment_count: i64,
}

#[derive(Debug, Serialize)]
pub struct SearchData {
    pub total: i64,
    pub list: Vec<SearchItem>,
}

#[derive(Debug, Serialize)]
pub struct SearchEnvelope {
    pub code: i32,
    pub message: String,
    pub data: SearchData,
}

impl SearchEnvelope {
    pub fn ok(list: Vec<SearchItem>) -> Self {
        Self {
            code: SEARCH_OK,
            message: "success".to_string(),
            data: SearchData {
                total: list.len() as i64,
                list,
            },
        }
    }

    pub fn failure(code: i32, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            data: SearchData {
                total: 0,
                list: vec![],
            },
        }
    }
}

/// 搜索的三种业务结局；数据库失败走 sqlx::Error 另算
#[derive(Debug)]
pub enum SearchOutcome {
    Invalid(&'static str),
    CityNotSupported,
    Results(Vec<SearchItem>),
}

/// 严格的 YYYY-MM-DD 解析，宽松格式一律视为无效
pub(crate) fn parse_ymd(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// 入住/离店必须都是合法日历日，且入住严格早于离店
pub(crate) fn validate_date_range(check_in: &str, check_out: &str) -> Option<(NaiveDate, NaiveDate)> {
    let check_in = parse_ymd(check_in)?;
    let check_out = parse_ymd(check_out)?;
    if check_in < check_out {
        Some((check_in, check_out))
    } else {
        None
    }
}

/// 关键词/标签匹配所需的酒店聚合视图
pub(crate) struct SearchCandidate {
    pub name_cn: String,
    pub name_en: Option<String>,
    pub address: String,
    pub nearby_names: Vec<String>,
    /// 全部优惠的 (标题, 描述)，标签匹配不区分是否生效
    pub discount_texts: Vec<(String, Option<String>)>,
}

/// 关键词命中中文名、英文名、地址或任一周边地点名（区分大小写的子串）
pub(crate) fn keyword_matches(c: &SearchCandidate, keyword: &str) -> bool {
    c.name_cn.contains(keyword)
        || c.name_en.as_deref().is_some_and(|n| n.contains(keyword))
        || c.address.contains(keyword)
        || c.nearby_names.iter().any(|n| n.contains(keyword))
}

fn matches_tag(c: &SearchCandidate, tag: &str) -> bool {
    c.name_cn.contains(tag)
        || c.address.contains(tag)
        || c.nearby_names.iter().any(|n| n.contains(tag))
        || c.discount_texts
            .iter()
            .any(|(title, desc)| {
                title.contains(tag) || desc.as_deref().is_some_and(|d| d.contains(tag))
            })
}

/// 标签之间是 AND，单个标签在各字段上是 OR
pub(crate) fn tags_match(c: &SearchCandidate, tags: &[String]) -> bool {
    tags.iter().all(|tag| matches_tag(c, tag))
}

/// 展示标签：周边地点名 + 生效优惠标题，按序去重，最多 8 个
pub(crate) fn merge_display_tags(nearby: &[String], promo_titles: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for name in nearby.iter().chain(promo_titles.iter()) {
        if merged.len() >= 8 {
            break;
        }
        if !merged.contains(name) {
            merged.push(name.clone());
        }
    }
    merged
}

/// 列表最低价：酒店标价优先，其次最便宜房型，否则 0
pub(crate) fn derive_min_price(hotel_min: Option<i64>, room_min: Option<i64>) -> i64 {
    hotel_min.or(room_min).unwrap_or(0)
}

#[derive(Debug, FromRow)]
struct SearchHotelRow {
    id: String,
    name_cn: String,
    name_en: Option<String>,
    address: String,
    star_rating: i32,
    min_price_cents: Option<i64>,
}

#[derive(Debug, FromRow)]
struct NearbyNameRow {
    hotel_id: String,
    name: String,
}

#[derive(Debug, FromRow)]
struct RoomMinRow {
    hotel_id: String,
    min_price: i64,
}

#[derive(Debug, FromRow)]
struct DiscountTextRow {
    hotel_id: String,
    title: String,
    description: Option<String>,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct AuditCountRow {
    hotel_id: String,
    count: i64,
}

pub async fn search(pool: &PgPool, req: &SearchRequest) -> Result<SearchOutcome, sqlx::Error> {
    let city = req.city.trim().to_string();
    if city.is_empty() {
        return Ok(SearchOutcome::Invalid("参数校验失败"));
    }
    let mut tags: Vec<String> = Vec::new();
    for tag in req.tags.iter().flatten() {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(SearchOutcome::Invalid("参数校验失败"));
        }
        tags.push(tag.to_string());
    }
    let keyword = req
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string);

    if validate_date_range(&req.check_in_date, &req.check_out_date).is_none() {
        return Ok(SearchOutcome::Invalid("入住日期不能晚于离店日期"));
    }

    // 城市是否有可检索酒店：按地址子串判断，而不是地理编码
    let city_pattern = format!("%{}%", city);
    let city_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM hotels WHERE status = 'APPROVED' AND address LIKE $1",
    )
    .bind(&city_pattern)
    .fetch_one(pool)
    .await?;
    if city_count == 0 {
        return Ok(SearchOutcome::CityNotSupported);
    }

    // 检索范围与公开列表不同：审核通过即可出现在搜索结果里
    let hotels = sqlx::query_as::<_, SearchHotelRow>(
        r#"
        SELECT id, name_cn, name_en, address, star_rating, min_price_cents
        FROM hotels
        WHERE status = 'APPROVED' AND address LIKE $1
        ORDER BY published_at DESC NULLS LAST, updated_at DESC
        "#,
    )
    .bind(&city_pattern)
    .fetch_all(pool)
    .await?;

    if hotels.is_empty() {
        return Ok(SearchOutcome::Results(vec![]));
    }

    let ids: Vec<String> = hotels.iter().map(|h| h.id.clone()).collect();

    let nearby_rows = sqlx::query_as::<_, NearbyNameRow>(
        r#"
        SELECT hotel_id, name
        FROM nearby_places
        WHERE hotel_id = ANY($1)
        ORDER BY distance_meters ASC NULLS LAST, created_at ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let room_rows = sqlx::query_as::<_, RoomMinRow>(
        r#"
        SELECT hotel_id, MIN(base_price_cents) AS min_price
        FROM room_types
        WHERE hotel_id = ANY($1)
        GROUP BY hotel_id
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let discount_rows = sqlx::query_as::<_, DiscountTextRow>(
        r#"
        SELECT hotel_id, title, description, is_active
        FROM discounts
        WHERE hotel_id = ANY($1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let audit_rows = sqlx::query_as::<_, AuditCountRow>(
        r#"
        SELECT hotel_id, COUNT(*) AS count
        FROM audit_logs
        WHERE hotel_id = ANY($1)
        GROUP BY hotel_id
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut nearby_by_hotel: HashMap<String, Vec<String>> = HashMap::new();
    for row in nearby_rows {
        nearby_by_hotel.entry(row.hotel_id).or_default().push(row.name);
    }
    let room_min_by_hotel: HashMap<String, i64> = room_rows
        .into_iter()
        .map(|r| (r.hotel_id, r.min_price))
        .collect();
    let mut discounts_by_hotel: HashMap<String, Vec<DiscountTextRow>> = HashMap::new();
    for row in discount_rows {
        discounts_by_hotel
            .entry(row.hotel_id.clone())
            .or_default()
            .push(row);
    }
    let audit_count_by_hotel: HashMap<String, i64> = audit_rows
        .into_iter()
        .map(|r| (r.hotel_id, r.count))
        .collect();

    let mut list = Vec::new();
    for hotel in hotels {
        let nearby_names = nearby_by_hotel.remove(&hotel.id).unwrap_or_default();
        let discounts = discounts_by_hotel.remove(&hotel.id).unwrap_or_default();

        let candidate = SearchCandidate {
            name_cn: hotel.name_cn.clone(),
            name_en: hotel.name_en.clone(),
            address: hotel.address.clone(),
            nearby_names: nearby_names.clone(),
            discount_texts: discounts
                .iter()
                .map(|d| (d.title.clone(), d.description.clone()))
                .collect(),
        };

        if let Some(ref keyword) = keyword {
            if !keyword_matches(&candidate, keyword) {
                continue;
            }
        }
        if !tags_match(&candidate, &tags) {
            continue;
        }

        let display_nearby: Vec<String> = nearby_names.into_iter().take(8).collect();
        let promo_titles: Vec<String> = discounts
            .iter()
            .filter(|d| d.is_active)
            .map(|d| d.title.clone())
            .take(4)
            .collect();

        list.push(SearchItem {
            hotel_id: hotel.id.clone(),
            hotel_name: hotel.name_cn,
            address: hotel.address,
            cover_image: String::new(),
            tags: merge_display_tags(&display_nearby, &promo_titles),
            min_price: derive_min_price(
                hotel.min_price_cents,
                room_min_by_hotel.get(&hotel.id).copied(),
            ),
            score: hotel.star_rating as f64,
            comment_count: audit_count_by_hotel.get(&hotel.id).copied().unwrap_or(0),
        });
    }

    Ok(SearchOutcome::Results(list))
}

// ---------- 公开列表 / 详情 ----------

#[derive(Debug, Serialize, FromRow)]
pub struct PublicHotelRow {
    pub id: String,
    pub name_cn: String,
    pub name_en: Option<String>,
    pub address: String,
    pub star_rating: i32,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct PublicHotelItem {
    #[serde(flatten)]
    pub hotel: PublicHotelRow,
    pub nearby_places: Vec<NearbyPlace>,
}

/// 公开列表只暴露 PUBLISHED 酒店
pub async fn list_published(
    pool: &PgPool,
    page: i64,
    page_size: i64,
) -> Result<(i64, Vec<PublicHotelItem>), sqlx::Error> {
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM hotels WHERE status = 'PUBLISHED'")
            .fetch_one(pool)
            .await?;

    let rows = sqlx::query_as::<_, PublicHotelRow>(
        r#"
        SELECT id, name_cn, name_en, address, star_rating, min_price_cents, max_price_cents, currency
        FROM hotels
        WHERE status = 'PUBLISHED'
        ORDER BY published_at DESC NULLS LAST
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(page_size)
    .bind((page - 1) * page_size)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok((total, vec![]));
    }

    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let nearby = sqlx::query_as::<_, NearbyPlace>(
        r#"
        SELECT id, hotel_id, type, name, distance_meters, address, created_at
        FROM nearby_places
        WHERE hotel_id = ANY($1)
        ORDER BY type ASC, distance_meters ASC NULLS LAST
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut nearby_by_hotel: HashMap<String, Vec<NearbyPlace>> = HashMap::new();
    for place in nearby {
        nearby_by_hotel
            .entry(place.hotel_id.clone())
            .or_default()
            .push(place);
    }

    let items = rows
        .into_iter()
        .map(|row| {
            let nearby_places = nearby_by_hotel.remove(&row.id).unwrap_or_default();
            PublicHotelItem {
                hotel: row,
                nearby_places,
            }
        })
        .collect();

    Ok((total, items))
}

/// 公开详情：仅 PUBLISHED 可见，带 Redis 旁路缓存
pub async fn find_published_detail(
    pool: &PgPool,
    redis: &Arc<RedisClient>,
    hotel_id: &str,
) -> Result<Option<HotelDetail>, sqlx::Error> {
    let cache_key = format!("{}{}", PUBLIC_HOTEL_CACHE_PREFIX, hotel_id);

    // 尝试从缓存读取
    if let Ok(mut conn) = redis.get_multiplexed_async_connection().await {
        let cached: redis::RedisResult<String> = conn.get(&cache_key).await;
        if let Ok(json_str) = cached {
            if let Ok(detail) = serde_json::from_str::<HotelDetail>(&json_str) {
                tracing::debug!("Get public hotel detail from cache: {}", cache_key);
                return Ok(Some(detail));
            }
        }
    }

    let detail = match Hotel::find_detail(pool, hotel_id).await? {
        Some(d) if d.hotel.status == HotelStatus::Published => d,
        _ => return Ok(None),
    };

    // 缓存结果
    if let Ok(mut conn) = redis.get_multiplexed_async_connection().await {
        if let Ok(json_str) = serde_json::to_string(&detail) {
            let _: Result<(), redis::RedisError> = conn
                .set_ex(&cache_key, json_str, PUBLIC_HOTEL_CACHE_EXPIRE)
                .await;
            tracing::debug!("Set public hotel detail to cache: {}", cache_key);
        }
    }

    Ok(Some(detail))
}

/// 生命周期流转后清掉公开详情缓存，避免下线后仍可见
pub async fn invalidate_detail_cache(redis: &Arc<RedisClient>, hotel_id: &str) {
    if let Ok(mut conn) = redis.get_multiplexed_async_connection().await {
        let cache_key = format!("{}{}", PUBLIC_HOTEL_CACHE_PREFIX, hotel_id);
        let _: Result<(), redis::RedisError> = conn.del(&cache_key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ymd_parsing_is_strict() {
        assert!(parse_ymd("2025-06-15").is_some());
        assert!(parse_ymd(" 2025-06-15 ").is_some());
        assert!(parse_ymd("2025/06/15").is_none());
        assert!(parse_ymd("2025-6-15").is_none());
        assert!(parse_ymd("2025-06-15T00:00:00").is_none());
        // 非法日历日
        assert!(parse_ymd("2025-02-30").is_none());
        assert!(parse_ymd("2025-13-01").is_none());
    }

    #[test]
    fn date_range_requires_strict_order() {
        assert!(validate_date_range("2025-06-15", "2025-06-16").is_some());
        // 同日与倒序都不合法
        assert!(validate_date_range("2025-06-15", "2025-06-15").is_none());
        assert!(validate_date_range("2025-06-16", "2025-06-15").is_none());
        assert!(validate_date_range("bad", "2025-06-16").is_none());
    }

    fn candidate() -> SearchCandidate {
        SearchCandidate {
            name_cn: "山景酒店".to_string(),
            name_en: Some("Mountain View Hotel".to_string()),
            address: "上海市浦东区".to_string(),
            nearby_names: vec!["东方明珠".to_string(), "陆家嘴地铁站".to_string()],
            discount_texts: vec![(
                "周末特惠".to_string(),
                Some("连住两晚八折".to_string()),
            )],
        }
    }

    #[test]
    fn keyword_matches_four_fields() {
        let c = candidate();
        assert!(keyword_matches(&c, "山景"));
        assert!(keyword_matches(&c, "Mountain"));
        assert!(keyword_matches(&c, "浦东"));
        assert!(keyword_matches(&c, "明珠"));
        assert!(!keyword_matches(&c, "周末特惠")); // 优惠不参与关键词匹配
        assert!(!keyword_matches(&c, "mountain")); // 区分大小写
    }

    #[test]
    fn tags_are_anded_each_tag_ored() {
        let c = candidate();
        assert!(tags_match(&c, &["山景".to_string(), "八折".to_string()]));
        assert!(tags_match(&c, &[]));
        assert!(!tags_match(&c, &["山景".to_string(), "温泉".to_string()]));
    }

    #[test]
    fn display_tags_dedup_and_cap() {
        let nearby: Vec<String> = (1..=7).map(|i| format!("地点{}", i)).collect();
        let promos = vec!["地点1".to_string(), "特惠A".to_string(), "特惠B".to_string()];
        let merged = merge_display_tags(&nearby, &promos);
        assert_eq!(merged.len(), 8);
        assert_eq!(merged.iter().filter(|t| *t == "地点1").count(), 1);
        assert_eq!(merged.last().unwrap(), "特惠A");
    }

    #[test]
    fn min_price_fallback_chain() {
        assert_eq!(derive_min_price(Some(50000), Some(39900)), 50000);
        assert_eq!(derive_min_price(None, Some(39900)), 39900);
        assert_eq!(derive_min_price(None, None), 0);
    }
}
