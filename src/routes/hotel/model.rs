use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppError;
use crate::lifecycle::{self, AuditAction, HotelStatus, LifecycleAction, Transition};

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Hotel {
    pub id: String,
    pub merchant_id: String,
    pub name_cn: String,
    pub name_en: Option<String>,
    pub address: String,
    pub star_rating: i32,
    pub open_date: Option<NaiveDate>,
    pub currency: String,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub status: HotelStatus,
    pub reject_reason: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub offline_at: Option<DateTime<Utc>>,
    pub offline_from_status: Option<HotelStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "nearby_place_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NearbyPlaceType {
    Attraction,
    Transport,
    Mall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "discount_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    PercentOff,
    AmountOffCents,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct RoomType {
    pub id: String,
    pub hotel_id: String,
    pub name: String,
    pub bed_type: Option<String>,
    pub capacity: Option<i32>,
    pub area_sqm: Option<f64>,
    pub base_price_cents: i64,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct NearbyPlace {
    pub id: String,
    pub hotel_id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: NearbyPlaceType,
    pub name: String,
    pub distance_meters: Option<i32>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Discount {
    pub id: String,
    pub hotel_id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: DiscountType,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub percent_off: Option<i32>,
    pub amount_off_cents: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Discount {
    /// 当前是否生效：启用且落在可选的生效时间窗内
    pub fn is_effective_now(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date.is_none_or(|s| now >= s)
            && self.end_date.is_none_or(|e| now <= e)
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct AuditLog {
    pub id: String,
    pub hotel_id: String,
    pub operator_id: String,
    pub action: AuditAction,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    /// 审计日志只追加，不修改、不删除
    pub(crate) async fn append(
        tx: &mut Transaction<'_, Postgres>,
        hotel_id: &str,
        operator_id: &str,
        action: AuditAction,
        note: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, hotel_id, operator_id, action, note)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(hotel_id)
        .bind(operator_id)
        .bind(action)
        .bind(note)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn list_for_hotel(pool: &PgPool, hotel_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, hotel_id, operator_id, action, note, created_at
            FROM audit_logs
            WHERE hotel_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(hotel_id)
        .fetch_all(pool)
        .await
    }
}

/// 酒店详情：主体字段 + 全部子表
#[derive(Debug, Serialize, Deserialize)]
pub struct HotelDetail {
    #[serde(flatten)]
    pub hotel: Hotel,
    pub room_types: Vec<RoomType>,
    pub nearby_places: Vec<NearbyPlace>,
    pub discounts: Vec<Discount>,
}

// ---------- 请求结构 ----------

#[derive(Debug, Deserialize)]
pub struct RoomTypeInput {
    pub name: String,
    pub bed_type: Option<String>,
    pub capacity: Option<i32>,
    pub area_sqm: Option<f64>,
    pub base_price_cents: i64,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyPlaceInput {
    #[serde(rename = "type")]
    pub kind: NearbyPlaceType,
    pub name: String,
    pub distance_meters: Option<i32>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiscountInput {
    #[serde(rename = "type")]
    pub kind: DiscountType,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub percent_off: Option<i32>,
    pub amount_off_cents: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct HotelUpsertRequest {
    pub name_cn: String,
    pub name_en: Option<String>,
    pub address: String,
    pub star_rating: i32,
    pub open_date: Option<NaiveDate>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub room_types: Vec<RoomTypeInput>,
    #[serde(default)]
    pub nearby_places: Vec<NearbyPlaceInput>,
    #[serde(default)]
    pub discounts: Vec<DiscountInput>,
}

impl HotelUpsertRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name_cn.trim().is_empty() {
            return Err(AppError::Validation("酒店中文名不能为空".to_string()));
        }
        if self.address.trim().is_empty() {
            return Err(AppError::Validation("酒店地址不能为空".to_string()));
        }
        if !(0..=5).contains(&self.star_rating) {
            return Err(AppError::Validation("星级必须在0到5之间".to_string()));
        }
        for room in &self.room_types {
            if room.name.trim().is_empty() {
                return Err(AppError::Validation("房型名称不能为空".to_string()));
            }
            if room.base_price_cents < 0 {
                return Err(AppError::Validation("房型价格不能为负".to_string()));
            }
        }
        for place in &self.nearby_places {
            if place.name.trim().is_empty() {
                return Err(AppError::Validation("周边地点名称不能为空".to_string()));
            }
            if place.distance_meters.is_some_and(|d| d < 0) {
                return Err(AppError::Validation("周边地点距离不能为负".to_string()));
            }
        }
        for discount in &self.discounts {
            discount.validate()?;
        }
        Ok(())
    }
}

impl DiscountInput {
    /// 优惠类型与取值槽位必须一一对应
    fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("优惠标题不能为空".to_string()));
        }
        match self.kind {
            DiscountType::PercentOff => {
                let percent = self.percent_off.ok_or_else(|| {
                    AppError::Validation("PERCENT_OFF 优惠必须填写折扣值".to_string())
                })?;
                if self.amount_off_cents.is_some() {
                    return Err(AppError::Validation(
                        "PERCENT_OFF 优惠不能同时填写立减金额".to_string(),
                    ));
                }
                if !(1..=100).contains(&percent) {
                    return Err(AppError::Validation("折扣值必须在1到100之间".to_string()));
                }
            }
            DiscountType::AmountOffCents => {
                let amount = self.amount_off_cents.ok_or_else(|| {
                    AppError::Validation("AMOUNT_OFF_CENTS 优惠必须填写立减金额".to_string())
                })?;
                if self.percent_off.is_some() {
                    return Err(AppError::Validation(
                        "AMOUNT_OFF_CENTS 优惠不能同时填写折扣值".to_string(),
                    ));
                }
                if amount < 0 {
                    return Err(AppError::Validation("立减金额不能为负".to_string()));
                }
            }
        }
        Ok(())
    }
}

const HOTEL_COLUMNS: &str = r#"
    id, merchant_id, name_cn, name_en, address, star_rating, open_date, currency,
    min_price_cents, max_price_cents, status, reject_reason, published_at,
    offline_at, offline_from_status, created_at, updated_at
"#;

impl Hotel {
    pub async fn create(
        pool: &PgPool,
        merchant_id: &str,
        req: &HotelUpsertRequest,
    ) -> Result<HotelDetail, AppError> {
        req.validate()?;
        let currency = req.currency.clone().unwrap_or_else(|| "CNY".to_string());

        let mut tx = pool.begin().await?;

        let hotel = sqlx::query_as::<_, Hotel>(&format!(
            r#"
            INSERT INTO hotels (
                id, merchant_id, name_cn, name_en, address, star_rating,
                open_date, currency, min_price_cents, max_price_cents, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'DRAFT')
            RETURNING {HOTEL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(merchant_id)
        .bind(&req.name_cn)
        .bind(&req.name_en)
        .bind(&req.address)
        .bind(req.star_rating)
        .bind(req.open_date)
        .bind(&currency)
        .bind(req.min_price_cents)
        .bind(req.max_price_cents)
        .fetch_one(&mut *tx)
        .await?;

        replace_children(&mut tx, &hotel.id, req, &currency).await?;
        AuditLog::append(&mut tx, &hotel.id, merchant_id, AuditAction::Create, "create draft")
            .await?;
        let (room_types, nearby_places, discounts) = load_children(&mut tx, &hotel.id).await?;

        tx.commit().await?;

        Ok(HotelDetail {
            hotel,
            room_types,
            nearby_places,
            discounts,
        })
    }

    /// 商户编辑：仅 DRAFT/REJECTED 允许，子表全量重建（先删后建），
    /// 与主体更新、审计写入同一事务
    pub async fn update(
        pool: &PgPool,
        hotel_id: &str,
        merchant_id: &str,
        req: &HotelUpsertRequest,
    ) -> Result<(HotelDetail, Transition), AppError> {
        req.validate()?;

        let mut tx = pool.begin().await?;

        let existing = Self::find_for_update(&mut tx, hotel_id)
            .await?
            .ok_or_else(|| AppError::NotFound("酒店不存在".to_string()))?;
        if existing.merchant_id != merchant_id {
            return Err(AppError::Forbidden("无权限".to_string()));
        }
        let t = lifecycle::transition(
            existing.status,
            LifecycleAction::Update,
            existing.offline_from_status,
        )?;

        let currency = req
            .currency
            .clone()
            .unwrap_or_else(|| existing.currency.clone());

        let hotel = sqlx::query_as::<_, Hotel>(&format!(
            r#"
            UPDATE hotels
            SET name_cn = $2, name_en = $3, address = $4, star_rating = $5,
                open_date = $6, currency = $7, min_price_cents = $8,
                max_price_cents = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {HOTEL_COLUMNS}
            "#
        ))
        .bind(hotel_id)
        .bind(&req.name_cn)
        .bind(&req.name_en)
        .bind(&req.address)
        .bind(req.star_rating)
        .bind(req.open_date)
        .bind(&currency)
        .bind(req.min_price_cents)
        .bind(req.max_price_cents)
        .fetch_one(&mut *tx)
        .await?;

        replace_children(&mut tx, hotel_id, req, &currency).await?;
        AuditLog::append(&mut tx, hotel_id, merchant_id, t.audit, "merchant update").await?;
        let (room_types, nearby_places, discounts) = load_children(&mut tx, hotel_id).await?;

        tx.commit().await?;

        Ok((
            HotelDetail {
                hotel,
                room_types,
                nearby_places,
                discounts,
            },
            t,
        ))
    }

    /// 提交审核：状态前置检查在前，完整性门槛在后，整体一个事务
    pub async fn submit(
        pool: &PgPool,
        hotel_id: &str,
        merchant_id: &str,
    ) -> Result<(Hotel, Transition), AppError> {
        let mut tx = pool.begin().await?;

        let hotel = Self::find_for_update(&mut tx, hotel_id)
            .await?
            .ok_or_else(|| AppError::NotFound("酒店不存在".to_string()))?;
        if hotel.merchant_id != merchant_id {
            return Err(AppError::Forbidden("无权限".to_string()));
        }
        let t = lifecycle::transition(
            hotel.status,
            LifecycleAction::Submit,
            hotel.offline_from_status,
        )?;

        let room_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM room_types WHERE hotel_id = $1")
                .bind(hotel_id)
                .fetch_one(&mut *tx)
                .await?;
        lifecycle::validate_submission(&hotel.name_cn, &hotel.address, room_count)?;

        let updated =
            Self::persist_transition(&mut tx, hotel_id, &t, None, merchant_id, "merchant submit")
                .await?;

        tx.commit().await?;

        Ok((updated, t))
    }

    /// 锁定目标行再读，保证并发流转只有先到者能通过前置检查
    pub(crate) async fn find_for_update(
        tx: &mut Transaction<'_, Postgres>,
        hotel_id: &str,
    ) -> Result<Option<Hotel>, sqlx::Error> {
        sqlx::query_as::<_, Hotel>(&format!(
            "SELECT {HOTEL_COLUMNS} FROM hotels WHERE id = $1 FOR UPDATE"
        ))
        .bind(hotel_id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// 把一次 [`Transition`] 的效果落库，并追加对应审计日志
    pub(crate) async fn persist_transition(
        tx: &mut Transaction<'_, Postgres>,
        hotel_id: &str,
        t: &Transition,
        reject_reason: Option<&str>,
        operator_id: &str,
        note: &str,
    ) -> Result<Hotel, AppError> {
        // SET 子句里的列引用读到的都是旧值，offline_from_status 因此能记下下线前状态
        let updated = sqlx::query_as::<_, Hotel>(&format!(
            r#"
            UPDATE hotels
            SET status = $2,
                reject_reason = CASE
                    WHEN $3 THEN $4
                    WHEN $5 THEN NULL
                    ELSE reject_reason
                END,
                published_at = CASE
                    WHEN $6 THEN COALESCE(published_at, NOW())
                    ELSE published_at
                END,
                offline_from_status = CASE
                    WHEN $7 THEN status
                    WHEN $8 THEN NULL
                    ELSE offline_from_status
                END,
                offline_at = CASE
                    WHEN $7 THEN NOW()
                    WHEN $8 THEN NULL
                    ELSE offline_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {HOTEL_COLUMNS}
            "#
        ))
        .bind(hotel_id)
        .bind(t.to)
        .bind(t.sets_reject_reason)
        .bind(reject_reason)
        .bind(t.clears_reject_reason)
        .bind(t.stamps_published_at)
        .bind(t.marks_offline)
        .bind(t.clears_offline)
        .fetch_one(&mut **tx)
        .await?;

        AuditLog::append(tx, hotel_id, operator_id, t.audit, note).await?;

        Ok(updated)
    }

    pub async fn find_detail(
        pool: &PgPool,
        hotel_id: &str,
    ) -> Result<Option<HotelDetail>, sqlx::Error> {
        let hotel = sqlx::query_as::<_, Hotel>(&format!(
            "SELECT {HOTEL_COLUMNS} FROM hotels WHERE id = $1"
        ))
        .bind(hotel_id)
        .fetch_optional(pool)
        .await?;

        let hotel = match hotel {
            Some(h) => h,
            None => return Ok(None),
        };

        let mut conn = pool.acquire().await?;
        let (room_types, nearby_places, discounts) = load_children(&mut conn, hotel_id).await?;

        Ok(Some(HotelDetail {
            hotel,
            room_types,
            nearby_places,
            discounts,
        }))
    }

    pub async fn list(
        pool: &PgPool,
        merchant_id: Option<&str>,
        status: Option<HotelStatus>,
        page: i64,
        page_size: i64,
    ) -> Result<(i64, Vec<Hotel>), sqlx::Error> {
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

        let items = sqlx::query_as::<_, Hotel>(&format!(
            r#"
            SELECT {HOTEL_COLUMNS} FROM hotels
            WHERE ($1 IS NULL OR status = $1) AND ($2 IS NULL OR merchant_id = $2)
            ORDER BY updated_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(status)
        .bind(merchant_id)
        .bind(page_size)
        .bind((page - 1) * page_size)
        .fetch_all(pool)
        .await?;

        Ok((total, items))
    }
}

/// 子表全量重建（先删后建），必须在调用方的事务内执行
async fn replace_children(
    tx: &mut Transaction<'_, Postgres>,
    hotel_id: &str,
    req: &HotelUpsertRequest,
    hotel_currency: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM room_types WHERE hotel_id = $1")
        .bind(hotel_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM nearby_places WHERE hotel_id = $1")
        .bind(hotel_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM discounts WHERE hotel_id = $1")
        .bind(hotel_id)
        .execute(&mut **tx)
        .await?;

    for room in &req.room_types {
        let currency = room.currency.as_deref().unwrap_or(hotel_currency);
        sqlx::query(
            r#"
            INSERT INTO room_types (id, hotel_id, name, bed_type, capacity, area_sqm, base_price_cents, currency)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(hotel_id)
        .bind(&room.name)
        .bind(&room.bed_type)
        .bind(room.capacity)
        .bind(room.area_sqm)
        .bind(room.base_price_cents)
        .bind(currency)
        .execute(&mut **tx)
        .await?;
    }

    for place in &req.nearby_places {
        sqlx::query(
            r#"
            INSERT INTO nearby_places (id, hotel_id, type, name, distance_meters, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(hotel_id)
        .bind(place.kind)
        .bind(&place.name)
        .bind(place.distance_meters)
        .bind(&place.address)
        .execute(&mut **tx)
        .await?;
    }

    for discount in &req.discounts {
        sqlx::query(
            r#"
            INSERT INTO discounts (
                id, hotel_id, type, title, description, start_date, end_date,
                percent_off, amount_off_cents, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(hotel_id)
        .bind(discount.kind)
        .bind(&discount.title)
        .bind(&discount.description)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.percent_off)
        .bind(discount.amount_off_cents)
        .bind(discount.is_active.unwrap_or(true))
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

pub(crate) async fn load_children(
    conn: &mut PgConnection,
    hotel_id: &str,
) -> Result<(Vec<RoomType>, Vec<NearbyPlace>, Vec<Discount>), sqlx::Error> {
    let room_types = sqlx::query_as::<_, RoomType>(
        r#"
        SELECT id, hotel_id, name, bed_type, capacity, area_sqm, base_price_cents, currency
        FROM room_types
        WHERE hotel_id = $1
        ORDER BY base_price_cents ASC
        "#,
    )
    .bind(hotel_id)
    .fetch_all(&mut *conn)
    .await?;

    let nearby_places = sqlx::query_as::<_, NearbyPlace>(
        r#"
        SELECT id, hotel_id, type, name, distance_meters, address, created_at
        FROM nearby_places
        WHERE hotel_id = $1
        ORDER BY type ASC, distance_meters ASC NULLS LAST
        "#,
    )
    .bind(hotel_id)
    .fetch_all(&mut *conn)
    .await?;

    let discounts = sqlx::query_as::<_, Discount>(
        r#"
        SELECT id, hotel_id, type, title, description, start_date, end_date,
               percent_off, amount_off_cents, is_active, created_at
        FROM discounts
        WHERE hotel_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(hotel_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok((room_types, nearby_places, discounts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_request() -> HotelUpsertRequest {
        HotelUpsertRequest {
            name_cn: "山景酒店".to_string(),
            name_en: None,
            address: "上海市浦东区".to_string(),
            star_rating: 4,
            open_date: None,
            min_price_cents: None,
            max_price_cents: None,
            currency: None,
            room_types: vec![RoomTypeInput {
                name: "标准间".to_string(),
                bed_type: None,
                capacity: Some(2),
                area_sqm: None,
                base_price_cents: 39900,
                currency: None,
            }],
            nearby_places: vec![],
            discounts: vec![],
        }
    }

    fn percent_discount() -> DiscountInput {
        DiscountInput {
            kind: DiscountType::PercentOff,
            title: "周末特惠".to_string(),
            description: None,
            start_date: None,
            end_date: None,
            percent_off: Some(80),
            amount_off_cents: None,
            is_active: None,
        }
    }

    #[test]
    fn upsert_request_validation() {
        assert!(base_request().validate().is_ok());

        let mut req = base_request();
        req.name_cn = "  ".to_string();
        assert!(req.validate().is_err());

        let mut req = base_request();
        req.star_rating = 6;
        assert!(req.validate().is_err());

        let mut req = base_request();
        req.room_types[0].base_price_cents = -1;
        assert!(req.validate().is_err());
    }

    #[test]
    fn discount_slots_are_mutually_exclusive() {
        assert!(percent_discount().validate().is_ok());

        let mut d = percent_discount();
        d.amount_off_cents = Some(1000);
        assert!(d.validate().is_err());

        let mut d = percent_discount();
        d.percent_off = None;
        assert!(d.validate().is_err());

        let amount = DiscountInput {
            kind: DiscountType::AmountOffCents,
            title: "立减".to_string(),
            description: None,
            start_date: None,
            end_date: None,
            percent_off: None,
            amount_off_cents: Some(2000),
            is_active: None,
        };
        assert!(amount.validate().is_ok());

        let mut d = amount;
        d.percent_off = Some(50);
        assert!(d.validate().is_err());
    }

    #[test]
    fn discount_effective_window() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let discount = Discount {
            id: "d1".to_string(),
            hotel_id: "h1".to_string(),
            kind: DiscountType::PercentOff,
            title: "周末特惠".to_string(),
            description: None,
            start_date: Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap()),
            percent_off: Some(80),
            amount_off_cents: None,
            is_active: true,
            created_at: now,
        };
        assert!(discount.is_effective_now(now));

        let expired = Discount {
            end_date: Some(Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap()),
            ..discount
        };
        assert!(!expired.is_effective_now(now));

        let disabled = Discount {
            is_active: false,
            end_date: None,
            start_date: None,
            ..expired
        };
        assert!(!disabled.is_effective_now(now));
    }
}
