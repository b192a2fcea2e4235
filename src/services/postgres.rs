use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

use crate::models::{
    parse_price, ActiveSubscription, BookingRecord, BookingStatus, MatchLedgerEntry,
    SalonCatalogEntry, SalonLocation, SubscriptionRecord, SubscriptionStatus,
};

use super::{BookingStore, MatchLedger, SalonCatalog, StoreError, SubscriptionStore};

/// Salon columns needed for scoring and display, prefixed `salon_`
const SALON_COLUMNS: &str = r#"
    s.id AS salon_id,
    s.owner_id AS salon_owner_id,
    s.salon_name AS salon_name,
    s.salon_image AS salon_image,
    s.street_address AS salon_street_address,
    s.city AS salon_city,
    s.province AS salon_province,
    s.country AS salon_country,
    s.latitude AS salon_latitude,
    s.longitude AS salon_longitude,
    s.price_range AS salon_price_range,
    s.types_of_massages AS salon_types_of_massages,
    s.rating AS salon_rating,
    s.total_reviews AS salon_total_reviews
"#;

/// PostgreSQL client backing bookings, salons, subscriptions and the
/// weekly match ledger
///
/// The ledger has a unique key on (salon_id, user_id, week_start) so a
/// duplicate insert from concurrent requests is a no-op rather than a
/// second quota charge.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

/// Build a salon from `SALON_COLUMNS`; `None` when the join found no salon
fn salon_from_row(row: &PgRow) -> Result<Option<SalonCatalogEntry>, StoreError> {
    let Some(id) = row.try_get::<Option<String>, _>("salon_id")? else {
        return Ok(None);
    };

    let raw_price: Option<String> = row.try_get("salon_price_range")?;
    let total_reviews: Option<i32> = row.try_get("salon_total_reviews")?;

    Ok(Some(SalonCatalogEntry {
        id,
        owner_id: row.try_get("salon_owner_id")?,
        salon_name: row.try_get("salon_name")?,
        salon_image: row.try_get("salon_image")?,
        location: Some(SalonLocation {
            street_address: row.try_get("salon_street_address")?,
            city: row.try_get("salon_city")?,
            province: row.try_get("salon_province")?,
            country: row.try_get("salon_country")?,
            latitude: row.try_get("salon_latitude")?,
            longitude: row.try_get("salon_longitude")?,
        }),
        price_range: raw_price.as_deref().and_then(parse_price),
        types_of_massages: row
            .try_get::<Option<Vec<String>>, _>("salon_types_of_massages")?
            .unwrap_or_default(),
        rating: row.try_get("salon_rating")?,
        total_reviews: total_reviews.unwrap_or(0).max(0) as u32,
    }))
}

fn subscription_from_row(row: &PgRow) -> Result<SubscriptionRecord, StoreError> {
    let status: String = row.try_get("status")?;
    let status = SubscriptionStatus::parse(&status)
        .ok_or_else(|| StoreError::Decode(format!("unknown subscription status: {}", status)))?;

    Ok(SubscriptionRecord {
        id: row.try_get("id")?,
        salon_id: row.try_get("subscription_salon_id")?,
        plan_type: row.try_get("plan_type")?,
        status,
    })
}

#[async_trait]
impl BookingStore for PostgresClient {
    async fn find_accepted_bookings(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let query = format!(
            r#"
            SELECT b.requested_at, {}
            FROM bookings b
            LEFT JOIN salons s ON s.id = b.salon_id
            WHERE b.requester_uid = $1 AND b.status = $2
            ORDER BY b.requested_at DESC
            LIMIT $3
            "#,
            SALON_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(BookingStatus::Accepted.as_str())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let bookings = rows
            .iter()
            .map(|row| -> Result<BookingRecord, StoreError> {
                Ok(BookingRecord {
                    salon: salon_from_row(row)?,
                    requested_at: row.try_get::<DateTime<Utc>, _>("requested_at")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("User {} has {} accepted bookings", user_id, bookings.len());

        Ok(bookings)
    }
}

#[async_trait]
impl SalonCatalog for PostgresClient {
    async fn all_salons(&self) -> Result<Vec<SalonCatalogEntry>, StoreError> {
        let query = format!("SELECT {} FROM salons s ORDER BY s.created_at, s.id", SALON_COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut salons = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(salon) = salon_from_row(row)? {
                salons.push(salon);
            }
        }

        Ok(salons)
    }

    async fn salon_by_id(&self, salon_id: &str) -> Result<Option<SalonCatalogEntry>, StoreError> {
        let query = format!("SELECT {} FROM salons s WHERE s.id = $1", SALON_COLUMNS);
        let row = sqlx::query(&query)
            .bind(salon_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => salon_from_row(&row),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SubscriptionStore for PostgresClient {
    async fn find_active_subscriptions_with_salon(
        &self,
    ) -> Result<Vec<ActiveSubscription>, StoreError> {
        let query = format!(
            r#"
            SELECT sub.id, sub.salon_id AS subscription_salon_id, sub.plan_type, sub.status, {}
            FROM subscriptions sub
            JOIN salons s ON s.id = sub.salon_id
            WHERE sub.status = $1
            ORDER BY sub.created_at, sub.id
            "#,
            SALON_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(SubscriptionStatus::Active.as_str())
            .fetch_all(&self.pool)
            .await?;

        let mut active = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(salon) = salon_from_row(row)? {
                active.push(ActiveSubscription {
                    subscription: subscription_from_row(row)?,
                    salon,
                });
            }
        }

        Ok(active)
    }

    async fn find_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let query = r#"
            SELECT id, salon_id AS subscription_salon_id, plan_type, status
            FROM subscriptions
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(subscription_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(subscription_from_row).transpose()
    }
}

#[async_trait]
impl MatchLedger for PostgresClient {
    async fn count_matches(
        &self,
        salon_id: &str,
        week_start: NaiveDateTime,
    ) -> Result<u32, StoreError> {
        let query = r#"
            SELECT COUNT(*) AS matches
            FROM recommendation_matches
            WHERE salon_id = $1 AND week_start = $2
        "#;

        let row = sqlx::query(query)
            .bind(salon_id)
            .bind(week_start)
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.try_get("matches")?;
        Ok(count.max(0) as u32)
    }

    async fn find_match(
        &self,
        salon_id: &str,
        user_id: &str,
        week_start: NaiveDateTime,
    ) -> Result<Option<MatchLedgerEntry>, StoreError> {
        let query = r#"
            SELECT salon_id, user_id, week_start
            FROM recommendation_matches
            WHERE salon_id = $1 AND user_id = $2 AND week_start = $3
        "#;

        let row = sqlx::query(query)
            .bind(salon_id)
            .bind(user_id)
            .bind(week_start)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<MatchLedgerEntry, StoreError> {
            Ok(MatchLedgerEntry {
                salon_id: row.try_get("salon_id")?,
                user_id: row.try_get("user_id")?,
                week_start: row.try_get("week_start")?,
            })
        })
        .transpose()
    }

    /// Uses INSERT ... ON CONFLICT DO NOTHING so a duplicate key is reported
    /// as `false` instead of an error.
    async fn insert_match(&self, entry: &MatchLedgerEntry) -> Result<bool, StoreError> {
        let query = r#"
            INSERT INTO recommendation_matches (id, salon_id, user_id, week_start, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (salon_id, user_id, week_start) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(uuid::Uuid::new_v4())
            .bind(&entry.salon_id)
            .bind(&entry.user_id)
            .bind(entry.week_start)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
