// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::{
    ActiveSubscription, BookingRecord, MatchLedgerEntry, SalonCatalogEntry, SubscriptionRecord,
};

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats, CachedCatalog};
pub use memory::InMemoryStore;
pub use postgres::PostgresClient;

/// Errors raised by storage collaborators
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to booking history
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Accepted bookings of a user, newest first, each with its salon snapshot
    async fn find_accepted_bookings(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<BookingRecord>, StoreError>;
}

/// Read access to the salon catalog
#[async_trait]
pub trait SalonCatalog: Send + Sync {
    async fn all_salons(&self) -> Result<Vec<SalonCatalogEntry>, StoreError>;

    async fn salon_by_id(&self, salon_id: &str) -> Result<Option<SalonCatalogEntry>, StoreError>;
}

/// Read access to salon subscriptions
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Active subscriptions joined with their linked salon; unlinked ones are skipped
    async fn find_active_subscriptions_with_salon(
        &self,
    ) -> Result<Vec<ActiveSubscription>, StoreError>;

    async fn find_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, StoreError>;
}

/// Weekly match ledger keyed by (salon, user, week start)
#[async_trait]
pub trait MatchLedger: Send + Sync {
    async fn count_matches(
        &self,
        salon_id: &str,
        week_start: NaiveDateTime,
    ) -> Result<u32, StoreError>;

    async fn find_match(
        &self,
        salon_id: &str,
        user_id: &str,
        week_start: NaiveDateTime,
    ) -> Result<Option<MatchLedgerEntry>, StoreError>;

    /// Insert an entry. Returns `false` when the key already exists.
    async fn insert_match(&self, entry: &MatchLedgerEntry) -> Result<bool, StoreError>;
}
