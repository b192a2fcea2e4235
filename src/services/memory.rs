use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio::sync::RwLock;

use crate::models::{
    ActiveSubscription, BookingRecord, BookingStatus, MatchLedgerEntry, SalonCatalogEntry,
    SubscriptionRecord, SubscriptionStatus,
};

use super::{BookingStore, MatchLedger, SalonCatalog, StoreError, SubscriptionStore};

#[derive(Debug, Clone)]
struct StoredBooking {
    user_id: String,
    salon: Option<SalonCatalogEntry>,
    status: BookingStatus,
    requested_at: DateTime<Utc>,
}

/// Process-local implementation of every store, for tests, benches and
/// running without a database
#[derive(Default)]
pub struct InMemoryStore {
    salons: RwLock<Vec<SalonCatalogEntry>>,
    bookings: RwLock<Vec<StoredBooking>>,
    subscriptions: RwLock<Vec<SubscriptionRecord>>,
    matches: RwLock<HashSet<MatchLedgerEntry>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read and write fail, to simulate an outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".to_string()));
        }
        Ok(())
    }

    /// Insert or replace a salon, keeping catalog order
    pub async fn add_salon(&self, salon: SalonCatalogEntry) {
        let mut salons = self.salons.write().await;
        match salons.iter_mut().find(|s| s.id == salon.id) {
            Some(existing) => *existing = salon,
            None => salons.push(salon),
        }
    }

    pub async fn add_booking(
        &self,
        user_id: &str,
        salon: Option<SalonCatalogEntry>,
        status: BookingStatus,
        requested_at: DateTime<Utc>,
    ) {
        self.bookings.write().await.push(StoredBooking {
            user_id: user_id.to_string(),
            salon,
            status,
            requested_at,
        });
    }

    pub async fn add_subscription(&self, subscription: SubscriptionRecord) {
        self.subscriptions.write().await.push(subscription);
    }

    /// Total ledger entries across all salons and weeks
    pub async fn match_count(&self) -> usize {
        self.matches.read().await.len()
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn find_accepted_bookings(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        self.check_available()?;
        let bookings = self.bookings.read().await;

        let mut accepted: Vec<&StoredBooking> = bookings
            .iter()
            .filter(|b| b.user_id == user_id && b.status == BookingStatus::Accepted)
            .collect();
        accepted.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));

        Ok(accepted
            .into_iter()
            .take(limit)
            .map(|b| BookingRecord {
                salon: b.salon.clone(),
                requested_at: b.requested_at,
            })
            .collect())
    }
}

#[async_trait]
impl SalonCatalog for InMemoryStore {
    async fn all_salons(&self) -> Result<Vec<SalonCatalogEntry>, StoreError> {
        self.check_available()?;
        Ok(self.salons.read().await.clone())
    }

    async fn salon_by_id(&self, salon_id: &str) -> Result<Option<SalonCatalogEntry>, StoreError> {
        self.check_available()?;
        let salons = self.salons.read().await;
        Ok(salons.iter().find(|s| s.id == salon_id).cloned())
    }
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn find_active_subscriptions_with_salon(
        &self,
    ) -> Result<Vec<ActiveSubscription>, StoreError> {
        self.check_available()?;
        let subscriptions = self.subscriptions.read().await;
        let salons = self.salons.read().await;

        Ok(subscriptions
            .iter()
            .filter(|sub| sub.status == SubscriptionStatus::Active)
            .filter_map(|sub| {
                let salon_id = sub.salon_id.as_deref()?;
                let salon = salons.iter().find(|s| s.id == salon_id)?;
                Some(ActiveSubscription {
                    subscription: sub.clone(),
                    salon: salon.clone(),
                })
            })
            .collect())
    }

    async fn find_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        self.check_available()?;
        let subscriptions = self.subscriptions.read().await;
        Ok(subscriptions.iter().find(|s| s.id == subscription_id).cloned())
    }
}

#[async_trait]
impl MatchLedger for InMemoryStore {
    async fn count_matches(
        &self,
        salon_id: &str,
        week_start: NaiveDateTime,
    ) -> Result<u32, StoreError> {
        self.check_available()?;
        let matches = self.matches.read().await;
        Ok(matches
            .iter()
            .filter(|m| m.salon_id == salon_id && m.week_start == week_start)
            .count() as u32)
    }

    async fn find_match(
        &self,
        salon_id: &str,
        user_id: &str,
        week_start: NaiveDateTime,
    ) -> Result<Option<MatchLedgerEntry>, StoreError> {
        self.check_available()?;
        let key = MatchLedgerEntry {
            salon_id: salon_id.to_string(),
            user_id: user_id.to_string(),
            week_start,
        };
        let matches = self.matches.read().await;
        Ok(matches.get(&key).cloned())
    }

    async fn insert_match(&self, entry: &MatchLedgerEntry) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.matches.write().await.insert(entry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn create_salon(id: &str) -> SalonCatalogEntry {
        SalonCatalogEntry {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            salon_name: format!("Salon {}", id),
            salon_image: None,
            location: None,
            price_range: Some(100.0),
            types_of_massages: vec!["Oil massage".to_string()],
            rating: None,
            total_reviews: 0,
        }
    }

    fn week() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_accepted_bookings_newest_first() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store.add_booking("u1", Some(create_salon("old")), BookingStatus::Accepted, now - Duration::days(3)).await;
        store.add_booking("u1", Some(create_salon("new")), BookingStatus::Accepted, now).await;
        store.add_booking("u1", Some(create_salon("pending")), BookingStatus::Pending, now).await;
        store.add_booking("u2", Some(create_salon("other")), BookingStatus::Accepted, now).await;

        let bookings = store.find_accepted_bookings("u1", 50).await.unwrap();
        let ids: Vec<String> = bookings.iter().map(|b| b.salon.as_ref().unwrap().id.clone()).collect();
        assert_eq!(ids, vec!["new", "old"]);

        let limited = store.find_accepted_bookings("u1", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_ledger_unique_key() {
        let store = InMemoryStore::new();
        let entry = MatchLedgerEntry {
            salon_id: "s1".to_string(),
            user_id: "u1".to_string(),
            week_start: week(),
        };

        assert!(store.insert_match(&entry).await.unwrap());
        assert!(!store.insert_match(&entry).await.unwrap());
        assert_eq!(store.count_matches("s1", week()).await.unwrap(), 1);
        assert!(store.find_match("s1", "u1", week()).await.unwrap().is_some());
        assert!(store.find_match("s1", "u2", week()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_subscriptions_need_salon() {
        let store = InMemoryStore::new();
        store.add_salon(create_salon("s1")).await;
        for (id, salon, status) in [
            ("a", Some("s1"), SubscriptionStatus::Active),
            ("b", Some("missing"), SubscriptionStatus::Active),
            ("c", None, SubscriptionStatus::Active),
            ("d", Some("s1"), SubscriptionStatus::Expired),
        ] {
            store
                .add_subscription(SubscriptionRecord {
                    id: id.to_string(),
                    salon_id: salon.map(str::to_string),
                    plan_type: None,
                    status,
                })
                .await;
        }

        let active = store.find_active_subscriptions_with_salon().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].subscription.id, "a");
    }

    #[tokio::test]
    async fn test_outage_switch() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.all_salons().await, Err(StoreError::Unavailable(_))));
        store.set_unavailable(false);
        assert!(store.all_salons().await.unwrap().is_empty());
    }
}
