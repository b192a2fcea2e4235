use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};

use crate::models::MatchLedgerEntry;
use crate::services::{MatchLedger, StoreError, SubscriptionStore};

/// Boosted matches a subscribed salon may receive per week, across all users
pub const WEEKLY_MATCH_QUOTA: u32 = 10;

/// Monday 00:00:00 of the week containing `now` (Sunday belongs to the
/// week that started six days earlier)
pub fn week_start(now: NaiveDateTime) -> NaiveDateTime {
    let date = now.date();
    let days_since_monday = date.weekday().num_days_from_monday() as i64;
    (date - Duration::days(days_since_monday)).and_time(NaiveTime::MIN)
}

/// Result of trying to record a boosted match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A new ledger entry was written; `count` includes it
    Recorded { count: u32 },
    /// The user already consumed this salon's quota this week
    AlreadyRecorded { count: u32 },
    /// The salon has no quota left this week
    QuotaExhausted { count: u32 },
}

impl MatchOutcome {
    /// Weekly count after the attempt
    pub fn count(&self) -> u32 {
        match *self {
            MatchOutcome::Recorded { count }
            | MatchOutcome::AlreadyRecorded { count }
            | MatchOutcome::QuotaExhausted { count } => count,
        }
    }
}

/// Weekly quota bookkeeping over the match ledger
#[derive(Clone)]
pub struct QuotaTracker {
    subscriptions: Arc<dyn SubscriptionStore>,
    ledger: Arc<dyn MatchLedger>,
    quota: u32,
}

impl QuotaTracker {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, ledger: Arc<dyn MatchLedger>) -> Self {
        Self {
            subscriptions,
            ledger,
            quota: WEEKLY_MATCH_QUOTA,
        }
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Matches consumed this week by the salon behind a subscription.
    ///
    /// Unknown, inactive or unlinked subscriptions count as zero.
    pub async fn weekly_match_count(
        &self,
        subscription_id: &str,
        week_start: NaiveDateTime,
    ) -> Result<u32, StoreError> {
        let subscription = match self.subscriptions.find_subscription(subscription_id).await? {
            Some(sub) if sub.is_boostable() => sub,
            _ => return Ok(0),
        };

        match subscription.salon_id {
            Some(salon_id) => self.ledger.count_matches(&salon_id, week_start).await,
            None => Ok(0),
        }
    }

    /// Matches remaining for a salon this week
    pub fn remaining(&self, count: u32) -> u32 {
        self.quota.saturating_sub(count)
    }

    /// Record that `salon_id` was surfaced to `user_id` with a boost.
    ///
    /// Idempotent per (salon, user, week). The count is re-read right before
    /// the insert, and a unique-key conflict from a concurrent request is
    /// reported as `AlreadyRecorded`.
    pub async fn record_match(
        &self,
        salon_id: &str,
        user_id: &str,
        week_start: NaiveDateTime,
    ) -> Result<MatchOutcome, StoreError> {
        let existing = self.ledger.find_match(salon_id, user_id, week_start).await?;
        let count = self.ledger.count_matches(salon_id, week_start).await?;

        if existing.is_some() {
            return Ok(MatchOutcome::AlreadyRecorded { count });
        }
        if count >= self.quota {
            return Ok(MatchOutcome::QuotaExhausted { count });
        }

        let entry = MatchLedgerEntry {
            salon_id: salon_id.to_string(),
            user_id: user_id.to_string(),
            week_start,
        };

        if self.ledger.insert_match(&entry).await? {
            tracing::debug!(
                "Recorded match: salon {} -> user {} (week {}, count {})",
                salon_id,
                user_id,
                week_start,
                count + 1
            );
            Ok(MatchOutcome::Recorded { count: count + 1 })
        } else {
            tracing::warn!(
                "Concurrent match insert for salon {} and user {} treated as already recorded",
                salon_id,
                user_id
            );
            let count = self.ledger.count_matches(salon_id, week_start).await?;
            Ok(MatchOutcome::AlreadyRecorded { count })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SubscriptionRecord, SubscriptionStatus};
    use crate::services::InMemoryStore;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 30, 0)
            .unwrap()
    }

    fn monday() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn create_tracker(store: &Arc<InMemoryStore>) -> QuotaTracker {
        QuotaTracker::new(store.clone(), store.clone())
    }

    #[test]
    fn test_week_start() {
        // 2026-10-19 is a Monday
        assert_eq!(week_start(at(2026, 10, 19, 0)), monday());
        assert_eq!(week_start(at(2026, 10, 21, 15)), monday());
        assert_eq!(week_start(at(2026, 10, 24, 23)), monday());
        // Sunday belongs to the preceding Monday
        assert_eq!(week_start(at(2026, 10, 25, 12)), monday());
        // Next Monday starts a new week
        assert_eq!(week_start(at(2026, 10, 26, 1)), monday() + Duration::days(7));
    }

    #[tokio::test]
    async fn test_record_match_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let tracker = create_tracker(&store);

        let first = tracker.record_match("s1", "u1", monday()).await.unwrap();
        assert_eq!(first, MatchOutcome::Recorded { count: 1 });

        for _ in 0..3 {
            let again = tracker.record_match("s1", "u1", monday()).await.unwrap();
            assert_eq!(again, MatchOutcome::AlreadyRecorded { count: 1 });
        }
    }

    #[tokio::test]
    async fn test_quota_caps_distinct_users() {
        let store = Arc::new(InMemoryStore::new());
        let tracker = create_tracker(&store);

        for i in 0..WEEKLY_MATCH_QUOTA {
            let outcome = tracker
                .record_match("s1", &format!("user-{}", i), monday())
                .await
                .unwrap();
            assert_eq!(outcome, MatchOutcome::Recorded { count: i + 1 });
        }

        let over = tracker.record_match("s1", "late-user", monday()).await.unwrap();
        assert_eq!(over, MatchOutcome::QuotaExhausted { count: WEEKLY_MATCH_QUOTA });

        // A new week has a fresh quota
        let next_week = monday() + Duration::days(7);
        let fresh = tracker.record_match("s1", "late-user", next_week).await.unwrap();
        assert_eq!(fresh, MatchOutcome::Recorded { count: 1 });
    }

    #[tokio::test]
    async fn test_weekly_match_count_resolves_subscription() {
        let store = Arc::new(InMemoryStore::new());
        store
            .add_subscription(SubscriptionRecord {
                id: "sub1".to_string(),
                salon_id: Some("s1".to_string()),
                plan_type: Some("Basic".to_string()),
                status: SubscriptionStatus::Active,
            })
            .await;
        store
            .add_subscription(SubscriptionRecord {
                id: "sub2".to_string(),
                salon_id: Some("s1".to_string()),
                plan_type: None,
                status: SubscriptionStatus::Cancelled,
            })
            .await;

        let tracker = create_tracker(&store);
        tracker.record_match("s1", "u1", monday()).await.unwrap();
        tracker.record_match("s1", "u2", monday()).await.unwrap();

        assert_eq!(tracker.weekly_match_count("sub1", monday()).await.unwrap(), 2);
        assert_eq!(tracker.weekly_match_count("sub2", monday()).await.unwrap(), 0);
        assert_eq!(tracker.weekly_match_count("missing", monday()).await.unwrap(), 0);
    }

    #[test]
    fn test_outcome_count() {
        assert_eq!(MatchOutcome::Recorded { count: 3 }.count(), 3);
        assert_eq!(MatchOutcome::QuotaExhausted { count: 10 }.count(), 10);
    }
}
