use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;

use crate::core::{
    filters::CustomFilter,
    preferences::{analyze_history, HISTORY_LIMIT},
    quota::{week_start, QuotaTracker},
    reasons::generate_reasons,
    scoring::calculate_relevance_score,
};
use crate::models::{
    BoostSettings, GeoPoint, Recommendation, RecommendedSalon, SalonCatalogEntry, ScoringWeights,
    SubscriptionSnapshot, UserPreferenceProfile,
};
use crate::services::{BookingStore, MatchLedger, SalonCatalog, StoreError, SubscriptionStore};

/// Default number of recommendations returned
pub const DEFAULT_LIMIT: usize = 20;

/// Errors surfaced to callers of the recommender
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("Recommendation source unavailable ({what}): {error}")]
    SourceUnavailable {
        what: &'static str,
        #[source]
        error: StoreError,
    },
}

fn unavailable(what: &'static str) -> impl FnOnce(StoreError) -> RecommendationError {
    move |error| RecommendationError::SourceUnavailable { what, error }
}

/// Storage collaborators the recommender reads from and writes to
#[derive(Clone)]
pub struct RecommendationSources {
    pub bookings: Arc<dyn BookingStore>,
    pub catalog: Arc<dyn SalonCatalog>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub ledger: Arc<dyn MatchLedger>,
}

impl RecommendationSources {
    /// Use one backend for every collaborator
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: BookingStore + SalonCatalog + SubscriptionStore + MatchLedger + 'static,
    {
        Self {
            bookings: store.clone(),
            catalog: store.clone(),
            subscriptions: store.clone(),
            ledger: store,
        }
    }
}

/// Subscribed salon with quota left this week
#[derive(Debug, Clone)]
struct PoolEntry {
    salon: SalonCatalogEntry,
    snapshot: SubscriptionSnapshot,
}

#[derive(Debug)]
struct ScoredCandidate {
    salon: SalonCatalogEntry,
    score: f64,
    subscription: Option<SubscriptionSnapshot>,
}

/// Main recommendation orchestrator
///
/// # Pipeline Stages
/// 1. Preference analysis over accepted bookings
/// 2. Boost pool of subscribed salons with weekly quota left
/// 3. Catalog merge, scoring and boosts
/// 4. Ranking, limit and match ledger bookkeeping
#[derive(Clone)]
pub struct Recommender {
    sources: RecommendationSources,
    quota: QuotaTracker,
    weights: ScoringWeights,
    boosts: BoostSettings,
}

impl Recommender {
    pub fn new(sources: RecommendationSources, weights: ScoringWeights, boosts: BoostSettings) -> Self {
        let quota = QuotaTracker::new(sources.subscriptions.clone(), sources.ledger.clone());
        Self {
            sources,
            quota,
            weights,
            boosts,
        }
    }

    pub fn with_default_weights(sources: RecommendationSources) -> Self {
        Self::new(sources, ScoringWeights::default(), BoostSettings::default())
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Ranked recommendations for a user, using the local clock for the
    /// quota week
    pub async fn get_recommendations(
        &self,
        user_id: &str,
        live_location: Option<GeoPoint>,
        limit: usize,
    ) -> Result<Vec<Recommendation>, RecommendationError> {
        self.get_recommendations_at(user_id, live_location, limit, Local::now().naive_local())
            .await
    }

    /// Same as [`Recommender::get_recommendations`] with an explicit clock
    pub async fn get_recommendations_at(
        &self,
        user_id: &str,
        live_location: Option<GeoPoint>,
        limit: usize,
        now: NaiveDateTime,
    ) -> Result<Vec<Recommendation>, RecommendationError> {
        self.recommend(user_id, live_location, limit, &CustomFilter::default(), now)
            .await
    }

    /// Ranked recommendations narrowed by explicit client criteria.
    ///
    /// Filtering happens before the limit is applied, so quota is only
    /// consumed by salons that are actually returned.
    pub async fn get_custom_recommendations(
        &self,
        user_id: &str,
        live_location: Option<GeoPoint>,
        limit: usize,
        filter: &CustomFilter,
    ) -> Result<Vec<Recommendation>, RecommendationError> {
        self.recommend(user_id, live_location, limit, filter, Local::now().naive_local())
            .await
    }

    /// Preference profile derived from the user's accepted bookings
    pub async fn analyze_user_preferences(
        &self,
        user_id: &str,
    ) -> Result<UserPreferenceProfile, RecommendationError> {
        let bookings = self
            .sources
            .bookings
            .find_accepted_bookings(user_id, HISTORY_LIMIT)
            .await
            .map_err(unavailable("booking history"))?;

        tracing::debug!("User {} has {} accepted bookings on file", user_id, bookings.len());

        Ok(analyze_history(&bookings))
    }

    async fn recommend(
        &self,
        user_id: &str,
        live_location: Option<GeoPoint>,
        limit: usize,
        filter: &CustomFilter,
        now: NaiveDateTime,
    ) -> Result<Vec<Recommendation>, RecommendationError> {
        let week = week_start(now);
        let live_location = live_location.filter(GeoPoint::is_valid);

        let (preferences, pool, catalog) = tokio::try_join!(
            self.analyze_user_preferences(user_id),
            self.boost_pool(week),
            async {
                self.sources
                    .catalog
                    .all_salons()
                    .await
                    .map_err(unavailable("salon catalog"))
            },
        )?;

        let total_candidates = catalog.len();
        let pool_size = pool.len();

        let mut scored = self.score_candidates(pool, catalog, &preferences, live_location.as_ref(), filter);

        // Sort by score (descending) and then by salon id (ascending)
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.salon.id.cmp(&b.salon.id))
        });
        scored.truncate(limit);

        // Quota is consumed only by boosted salons that made the cut. A failed
        // write leaves that salon's snapshot at its pre-write count.
        for candidate in scored.iter_mut() {
            let Some(snapshot) = candidate.subscription.as_mut() else {
                continue;
            };

            match self.quota.record_match(&candidate.salon.id, user_id, week).await {
                Ok(outcome) => {
                    snapshot.weekly_match_count = outcome.count();
                    snapshot.remaining_matches = self.quota.remaining(outcome.count());
                }
                Err(e) => tracing::warn!(
                    "Failed to record match of salon {} for user {}: {}",
                    candidate.salon.id,
                    user_id,
                    e
                ),
            }
        }

        let recommendations: Vec<Recommendation> = scored
            .into_iter()
            .map(|candidate| Recommendation {
                reasons: generate_reasons(&candidate.salon, &preferences),
                salon: RecommendedSalon::from_entry(&candidate.salon, candidate.subscription.is_some()),
                score: candidate.score,
                subscription: candidate.subscription,
            })
            .collect();

        tracing::info!(
            "Returning {} recommendations for user {} (from {} catalog salons, {} in boost pool)",
            recommendations.len(),
            user_id,
            total_candidates,
            pool_size
        );

        Ok(recommendations)
    }

    /// Subscribed salons that still have weekly quota, first subscription per
    /// salon wins
    async fn boost_pool(&self, week: NaiveDateTime) -> Result<Vec<PoolEntry>, RecommendationError> {
        let subscriptions = self
            .sources
            .subscriptions
            .find_active_subscriptions_with_salon()
            .await
            .map_err(unavailable("subscriptions"))?;

        let mut seen = HashSet::new();
        let mut pool = Vec::new();

        for active in subscriptions {
            if !active.subscription.is_boostable() || !seen.insert(active.salon.id.clone()) {
                continue;
            }

            let weekly_match_count = self
                .quota
                .weekly_match_count(&active.subscription.id, week)
                .await
                .map_err(unavailable("match ledger"))?;
            let remaining_matches = self.quota.remaining(weekly_match_count);

            if remaining_matches == 0 {
                tracing::debug!(
                    "Salon {} exhausted its weekly quota ({} matches)",
                    active.salon.id,
                    weekly_match_count
                );
                continue;
            }

            pool.push(PoolEntry {
                snapshot: SubscriptionSnapshot {
                    subscription_id: active.subscription.id,
                    plan_type: active.subscription.plan_type,
                    weekly_match_count,
                    remaining_matches,
                },
                salon: active.salon,
            });
        }

        Ok(pool)
    }

    /// Merge pool and catalog (pool first, each salon once) and score them
    fn score_candidates(
        &self,
        pool: Vec<PoolEntry>,
        catalog: Vec<SalonCatalogEntry>,
        preferences: &UserPreferenceProfile,
        live_location: Option<&GeoPoint>,
        filter: &CustomFilter,
    ) -> Vec<ScoredCandidate> {
        let mut seen: HashSet<String> = pool.iter().map(|entry| entry.salon.id.clone()).collect();

        let boosted = pool
            .into_iter()
            .map(|entry| (entry.salon, Some(entry.snapshot)));
        let organic = catalog
            .into_iter()
            .filter(|salon| seen.insert(salon.id.clone()))
            .map(|salon| (salon, None));

        boosted
            .chain(organic)
            .filter(|(salon, _)| filter.matches(&salon.types_of_massages, salon.price_range))
            .map(|(salon, subscription)| {
                let mut score =
                    calculate_relevance_score(&salon, preferences, live_location, &self.weights);

                if subscription.as_ref().is_some_and(|s| s.remaining_matches > 0) {
                    score += self.boosts.subscription;
                }
                if preferences.is_frequent(&salon.id) {
                    score += self.boosts.frequent_salon;
                }

                ScoredCandidate {
                    salon,
                    score,
                    subscription,
                }
            })
            .collect()
    }
}
