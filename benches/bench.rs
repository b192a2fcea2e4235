// Criterion benchmarks for Salon Match

use std::sync::Arc;

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use salon_match::core::{
    distance::haversine_distance, preferences::analyze_history, scoring::calculate_relevance_score,
    RecommendationSources, Recommender,
};
use salon_match::models::{
    BookingRecord, BookingStatus, GeoPoint, SalonCatalogEntry, SalonLocation, ScoringWeights,
    SubscriptionRecord, SubscriptionStatus,
};
use salon_match::services::InMemoryStore;

const SERVICES: [&str; 4] = ["Oil massage", "Thai massage", "Foot massage", "Aromatherapy"];

fn create_salon(id: usize, lat: f64, lon: f64) -> SalonCatalogEntry {
    SalonCatalogEntry {
        id: format!("salon-{:05}", id),
        owner_id: format!("owner-{}", id),
        salon_name: format!("Salon {}", id),
        salon_image: None,
        location: Some(SalonLocation {
            latitude: Some(lat),
            longitude: Some(lon),
            ..Default::default()
        }),
        price_range: Some(100.0 + (id % 20) as f64 * 25.0),
        types_of_massages: vec![SERVICES[id % SERVICES.len()].to_string()],
        rating: Some(3.0 + (id % 5) as f64 * 0.5),
        total_reviews: (id % 50) as u32,
    }
}

fn create_catalog(count: usize) -> Vec<SalonCatalogEntry> {
    (0..count)
        .map(|i| {
            let lat_offset = (i as f64 * 0.001) % 0.5;
            let lon_offset = (i as f64 * 0.001) % 0.5;
            create_salon(i, 13.7563 + lat_offset, 100.5018 + lon_offset)
        })
        .collect()
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(13.7563),
                black_box(100.5018),
                black_box(13.7370),
                black_box(100.5603),
            )
        });
    });
}

fn bench_relevance_scoring(c: &mut Criterion) {
    let catalog = create_catalog(100);
    let history: Vec<BookingRecord> = catalog
        .iter()
        .take(10)
        .map(|salon| BookingRecord {
            salon: Some(salon.clone()),
            requested_at: chrono::Utc::now(),
        })
        .collect();
    let preferences = analyze_history(&history);
    let here = GeoPoint::new(13.7563, 100.5018);
    let weights = ScoringWeights::default();

    c.bench_function("relevance_scoring_100_salons", |b| {
        b.iter(|| {
            let scores: Vec<f64> = catalog
                .iter()
                .map(|salon| calculate_relevance_score(salon, &preferences, Some(&here), &weights))
                .collect();
            black_box(scores)
        });
    });
}

fn bench_recommendations(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
    let mut group = c.benchmark_group("recommendations");

    for salon_count in [10, 100, 1000].iter() {
        let store = Arc::new(InMemoryStore::new());
        tokio_test::block_on(async {
            let catalog = create_catalog(*salon_count);
            for (i, salon) in catalog.iter().enumerate() {
                if i % 10 == 0 {
                    store
                        .add_subscription(SubscriptionRecord {
                            id: format!("sub-{}", i),
                            salon_id: Some(salon.id.clone()),
                            plan_type: Some("Premium".to_string()),
                            status: SubscriptionStatus::Active,
                        })
                        .await;
                }
                if i < 5 {
                    store
                        .add_booking("bench-user", Some(salon.clone()), BookingStatus::Accepted, chrono::Utc::now())
                        .await;
                }
            }
            for salon in catalog {
                store.add_salon(salon).await;
            }
        });

        let recommender = Recommender::with_default_weights(RecommendationSources::from_store(store));
        let here = GeoPoint::new(13.7563, 100.5018);
        let now = NaiveDate::from_ymd_opt(2026, 10, 21)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .expect("valid date");

        group.bench_with_input(
            BenchmarkId::new("get_recommendations", salon_count),
            salon_count,
            |b, _| {
                b.iter(|| {
                    runtime.block_on(recommender.get_recommendations_at(
                        black_box("bench-user"),
                        black_box(Some(here)),
                        black_box(20),
                        now,
                    ))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_relevance_scoring,
    bench_recommendations
);

criterion_main!(benches);
