use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::config::RecommendationSettings;
use crate::core::reasons::REASON_PREVIOUSLY_VISITED;
use crate::core::{CustomFilter, RecommendationError, Recommender};
use crate::models::{
    CustomRecommendationRequest, ErrorResponse, GeoPoint, HealthResponse, Recommendation,
    RecommendationQuery, RecommendationsResponse,
};
use crate::services::PostgresClient;

const MESSAGE_NO_SALONS: &str = "No salons available at the moment";
const MESSAGE_NO_HISTORY: &str =
    "Personalized recommendations will appear after your first accepted booking";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub recommender: Recommender,
    /// Present when the stores are backed by PostgreSQL; used by health checks
    pub postgres: Option<Arc<PostgresClient>>,
    pub limits: RecommendationSettings,
}

/// Configure all recommendation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/recommendations/{user_id}", web::get().to(get_recommendations))
        .route("/recommendations/{user_id}/custom", web::post().to(custom_recommendations));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match &state.postgres {
        Some(postgres) => postgres.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Ranked recommendations for a user
///
/// GET /api/v1/recommendations/{user_id}?limit=20&latitude=13.75&longitude=100.50
async fn get_recommendations(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    query: web::Query<RecommendationQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        tracing::info!("Validation failed for recommendations query: {:?}", errors);
        return bad_request(errors.to_string());
    }
    if let Err(response) = check_request(&user_id, query.location()) {
        return response;
    }

    let limit = state.limits.effective_limit(query.limit);
    tracing::info!("Recommending salons for user: {}, limit: {}", user_id, limit);

    let result = state
        .recommender
        .get_recommendations(&user_id, query.location(), limit)
        .await;

    respond(&user_id, result, true)
}

/// Recommendations narrowed by client-supplied services and price bounds
///
/// POST /api/v1/recommendations/{user_id}/custom
///
/// Request body:
/// ```json
/// {
///   "limit": 10,
///   "latitude": 13.75,
///   "longitude": 100.50,
///   "preferredServices": ["Oil massage"],
///   "priceRange": { "min": 100, "max": 500 }
/// }
/// ```
async fn custom_recommendations(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
    req: web::Json<CustomRecommendationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for custom recommendations request: {:?}", errors);
        return bad_request(errors.to_string());
    }
    if let Err(response) = check_request(&user_id, req.location()) {
        return response;
    }

    let limit = state.limits.effective_limit(req.limit);
    let req = req.into_inner();
    let location = req.location();
    let filter = CustomFilter {
        preferred_services: req.preferred_services,
        price_range: req.price_range,
    };

    tracing::info!(
        "Custom recommendations for user: {}, limit: {}, filtered: {}",
        user_id,
        limit,
        !filter.is_empty()
    );

    let result = state
        .recommender
        .get_custom_recommendations(&user_id, location, limit, &filter)
        .await;

    respond(&user_id, result, false)
}

fn check_request(user_id: &str, location: Option<GeoPoint>) -> Result<(), HttpResponse> {
    if user_id.trim().is_empty() {
        return Err(bad_request("userId must not be empty".to_string()));
    }
    if location.is_some_and(|point| !point.is_valid()) {
        return Err(bad_request(
            "latitude must be within [-90, 90] and longitude within [-180, 180]".to_string(),
        ));
    }
    Ok(())
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message,
        status_code: 400,
    })
}

/// Success body; the custom endpoint omits the informational message
fn respond(
    user_id: &str,
    result: Result<Vec<Recommendation>, RecommendationError>,
    with_message: bool,
) -> HttpResponse {
    match result {
        Ok(recommendations) => HttpResponse::Ok().json(RecommendationsResponse {
            success: true,
            count: recommendations.len(),
            message: with_message
                .then(|| response_message(&recommendations))
                .flatten()
                .map(str::to_string),
            recommendations,
        }),
        Err(e) => {
            tracing::error!("Failed to get recommendations for {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to get recommendations".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Informational copy for empty or not yet personalized results
fn response_message(recommendations: &[Recommendation]) -> Option<&'static str> {
    if recommendations.is_empty() {
        return Some(MESSAGE_NO_SALONS);
    }

    let personalized = recommendations
        .iter()
        .any(|r| r.reasons.iter().any(|reason| reason == REASON_PREVIOUSLY_VISITED));

    if personalized {
        None
    } else {
        Some(MESSAGE_NO_HISTORY)
    }
}
