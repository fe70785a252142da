use actix_web::{error, http::StatusCode, web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::auth::{AuthUser, JwtVerifier};
use crate::config::MatchingSettings;
use crate::core::{MatchEngine, MatchError};
use crate::models::{
    Coordinate, ErrorResponse, HealthResponse, MatchesResponse, PotentialMatchesQuery,
    PotentialMatchesResponse, UpdateLocationRequest, UpdatePresenceRequest, UserId,
};
use crate::services::PostgresStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: MatchEngine,
    pub verifier: JwtVerifier,
    pub matching: MatchingSettings,
    /// Present when running against PostgreSQL; used by the health check
    pub postgres: Option<Arc<PostgresStore>>,
}

impl error::ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::InvalidActor(_) => StatusCode::BAD_REQUEST,
            MatchError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error = match self {
            MatchError::InvalidActor(_) => "invalid_actor",
            MatchError::NotFound(_) => "not_found",
            MatchError::Persistence(_) => "persistence_failure",
        };

        if let MatchError::Persistence(e) = self {
            tracing::error!("Persistence failure: {}", e);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: error.to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/potential-matches", web::get().to(potential_matches))
        .route("/like/{user_id}", web::post().to(like_user))
        .route("/pass/{user_id}", web::post().to(pass_user))
        .route("/matches", web::get().to(get_matches))
        .route("/location", web::post().to(update_location))
        .route("/presence", web::post().to(update_presence));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = match &state.postgres {
        Some(pg) => pg.health_check().await.unwrap_or(false),
        None => true,
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /api/v1/potential-matches?limit=20
async fn potential_matches(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<PotentialMatchesQuery>,
) -> Result<HttpResponse, MatchError> {
    if let Err(errors) = query.validate() {
        return Ok(validation_failed(errors));
    }

    let limit = state.matching.effective_limit(query.limit);
    let candidates = state.engine.potential_matches(user.user_id, limit).await?;

    Ok(HttpResponse::Ok().json(PotentialMatchesResponse {
        count: candidates.len(),
        candidates,
    }))
}

/// POST /api/v1/like/{user_id}
///
/// Response: `{ "matched": true, "matchId": "..." }` or `{ "matched": false }`
async fn like_user(
    state: web::Data<AppState>,
    user: AuthUser,
    target: web::Path<UserId>,
) -> Result<HttpResponse, MatchError> {
    let outcome = state.engine.like_user(user.user_id, target.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/v1/pass/{user_id}
async fn pass_user(
    state: web::Data<AppState>,
    user: AuthUser,
    target: web::Path<UserId>,
) -> Result<HttpResponse, MatchError> {
    let outcome = state.engine.pass_user(user.user_id, target.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// GET /api/v1/matches
async fn get_matches(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, MatchError> {
    let matches = state.engine.matches_for(user.user_id).await?;
    Ok(HttpResponse::Ok().json(MatchesResponse {
        count: matches.len(),
        matches,
    }))
}

/// POST /api/v1/location
///
/// Body: `{ "latitude": 40.71, "longitude": -74.0 }`, or `{}` to clear
async fn update_location(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<UpdateLocationRequest>,
) -> Result<HttpResponse, MatchError> {
    if let Err(errors) = req.validate() {
        return Ok(validation_failed(errors));
    }

    let location = match (req.latitude, req.longitude) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        (None, None) => None,
        _ => {
            return Ok(HttpResponse::BadRequest().json(ErrorResponse {
                error: "Validation failed".to_string(),
                message: "latitude and longitude must be set together".to_string(),
                status_code: 400,
            }));
        }
    };

    state.engine.update_location(user.user_id, location).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

/// POST /api/v1/presence
async fn update_presence(
    state: web::Data<AppState>,
    user: AuthUser,
    req: web::Json<UpdatePresenceRequest>,
) -> Result<HttpResponse, MatchError> {
    state.engine.update_online_status(user.user_id, req.online).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
