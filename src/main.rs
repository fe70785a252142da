use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use spark_match::auth::JwtVerifier;
use spark_match::config::{ProfileSource, Settings, StorageBackend};
use spark_match::core::{CandidateFilter, MatchEngine};
use spark_match::models::{ErrorResponse, UserProfile};
use spark_match::routes::{self, AppState};
use spark_match::services::{
    CacheManager, CachedProfileStore, DecisionStore, MatchStore, MemoryStore, PostgresStore,
    ProfileApiClient, ProfileStore,
};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error for malformed payloads and query strings
#[derive(Debug)]
struct PayloadError(ErrorResponse);

impl Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl error::ResponseError for PayloadError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(&self.0)
    }
}

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    info!("JSON payload error on {}: {}", req.path(), err);
    PayloadError(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    })
    .into()
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    PayloadError(ErrorResponse {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    })
    .into()
}

/// Handle path parameter errors, e.g. a non-numeric user id
fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    PayloadError(ErrorResponse {
        error: "invalid_path".to_string(),
        message: format!("Invalid path parameter: {}", err),
        status_code: 400,
    })
    .into()
}

fn startup_error(context: &str, err: impl Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

/// Profiles listed in `database.seed_profiles`, if configured
fn load_seed_profiles(settings: &Settings) -> std::io::Result<Vec<UserProfile>> {
    let Some(path) = &settings.database.seed_profiles else {
        return Ok(Vec::new());
    };

    let raw = std::fs::read_to_string(path).map_err(|e| startup_error("Failed to read seed profiles", e))?;
    let profiles: Vec<UserProfile> =
        serde_json::from_str(&raw).map_err(|e| startup_error("Failed to parse seed profiles", e))?;

    info!("Loaded {} seed profiles from {}", profiles.len(), path);
    Ok(profiles)
}

async fn build_state(settings: &Settings) -> std::io::Result<AppState> {
    let seed = load_seed_profiles(settings)?;

    let (decisions, matches, local_profiles, postgres): (
        Arc<dyn DecisionStore>,
        Arc<dyn MatchStore>,
        Arc<dyn ProfileStore>,
        Option<Arc<PostgresStore>>,
    ) = match settings.database.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; likes and matches are lost on restart");
            let store = Arc::new(MemoryStore::with_profiles(seed));
            (
                store.clone() as Arc<dyn DecisionStore>,
                store.clone() as Arc<dyn MatchStore>,
                store as Arc<dyn ProfileStore>,
                None,
            )
        }
        StorageBackend::Postgres => {
            let db = &settings.database;
            let store = Arc::new(
                PostgresStore::from_settings(
                    &db.url,
                    db.max_connections,
                    db.min_connections,
                    db.acquire_timeout_secs,
                    db.idle_timeout_secs,
                )
                .await
                .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
            );
            info!(
                "PostgreSQL store initialized (max: {} connections)",
                db.max_connections.unwrap_or(10)
            );

            for profile in &seed {
                store
                    .upsert_profile(profile)
                    .await
                    .map_err(|e| startup_error("Failed to seed profile", e))?;
            }
            (
                store.clone() as Arc<dyn DecisionStore>,
                store.clone() as Arc<dyn MatchStore>,
                store.clone() as Arc<dyn ProfileStore>,
                Some(store),
            )
        }
    };

    let profiles: Arc<dyn ProfileStore> = match settings.profiles.source {
        ProfileSource::Database => local_profiles,
        ProfileSource::Remote => {
            let endpoint = settings
                .profiles
                .endpoint
                .clone()
                .ok_or_else(|| startup_error("Invalid configuration", "profiles.endpoint is required for the remote source"))?;
            let timeout = Duration::from_secs(settings.profiles.timeout_secs.unwrap_or(10));
            let client = ProfileApiClient::new(
                endpoint.clone(),
                settings.profiles.api_key.clone().unwrap_or_default(),
                timeout,
            )
            .map_err(|e| startup_error("Failed to create profile client", e))?;
            info!("Reading profiles from {}", endpoint);
            Arc::new(client)
        }
    };

    let profiles: Arc<dyn ProfileStore> = if settings.cache.enabled {
        let ttl = settings.cache.ttl_secs.unwrap_or(60);
        let l1_size = settings.cache.l1_cache_size.unwrap_or(10_000);

        let cache = match CacheManager::new(settings.cache.redis_url.as_deref(), l1_size, ttl).await {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Failed to connect to Redis ({}), running with in-process cache only", e);
                CacheManager::new(None, l1_size, ttl)
                    .await
                    .map_err(|e| startup_error("Failed to create cache", e))?
            }
        };
        info!(
            "Profile cache initialized (L1: {} entries, TTL: {}s, Redis: {})",
            l1_size,
            ttl,
            cache.has_redis()
        );
        Arc::new(CachedProfileStore::new(profiles, cache))
    } else {
        profiles
    };

    let filter = CandidateFilter::new(settings.matching.age_window, settings.matching.max_distance_km);
    info!(
        "Candidate filter initialized (age window: {}, max distance: {:?} km)",
        filter.age_window(),
        filter.max_distance_km()
    );

    Ok(AppState {
        engine: MatchEngine::new(profiles, decisions, matches, filter),
        verifier: JwtVerifier::new(&settings.auth.jwt_secret),
        matching: settings.matching.clone(),
        postgres,
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    match &settings {
        Ok(s) => init_tracing(&s.logging.level, &s.logging.format),
        Err(_) => init_tracing("info", "json"),
    }

    info!("Starting Spark matching service...");

    let settings = settings.map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Configuration loaded successfully");

    let app_state = build_state(&settings).await?;

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
