use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use kinnect_match::config::{LoggingSettings, Settings};
use kinnect_match::routes::{self, AppState};
use kinnect_match::services::{CacheManager, PostgresClient};
use kinnect_match::ScoreCalculator;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Settings come first so they can shape logging; a load failure is
    // still reported through a default subscriber
    let loaded = match std::env::var("KINNECT_CONFIG") {
        Ok(path) => Settings::load_from(path),
        Err(_) => Settings::load(),
    };
    let logging = loaded
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    info!("Starting Kinnect match service...");

    let settings = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Configuration loaded successfully");

    // Cache is optional; match lists are always readable from PostgreSQL
    let cache = if !settings.cache.enabled {
        info!("Cache disabled by configuration");
        None
    } else {
        let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
        let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

        if settings.cache.redis_url.is_empty() {
            info!("No Redis configured, using in-process cache (single instance only)");
            Some(Arc::new(CacheManager::in_process(l1_cache_size, cache_ttl)))
        } else {
            match CacheManager::new(&settings.cache.redis_url, l1_cache_size, cache_ttl).await {
                Ok(c) => {
                    info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
                    Some(Arc::new(c))
                }
                Err(e) => {
                    warn!("Failed to connect to Redis ({}), running without cache", e);
                    None
                }
            }
        }
    };

    let db_max_conn = settings.database.max_connections.unwrap_or(10);

    let postgres = PostgresClient::from_settings(
        &settings.database.url,
        Some(db_max_conn),
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
    })?;

    info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);

    let app_state = AppState::new(
        Arc::new(postgres),
        ScoreCalculator::standard(),
        cache,
        settings.freshness_window(),
        settings.matching.candidate_min_readiness,
        settings.matching.candidate_limit,
    );

    info!(
        "Match rules: freshness window {}ms, candidates need readiness >= {} (limit {})",
        settings.matching.freshness_window_ms,
        settings.matching.candidate_min_readiness,
        settings.matching.candidate_limit
    );

    // Configure HTTP server
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
