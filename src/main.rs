use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use match_broker::config::{LoggingSettings, Settings};
use match_broker::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use match_broker::services::{InMemoryStore, InterestStore, PgStore, ProfileStore, TokenVerifier};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
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

    // Logging is configured from the settings, so load those first
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);

    info!("Starting match broker service...");

    let (profiles, interests): (Arc<dyn ProfileStore>, Arc<dyn InterestStore>) = match &settings.database.url {
        Some(url) => {
            let store = PgStore::from_settings(
                url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;

            info!(
                "PostgreSQL store initialized (max: {} connections)",
                settings.database.max_connections.unwrap_or(10)
            );
            let store = Arc::new(store);
            (store.clone() as Arc<dyn ProfileStore>, store as Arc<dyn InterestStore>)
        }
        None => {
            warn!("No database URL configured, running on the in-memory store; data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            (store.clone() as Arc<dyn ProfileStore>, store as Arc<dyn InterestStore>)
        }
    };

    if settings.auth.jwt_secret == "change-me" {
        warn!("Using the placeholder JWT secret; set JWT_SECRET in production");
    }

    let verifier = TokenVerifier::new(
        &settings.auth.jwt_secret,
        settings.auth.issuer.as_deref(),
        settings.auth.leeway_secs,
    );

    let limits = settings.search.limits();
    info!(
        "Search paging: default size {}, max size {}",
        limits.default_page_size, limits.max_page_size
    );

    let app_state = AppState::new(profiles, interests, limits, verifier);

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
