use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use approval_service::config::{Config, StoreBackend};
use approval_service::middleware::RateLimitMiddleware;
use approval_service::services::{StampClock, StatusService, SyncService};
use approval_service::store::{GoogleSheetsStore, MemorySheetStore, SheetStore, StoreAdapter};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the configured store backend and make sure it is usable. The
/// service must not serve traffic against an unvalidated store.
async fn open_store(config: &Config) -> anyhow::Result<Arc<StoreAdapter>> {
    let backend: Arc<dyn SheetStore> = match config.store.backend {
        StoreBackend::Google => Arc::new(
            GoogleSheetsStore::new(config.store.google.clone(), config.store.timeout())
                .context("Failed to create Google Sheets client")?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory sheet store; data is lost on restart");
            if config.store.seed_fixtures {
                Arc::new(MemorySheetStore::seeded(&content_model::fixtures::sample_items()))
            } else {
                Arc::new(MemorySheetStore::new())
            }
        }
    };

    let store = Arc::new(StoreAdapter::new(backend, config.store.timeout()));
    store
        .initialize_schema()
        .await
        .context("Failed to initialize content sheet")?;

    Ok(store)
}

/// Approval Service
///
/// REST backend for the content-approval dashboard.
///
/// # Routes
///
/// - `GET /api/content` - every content item
/// - `POST /api/content/status` - move one item to a new status
/// - `POST /api/content/sync` - overwrite rows from a client batch
/// - `GET /health`, `GET /health/ready` - liveness and store readiness
///
/// Listens on port 3001 unless `APPROVAL_SERVICE_PORT` says otherwise.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    // Support container healthchecks via CLI subcommand: `healthcheck`
    {
        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "healthcheck" || cmd == "healthcheck-http" {
                let port = std::env::var("APPROVAL_SERVICE_PORT").unwrap_or_else(|_| "3001".into());
                let url = format!("http://127.0.0.1:{}/health", port);
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(5))
                    .build()
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                match client.get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => return Ok(()),
                    Ok(resp) => {
                        eprintln!("healthcheck HTTP status: {}", resp.status());
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"));
                    }
                    Err(e) => {
                        eprintln!("healthcheck HTTP error: {}", e);
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"));
                    }
                }
            }
        }
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());
    if config.app.is_production() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting approval-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let store = match open_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Store initialization failed: {:#}", e);
            eprintln!("ERROR: Store initialization failed: {:#}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Content sheet initialization complete");

    let clock = Arc::new(StampClock::new());
    let status_service = web::Data::new(StatusService::new(
        store.clone(),
        clock.clone(),
        config.workflow.default_approver.clone(),
    ));
    let sync_service = web::Data::new(SyncService::new(store.clone(), clock));
    let store_data = web::Data::from(store);

    let rate_limit = RateLimitMiddleware::new(config.rate_limit.clone())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    {
        let rate_limit = rate_limit.clone();
        let every = Duration::from_secs(config.rate_limit.window_secs.max(60));
        actix_rt::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                rate_limit.prune();
            }
        });
    }

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    HttpServer::new(move || {
        // Build CORS configuration
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(approval_service::json_config())
            .app_data(store_data.clone())
            .app_data(status_service.clone())
            .app_data(sync_service.clone())
            .wrap(rate_limit.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(approval_service::configure_routes)
    })
    .bind(&http_bind_address)?
    .run()
    .await
}
