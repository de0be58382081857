/// Approval Service Library
///
/// Backend for the content-approval dashboard. Content items live as rows in
/// a spreadsheet; this service proxies reads and writes behind a REST API and
/// owns the status-transition stamping rules.
///
/// # Modules
///
/// - `store`: Store adapter over the spreadsheet (Google Sheets or in-memory)
/// - `services`: Status and sync business logic
/// - `handlers`: HTTP request handlers
/// - `middleware`: Per-IP rate limiting
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};

use actix_web::web;

/// Register every route of the REST surface.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/health/ready", web::get().to(handlers::readiness))
        .service(
            web::scope("/api/content")
                .route("", web::get().to(handlers::list_content))
                .route("/status", web::post().to(handlers::update_status))
                .route("/sync", web::post().to(handlers::sync_content)),
        );
}

/// JSON extractor config that reports malformed bodies in the standard
/// error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(2 * 1024 * 1024)
        .error_handler(|err, _req| {
            tracing::debug!(error = %err, "Rejected request body");
            AppError::ValidationError(format!("Invalid request body: {}", err)).into()
        })
}
