/// Health endpoints
use crate::store::StoreAdapter;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use std::time::Instant;

/// Liveness. Clients use this to decide whether to fall back to fixture data.
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

/// Readiness: the store answers within its timeout and has at least one sheet.
pub async fn readiness(store: web::Data<StoreAdapter>) -> HttpResponse {
    let start = Instant::now();
    let result = store.ping().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(sheets) if sheets > 0 => HttpResponse::Ok().json(serde_json::json!({
            "ready": true,
            "store": "healthy",
            "latency_ms": latency_ms,
            "timestamp": Utc::now().to_rfc3339(),
        })),
        Ok(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "ready": false,
            "store": "unhealthy",
            "message": "No sheets found in the spreadsheet",
            "latency_ms": latency_ms,
            "timestamp": Utc::now().to_rfc3339(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "ready": false,
                "store": "unhealthy",
                "message": "Store check failed",
                "latency_ms": latency_ms,
                "timestamp": Utc::now().to_rfc3339(),
            }))
        }
    }
}
