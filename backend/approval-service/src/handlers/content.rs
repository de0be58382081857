/// Content handlers - list, status update, and bulk sync
use crate::error::{AppError, Result};
use crate::services::{StatusService, SyncService};
use crate::store::StoreAdapter;
use actix_web::{web, HttpResponse};
use content_model::api::{StatusUpdateResponse, SyncItem, SyncResponse};
use content_model::Status;
use serde::Deserialize;
use serde_json::Value;

/// Status update body as received. Fields are optional so a missing field
/// reports as a validation error rather than a decode failure.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub id: Option<String>,
    pub status: Option<String>,
    pub feedback: Option<String>,
}

/// List every content item
pub async fn list_content(store: web::Data<StoreAdapter>) -> Result<HttpResponse> {
    let items = store.fetch_all().await.map_err(|source| {
        tracing::error!(error = %source, "Error fetching content");
        AppError::StoreUnavailable {
            context: "Failed to fetch content",
            source,
        }
    })?;

    Ok(HttpResponse::Ok().json(items))
}

/// Update one item's status, stamping feedback and approval fields
pub async fn update_status(
    service: web::Data<StatusService>,
    body: web::Json<UpdateStatusBody>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let (id, raw_status) = match (body.id, body.status) {
        (Some(id), Some(status)) if !id.trim().is_empty() && !status.trim().is_empty() => {
            (id, status)
        }
        _ => return Err(AppError::ValidationError("Missing required fields".to_string())),
    };
    let status: Status = raw_status
        .parse()
        .map_err(|e: content_model::ParseEnumError| AppError::ValidationError(e.to_string()))?;

    let update = service
        .update_status(&id, status, body.feedback.as_deref())
        .await
        .inspect_err(|e| match e {
            AppError::NotFound(_) => tracing::info!(id = %id, "Status update for unknown content"),
            other => tracing::error!(error = %other, "Error updating status"),
        })?;

    Ok(HttpResponse::Ok().json(StatusUpdateResponse {
        message: "Status updated successfully".to_string(),
        item: update.item,
    }))
}

/// Overwrite rows from a client-supplied batch
pub async fn sync_content(
    service: web::Data<SyncService>,
    body: web::Json<Value>,
) -> Result<HttpResponse> {
    let items = match body.into_inner() {
        Value::Object(mut fields) => match fields.remove("items") {
            Some(items @ Value::Array(_)) => items,
            _ => return Err(AppError::ValidationError("Invalid items format".to_string())),
        },
        _ => return Err(AppError::ValidationError("Invalid items format".to_string())),
    };

    let items: Vec<SyncItem> = serde_json::from_value(items)
        .map_err(|e| AppError::ValidationError(format!("Invalid item: {}", e)))?;

    let outcome = service
        .sync_content(items)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Error syncing content"))?;

    Ok(HttpResponse::Ok().json(SyncResponse {
        message: "Content synced successfully".to_string(),
        count: outcome.count,
    }))
}
