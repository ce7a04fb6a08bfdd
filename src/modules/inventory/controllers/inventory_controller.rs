use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::modules::inventory::models::{CreateItemRequest, MovementType};
use crate::modules::inventory::services::InventoryService;

/// Request body for a manual stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i32,
    pub movement_type: MovementType,
    #[serde(default = "default_actor")]
    pub actor: String,
    pub note: Option<String>,
    pub reference: Option<String>,
}

fn default_actor() -> String {
    "system".to_string()
}

/// Take a new item into stock
/// POST /inventory
pub async fn create_item(
    service: web::Data<Arc<InventoryService>>,
    request: web::Json<CreateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let item = service.create_item(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(item))
}

/// List active items
/// GET /inventory
pub async fn list_items(
    service: web::Data<Arc<InventoryService>>,
) -> Result<HttpResponse, AppError> {
    let items = service.list_items().await?;
    Ok(HttpResponse::Ok().json(items))
}

/// Get an item by ID
/// GET /inventory/{id}
pub async fn get_item(
    service: web::Data<Arc<InventoryService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let item = service.get_item(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

/// Adjust stock up or down with an audit movement
/// POST /inventory/{id}/adjust
pub async fn adjust_stock(
    service: web::Data<Arc<InventoryService>>,
    path: web::Path<String>,
    request: web::Json<AdjustStockRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let item = service
        .adjust_stock(
            &path.into_inner(),
            request.delta,
            request.movement_type,
            &request.actor,
            request.note,
            request.reference,
        )
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

/// Movement history for an item
/// GET /inventory/{id}/movements
pub async fn movement_history(
    service: web::Data<Arc<InventoryService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let movements = service.movement_history(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(movements))
}

/// Soft-deactivate an item
/// DELETE /inventory/{id}
pub async fn deactivate_item(
    service: web::Data<Arc<InventoryService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    service.deactivate_item(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure inventory routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/inventory")
            .route("", web::post().to(create_item))
            .route("", web::get().to(list_items))
            .route("/{id}", web::get().to(get_item))
            .route("/{id}", web::delete().to(deactivate_item))
            .route("/{id}/adjust", web::post().to(adjust_stock))
            .route("/{id}/movements", web::get().to(movement_history)),
    );
}
