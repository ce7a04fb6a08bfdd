use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::modules::sales::models::{CompleteAppointmentRequest, CreateSaleRequest};
use crate::modules::sales::services::SaleService;

/// Query parameters for listing sales
#[derive(Debug, Deserialize)]
pub struct ListSalesQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Create a sale from a cart
/// POST /sales
pub async fn create_sale(
    service: web::Data<Arc<SaleService>>,
    request: web::Json<CreateSaleRequest>,
) -> Result<HttpResponse, AppError> {
    let sale = service.create_sale(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(sale))
}

/// Get a sale by ID
/// GET /sales/{id}
pub async fn get_sale(
    service: web::Data<Arc<SaleService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let sale = service.get_sale(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(sale))
}

/// List sales
/// GET /sales
pub async fn list_sales(
    service: web::Data<Arc<SaleService>>,
    query: web::Query<ListSalesQuery>,
) -> Result<HttpResponse, AppError> {
    let sales = service.list_sales(query.limit, query.offset).await?;
    Ok(HttpResponse::Ok().json(sales))
}

/// Cancel a sale and restore its stock
/// POST /sales/{id}/cancel
pub async fn cancel_sale(
    service: web::Data<Arc<SaleService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let sale = service.cancel_sale(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(sale))
}

/// Mark a sale delivered
/// POST /sales/{id}/deliver
pub async fn mark_delivered(
    service: web::Data<Arc<SaleService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let sale = service.mark_delivered(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(sale))
}

/// Complete an appointment, spawning a sale when items were dispensed
/// POST /appointments/{id}/complete
pub async fn complete_appointment(
    service: web::Data<Arc<SaleService>>,
    path: web::Path<String>,
    request: web::Json<CompleteAppointmentRequest>,
) -> Result<HttpResponse, AppError> {
    let completed = service
        .complete_appointment(&path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(completed))
}

/// Configure sale routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sales")
            .route("", web::post().to(create_sale))
            .route("", web::get().to(list_sales))
            .route("/{id}", web::get().to(get_sale))
            .route("/{id}/cancel", web::post().to(cancel_sale))
            .route("/{id}/deliver", web::post().to(mark_delivered)),
    );
    cfg.service(
        web::scope("/appointments")
            .route("/{id}/complete", web::post().to(complete_appointment)),
    );
}
