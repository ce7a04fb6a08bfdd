use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::core::error::AppError;
use crate::modules::invoices::models::{GenerateInvoiceRequest, UpdateTermsRequest};
use crate::modules::invoices::services::InvoiceService;

/// Derive an invoice from a sale
/// POST /invoices
pub async fn generate_invoice(
    service: web::Data<Arc<InvoiceService>>,
    request: web::Json<GenerateInvoiceRequest>,
) -> Result<HttpResponse, AppError> {
    let invoice = service.generate_invoice(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(invoice))
}

/// Get an invoice by ID
/// GET /invoices/{id}
pub async fn get_invoice(
    service: web::Data<Arc<InvoiceService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let invoice = service.get_invoice(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(invoice))
}

/// Cancel an unpaid invoice
/// POST /invoices/{id}/cancel
pub async fn cancel_invoice(
    service: web::Data<Arc<InvoiceService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let invoice = service.cancel_invoice(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(invoice))
}

/// Update due date / terms
/// PATCH /invoices/{id}/terms
pub async fn update_terms(
    service: web::Data<Arc<InvoiceService>>,
    path: web::Path<String>,
    request: web::Json<UpdateTermsRequest>,
) -> Result<HttpResponse, AppError> {
    let invoice = service
        .update_terms(&path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(invoice))
}

/// Configure invoice routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/invoices")
            .route("", web::post().to(generate_invoice))
            .route("/{id}", web::get().to(get_invoice))
            .route("/{id}/cancel", web::post().to(cancel_invoice))
            .route("/{id}/terms", web::patch().to(update_terms)),
    );
}
