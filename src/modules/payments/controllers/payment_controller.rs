use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::core::error::AppError;
use crate::modules::payments::models::AddPaymentRequest;
use crate::modules::payments::services::PaymentService;

/// Record a payment against a sale
/// POST /sales/{id}/payments
pub async fn add_sale_payment(
    service: web::Data<Arc<PaymentService>>,
    path: web::Path<String>,
    request: web::Json<AddPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let sale = service
        .add_sale_payment(&path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(sale))
}

/// Record a payment against an invoice
/// POST /invoices/{id}/payments
pub async fn add_invoice_payment(
    service: web::Data<Arc<PaymentService>>,
    path: web::Path<String>,
    request: web::Json<AddPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let invoice = service
        .add_invoice_payment(&path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(invoice))
}

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/sales/{id}/payments",
        web::post().to(add_sale_payment),
    );
    cfg.route(
        "/invoices/{id}/payments",
        web::post().to(add_invoice_payment),
    );
}
