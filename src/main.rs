use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pawledger::config::Config;
use pawledger::middleware::{ErrorLogger, RequestId};
use pawledger::modules::appointments::repositories::MySqlAppointmentRepository;
use pawledger::modules::customers::repositories::MySqlCustomerRepository;
use pawledger::modules::inventory::controllers::inventory_controller;
use pawledger::modules::inventory::repositories::MySqlInventoryRepository;
use pawledger::modules::inventory::services::{InventoryService, LogLowStockNotifier};
use pawledger::modules::invoices::controllers::invoice_controller;
use pawledger::modules::invoices::repositories::MySqlInvoiceRepository;
use pawledger::modules::invoices::services::InvoiceService;
use pawledger::modules::payments::controllers::payment_controller;
use pawledger::modules::payments::services::PaymentService;
use pawledger::modules::sales::controllers::sale_controller;
use pawledger::modules::sales::repositories::MySqlSaleRepository;
use pawledger::modules::sales::services::SaleService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawledger=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    config.validate().expect("Configuration validation failed");

    tracing::info!("Starting PawLedger back office");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    // Create database connection pool and apply migrations
    let db_pool = config
        .database
        .create_pool()
        .await
        .expect("Failed to create database pool");
    config
        .database
        .run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    // Repositories
    let inventory_repo = Arc::new(MySqlInventoryRepository::new(db_pool.clone()));
    let customer_repo = Arc::new(MySqlCustomerRepository::new(db_pool.clone()));
    let appointment_repo = Arc::new(MySqlAppointmentRepository::new(db_pool.clone()));
    let sale_repo = Arc::new(MySqlSaleRepository::new(db_pool.clone()));
    let invoice_repo = Arc::new(MySqlInvoiceRepository::new(db_pool.clone()));

    // Services
    let inventory_service = Arc::new(InventoryService::new(
        inventory_repo,
        customer_repo.clone(),
        Arc::new(LogLowStockNotifier),
    ));
    let sale_service = Arc::new(SaleService::new(
        sale_repo.clone(),
        customer_repo.clone(),
        appointment_repo,
        inventory_service.clone(),
    ));
    let invoice_service = Arc::new(InvoiceService::new(
        invoice_repo.clone(),
        sale_repo.clone(),
        customer_repo,
        config.business.snapshot(),
    ));
    let payment_service = Arc::new(PaymentService::new(sale_repo, invoice_repo));

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let workers = config.server.workers;
    let server = HttpServer::new(move || {
        App::new()
            // Innermost first: ErrorLogger sees the final response
            .wrap(ErrorLogger)
            .wrap(TracingLogger::default())
            .wrap(RequestId)
            .wrap(Cors::permissive())
            .app_data(web::Data::new(inventory_service.clone()))
            .app_data(web::Data::new(sale_service.clone()))
            .app_data(web::Data::new(invoice_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/api")
                    // Payment routes nest under /sales and /invoices paths,
                    // so they must register ahead of those scopes
                    .configure(payment_controller::configure)
                    .configure(inventory_controller::configure)
                    .configure(sale_controller::configure)
                    .configure(invoice_controller::configure),
            )
    })
    .workers(workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "pawledger"
    }))
}
