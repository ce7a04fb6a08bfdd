pub mod controllers;
pub mod models;
pub mod services;

pub use models::AddPaymentRequest;
pub use services::PaymentService;
