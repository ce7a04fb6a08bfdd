pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{
    CompleteAppointmentRequest, CreateSaleRequest, PaymentMethod, PaymentStatus, Sale,
    SaleItemRequest, SaleLineItem, SalePayment, SalePaymentRequest, SaleResponse, SaleStatus,
};
pub use repositories::{MemorySaleRepository, MySqlSaleRepository, SaleRepository};
pub use services::{CompletedAppointment, SaleService};
