pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{
    BusinessSnapshot, CustomerSnapshot, GenerateInvoiceRequest, Invoice, InvoiceLineItem,
    InvoicePaymentView, InvoiceResponse, InvoiceStatus, UpdateTermsRequest,
};
pub use repositories::{InvoiceRepository, MemoryInvoiceRepository, MySqlInvoiceRepository};
pub use services::InvoiceService;
