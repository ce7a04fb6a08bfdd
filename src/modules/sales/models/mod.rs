mod sale;

pub use sale::{
    CompleteAppointmentRequest, CreateSaleRequest, PaymentMethod, PaymentStatus, Sale,
    SaleItemRequest, SaleLineItem, SalePayment, SalePaymentRequest, SaleResponse, SaleStatus,
};
