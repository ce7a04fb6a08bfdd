use rust_decimal::Decimal;
use serde::Deserialize;

use crate::modules::sales::models::PaymentMethod;

/// Request to record a payment against a sale or an invoice
#[derive(Debug, Clone, Deserialize)]
pub struct AddPaymentRequest {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
}
