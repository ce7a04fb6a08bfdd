use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::round_money;
use crate::modules::sales::models::{PaymentMethod, PaymentStatus, Sale};
use crate::modules::taxes::models::GstType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Issued,
    Cancelled,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Issued => write!(f, "issued"),
            InvoiceStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "issued" => Ok(InvoiceStatus::Issued),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// Customer details frozen onto the invoice at generation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gst_number: Option<String>,
}

/// Issuing business details frozen onto the invoice at generation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessSnapshot {
    pub name: String,
    pub address: Option<String>,
    pub gst_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Invoice line with its GST expanded into explicit components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub item_id: String,
    pub sku: String,
    pub name: String,
    pub hsn_sac_code: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub taxable_amount: Decimal,
    pub gst_rate: Decimal,
    pub gst_type: GstType,
    pub cgst_rate: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_rate: Decimal,
    pub sgst_amount: Decimal,
    pub igst_rate: Decimal,
    pub igst_amount: Decimal,
    pub cess_rate: Decimal,
    pub cess_amount: Decimal,
    pub total: Decimal,
}

/// Billing document derived from exactly one sale.
///
/// Totals are immutable once issued; only the due date and terms may
/// change afterwards. Payment state is not stored here at all; it is
/// projected from the linked sale on every read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub sale_id: String,
    pub sale_number: String,
    pub customer: CustomerSnapshot,
    pub business: BusinessSnapshot,
    pub items: Vec<InvoiceLineItem>,
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub total_taxable: Decimal,
    pub total_cgst: Decimal,
    pub total_sgst: Decimal,
    pub total_igst: Decimal,
    pub total_cess: Decimal,
    pub grand_total: Decimal,
    /// `final_amount - grand_total`
    pub round_off: Decimal,
    /// Grand total rounded to whole rupees; the payable figure
    pub final_amount: Decimal,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub terms: Option<String>,
    pub status: InvoiceStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment state of an invoice, projected from the linked sale.
///
/// The sale's payment record is the single source of truth; due amount
/// and status are re-derived against the invoice's rounded payable
/// figure on every read, so the two views cannot drift apart.
#[derive(Debug, Clone, Serialize)]
pub struct InvoicePaymentView {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Projects this invoice's payment state from its sale.
    pub fn payment_view(&self, sale: &Sale) -> InvoicePaymentView {
        let paid = sale.payment.paid_amount;
        let due = round_money((self.final_amount - paid).max(Decimal::ZERO));
        InvoicePaymentView {
            method: sale.payment.method,
            status: PaymentStatus::derive(paid, self.final_amount),
            paid_amount: paid,
            due_amount: due,
            transaction_id: sale.payment.transaction_id.clone(),
            paid_at: sale.payment.paid_at,
        }
    }
}

/// Request to derive an invoice from a sale
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateInvoiceRequest {
    pub sale_id: String,
    pub due_date: Option<DateTime<Utc>>,
    pub terms: Option<String>,
    /// Overrides the configured business details for this invoice
    pub business: Option<BusinessSnapshot>,
}

/// Post-issue mutable fields
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTermsRequest {
    pub due_date: Option<DateTime<Utc>>,
    pub terms: Option<String>,
}

/// Invoice plus its projected payment state
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub payment: InvoicePaymentView,
}
