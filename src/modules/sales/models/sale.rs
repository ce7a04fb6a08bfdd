use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::modules::taxes::models::{DiscountType, GstType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Confirmed,
    Delivered,
    Cancelled,
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleStatus::Confirmed => write!(f, "confirmed"),
            SaleStatus::Delivered => write!(f, "delivered"),
            SaleStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(SaleStatus::Confirmed),
            "delivered" => Ok(SaleStatus::Delivered),
            "cancelled" => Ok(SaleStatus::Cancelled),
            _ => Err(format!("Invalid sale status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    Other,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Upi => write!(f, "upi"),
            PaymentMethod::Other => write!(f, "other"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// Derives the status from amounts: fully covered totals are `Paid`,
    /// anything in between `Partial`, nothing received `Pending`.
    pub fn derive(paid: Decimal, total: Decimal) -> Self {
        if total > Decimal::ZERO && paid >= total {
            PaymentStatus::Paid
        } else if paid > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Partial => write!(f, "partial"),
            PaymentStatus::Paid => write!(f, "paid"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// Payment state embedded in a sale.
///
/// `paid_amount + due_amount == grand_total` at all times, and
/// `paid_amount` never exceeds the grand total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalePayment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub paid_amount: Decimal,
    pub due_amount: Decimal,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Line item snapshot taken at sale time.
///
/// Name, SKU, price and GST terms are copied from the inventory item at
/// the instant of sale so later catalog edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineItem {
    pub item_id: String,
    pub sku: String,
    pub name: String,
    pub hsn_sac_code: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub discount_type: DiscountType,
    pub gst_applicable: bool,
    pub gst_rate: Decimal,
    pub gst_type: GstType,
    pub cess_rate: Decimal,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub taxable_amount: Decimal,
    /// GST including cess
    pub gst_amount: Decimal,
    pub cess_amount: Decimal,
    pub total: Decimal,
}

/// One committed sale transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub sale_number: String,
    pub owner_id: String,
    pub pet_id: Option<String>,
    pub items: Vec<SaleLineItem>,
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub total_taxable: Decimal,
    pub total_gst: Decimal,
    pub grand_total: Decimal,
    pub payment: SalePayment,
    pub status: SaleStatus,
    pub invoice_id: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Requested line in a cart
#[derive(Debug, Clone, Deserialize)]
pub struct SaleItemRequest {
    pub item_id: String,
    pub quantity: i32,
    /// Overrides the catalog price for this line when present
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub discount_type: DiscountType,
}

/// Payment tendered at the counter along with the cart
#[derive(Debug, Clone, Deserialize)]
pub struct SalePaymentRequest {
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub paid_amount: Decimal,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleRequest {
    pub owner_id: String,
    pub pet_id: Option<String>,
    pub items: Vec<SaleItemRequest>,
    pub payment: Option<SalePaymentRequest>,
    pub notes: Option<String>,
}

/// Created sale plus counter feedback that is not part of the record
#[derive(Debug, Clone, Serialize)]
pub struct SaleResponse {
    #[serde(flatten)]
    pub sale: Sale,
    /// Cash to hand back when the tendered amount exceeded the total
    pub change_amount: Decimal,
}

/// Items dispensed while completing an appointment
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteAppointmentRequest {
    #[serde(default)]
    pub items: Vec<SaleItemRequest>,
    pub payment: Option<SalePaymentRequest>,
    pub notes: Option<String>,
}
