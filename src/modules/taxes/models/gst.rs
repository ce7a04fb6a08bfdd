use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GST levy type for a line item.
///
/// Intra-state supplies split the rate into equal CGST and SGST halves;
/// inter-state supplies levy the full rate as IGST. The remaining variants
/// carry no tax regardless of the rate on file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GstType {
    CgstSgst,
    Igst,
    Exempt,
    NilRated,
    ZeroRated,
}

impl GstType {
    /// True when this levy type actually charges tax.
    pub fn is_taxed(&self) -> bool {
        matches!(self, GstType::CgstSgst | GstType::Igst)
    }
}

impl fmt::Display for GstType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GstType::CgstSgst => "CGST_SGST",
            GstType::Igst => "IGST",
            GstType::Exempt => "EXEMPT",
            GstType::NilRated => "NIL_RATED",
            GstType::ZeroRated => "ZERO_RATED",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for GstType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "CGST_SGST" => Ok(GstType::CgstSgst),
            "IGST" => Ok(GstType::Igst),
            "EXEMPT" => Ok(GstType::Exempt),
            "NIL_RATED" => Ok(GstType::NilRated),
            "ZERO_RATED" => Ok(GstType::ZeroRated),
            _ => Err(format!("Invalid GST type: {}", s)),
        }
    }
}

/// How a line discount is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Percentage of the line subtotal (0-100)
    Percentage,
    /// Fixed amount off the line subtotal
    Fixed,
}

impl Default for DiscountType {
    fn default() -> Self {
        DiscountType::Percentage
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed" => Ok(DiscountType::Fixed),
            _ => Err(format!("Invalid discount type: {}", s)),
        }
    }
}

/// Tax configuration carried by an inventory item and snapshotted onto
/// sale line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstProfile {
    /// Whether GST applies to this item at all
    pub applicable: bool,

    /// Headline rate in percent (0-100)
    pub rate: Decimal,

    /// Levy type
    pub gst_type: GstType,

    /// HSN (goods) or SAC (services) classification code
    pub hsn_sac_code: Option<String>,

    /// Compensation cess rate in percent, levied on the taxable amount
    pub cess_rate: Decimal,
}

impl GstProfile {
    pub fn exempt() -> Self {
        Self {
            applicable: false,
            rate: Decimal::ZERO,
            gst_type: GstType::Exempt,
            hsn_sac_code: None,
            cess_rate: Decimal::ZERO,
        }
    }
}

/// Per-line amounts produced by the calculator at sale time.
///
/// `gst_amount` includes cess; `cess_amount` is also carried separately so
/// the invoice split can report it on its own line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineAmounts {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub taxable_amount: Decimal,
    pub gst_amount: Decimal,
    pub cess_amount: Decimal,
    pub total: Decimal,
}

/// Full component breakdown of a line's GST, produced at invoice time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GstSplit {
    pub cgst_rate: Decimal,
    pub cgst_amount: Decimal,
    pub sgst_rate: Decimal,
    pub sgst_amount: Decimal,
    pub igst_rate: Decimal,
    pub igst_amount: Decimal,
    pub cess_amount: Decimal,
    /// Sum of all components
    pub total_tax: Decimal,
}
