use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::modules::taxes::models::GstProfile;

/// Sellable stock unit.
///
/// `quantity` is only ever mutated through the ledger's atomic adjust
/// operations, never by a direct field write, and can never go below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    /// At or below this level the item is flagged for restocking
    pub min_stock: i32,
    pub gst: GstProfile,
    pub total_sold: i64,
    pub last_sale_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }
}

/// Request payload for taking a new item into stock
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemRequest {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub min_stock: i32,
    pub gst: Option<GstProfile>,
}
