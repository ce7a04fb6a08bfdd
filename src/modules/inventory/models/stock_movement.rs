use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cause of a stock quantity change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Sale,
    Purchase,
    Adjustment,
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementType::Sale => write!(f, "sale"),
            MovementType::Purchase => write!(f, "purchase"),
            MovementType::Adjustment => write!(f, "adjustment"),
        }
    }
}

impl FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sale" => Ok(MovementType::Sale),
            "purchase" => Ok(MovementType::Purchase),
            "adjustment" => Ok(MovementType::Adjustment),
            _ => Err(format!("Invalid movement type: {}", s)),
        }
    }
}

/// Immutable entry in an item's stock history.
///
/// Movements are append-only: never edited, never deleted. Replaying them
/// reconstructs the quantity history, and a sale's movements are what its
/// cancellation compensates against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: String,
    pub item_id: String,
    pub movement_type: MovementType,
    /// Signed delta; negative for outgoing stock
    pub quantity_change: i32,
    pub actor: String,
    pub note: Option<String>,
    /// Free-text pointer to the cause, e.g. a sale number
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Movement data captured alongside a quantity adjustment
#[derive(Debug, Clone)]
pub struct NewStockMovement {
    pub movement_type: MovementType,
    pub quantity_change: i32,
    pub actor: String,
    pub note: Option<String>,
    pub reference: Option<String>,
}
