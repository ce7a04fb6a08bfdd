use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pet owner on record.
///
/// The billing engine treats owners as a read-only collaborator: identity
/// lookups during sale validation, contact snapshots at invoice time, and a
/// best-effort aggregate update after a committed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Owner's GSTIN, printed on B2B invoices when present
    pub gst_number: Option<String>,
    pub total_spent: Decimal,
    pub last_visit: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Pet belonging to an owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: String,
}
