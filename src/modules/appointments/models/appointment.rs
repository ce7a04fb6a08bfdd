use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(format!("Invalid appointment status: {}", s)),
        }
    }
}

/// Appointment record, as far as the billing engine cares about it.
///
/// Scheduling and conflict detection live elsewhere; completion is the one
/// touchpoint, because completing a visit can spawn a sale for the items
/// used during it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub owner_id: String,
    pub pet_id: Option<String>,
    pub scheduled_for: DateTime<Utc>,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    /// Sale spawned at completion, when items were dispensed
    pub sale_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
