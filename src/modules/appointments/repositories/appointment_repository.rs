use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row};
use std::str::FromStr;

use crate::core::{AppError, Result};
use crate::modules::appointments::models::{Appointment, AppointmentStatus};

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn insert(&self, appointment: &Appointment) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>>;

    /// Marks an appointment completed, optionally linking the sale spawned
    /// during completion.
    async fn mark_completed(&self, id: &str, sale_id: Option<&str>) -> Result<()>;
}

/// MySQL-backed appointment repository
pub struct MySqlAppointmentRepository {
    pool: MySqlPool,
}

impl MySqlAppointmentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentRepository for MySqlAppointmentRepository {
    async fn insert(&self, appointment: &Appointment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO appointments (
                id, owner_id, pet_id, scheduled_for, reason, status,
                sale_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&appointment.id)
        .bind(&appointment.owner_id)
        .bind(&appointment.pet_id)
        .bind(appointment.scheduled_for)
        .bind(&appointment.reason)
        .bind(appointment.status.to_string())
        .bind(&appointment.sale_id)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, pet_id, scheduled_for, reason, status,
                   sale_id, created_at, updated_at
            FROM appointments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let status: String = row.try_get("status")?;
            Ok(Appointment {
                id: row.try_get("id")?,
                owner_id: row.try_get("owner_id")?,
                pet_id: row.try_get("pet_id")?,
                scheduled_for: row.try_get("scheduled_for")?,
                reason: row.try_get("reason")?,
                status: AppointmentStatus::from_str(&status)
                    .map_err(AppError::internal)?,
                sale_id: row.try_get("sale_id")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    async fn mark_completed(&self, id: &str, sale_id: Option<&str>) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET status = 'completed', sale_id = COALESCE(?, sale_id), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(sale_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Appointment '{}' not found",
                id
            )));
        }

        Ok(())
    }
}
