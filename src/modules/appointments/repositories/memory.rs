use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::core::{AppError, Result};
use crate::modules::appointments::models::{Appointment, AppointmentStatus};

use super::AppointmentRepository;

/// In-memory appointment store for service-level tests and demos.
#[derive(Default)]
pub struct MemoryAppointmentRepository {
    appointments: Mutex<HashMap<String, Appointment>>,
}

impl MemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentRepository for MemoryAppointmentRepository {
    async fn insert(&self, appointment: &Appointment) -> Result<()> {
        self.appointments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(appointment.id.clone(), appointment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>> {
        Ok(self
            .appointments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned())
    }

    async fn mark_completed(&self, id: &str, sale_id: Option<&str>) -> Result<()> {
        let mut appointments = self.appointments.lock().unwrap_or_else(|e| e.into_inner());
        let appointment = appointments
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Appointment '{}' not found", id)))?;

        appointment.status = AppointmentStatus::Completed;
        if sale_id.is_some() {
            appointment.sale_id = sale_id.map(str::to_string);
        }
        appointment.updated_at = Utc::now();
        Ok(())
    }
}
