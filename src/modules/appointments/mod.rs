pub mod models;
pub mod repositories;

pub use models::{Appointment, AppointmentStatus};
pub use repositories::{
    AppointmentRepository, MemoryAppointmentRepository, MySqlAppointmentRepository,
};
