mod appointment_repository;
mod memory;

pub use appointment_repository::{AppointmentRepository, MySqlAppointmentRepository};
pub use memory::MemoryAppointmentRepository;
