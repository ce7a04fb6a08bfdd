mod appointment;

pub use appointment::{Appointment, AppointmentStatus};
