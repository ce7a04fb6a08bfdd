pub mod models;
pub mod repositories;

pub use models::{Owner, Pet};
pub use repositories::{CustomerRepository, MemoryCustomerRepository, MySqlCustomerRepository};
