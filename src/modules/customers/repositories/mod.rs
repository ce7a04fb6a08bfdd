mod customer_repository;
mod memory;

pub use customer_repository::{CustomerRepository, MySqlCustomerRepository};
pub use memory::MemoryCustomerRepository;
