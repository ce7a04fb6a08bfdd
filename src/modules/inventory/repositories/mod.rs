mod inventory_repository;
mod memory;

pub use inventory_repository::{InventoryRepository, MySqlInventoryRepository};
pub use memory::MemoryInventoryRepository;
