mod memory;
mod sale_repository;

pub use memory::MemorySaleRepository;
pub use sale_repository::{MySqlSaleRepository, SaleRepository};
