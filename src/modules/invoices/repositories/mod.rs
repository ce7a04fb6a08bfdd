mod invoice_repository;
mod memory;

pub use invoice_repository::{InvoiceRepository, MySqlInvoiceRepository};
pub use memory::MemoryInvoiceRepository;
