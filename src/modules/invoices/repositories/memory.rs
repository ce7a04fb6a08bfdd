use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::{AppError, Result};
use crate::modules::invoices::models::{Invoice, InvoiceStatus};
use crate::modules::sequences::NumberSource;

use super::InvoiceRepository;

#[derive(Default)]
struct Store {
    invoices: HashMap<String, Invoice>,
    /// Stand-ins for the unique indexes on invoice_number and sale_id
    numbers: HashSet<String>,
    sale_ids: HashSet<String>,
}

/// In-memory invoice store for service-level tests and demos.
#[derive(Default)]
pub struct MemoryInvoiceRepository {
    store: Mutex<Store>,
}

impl MemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NumberSource for MemoryInvoiceRepository {
    async fn latest_number(&self, prefix: &str) -> Result<Option<String>> {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        Ok(store
            .numbers
            .iter()
            .filter(|number| number.starts_with(prefix))
            .max()
            .cloned())
    }
}

#[async_trait]
impl InvoiceRepository for MemoryInvoiceRepository {
    async fn insert(&self, invoice: &Invoice) -> Result<()> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        if store.sale_ids.contains(&invoice.sale_id) {
            return Err(AppError::conflict(format!(
                "An invoice already exists for sale '{}'",
                invoice.sale_id
            )));
        }
        if store.numbers.contains(&invoice.invoice_number) {
            return Err(AppError::conflict(format!(
                "Invoice number '{}' already exists",
                invoice.invoice_number
            )));
        }
        store.numbers.insert(invoice.invoice_number.clone());
        store.sale_ids.insert(invoice.sale_id.clone());
        store.invoices.insert(invoice.id.clone(), invoice.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Invoice>> {
        Ok(self
            .store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .invoices
            .get(id)
            .cloned())
    }

    async fn find_by_sale_id(&self, sale_id: &str) -> Result<Option<Invoice>> {
        Ok(self
            .store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .invoices
            .values()
            .find(|invoice| invoice.sale_id == sale_id)
            .cloned())
    }

    async fn update_status(
        &self,
        id: &str,
        status: InvoiceStatus,
        is_active: bool,
    ) -> Result<()> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let invoice = store
            .invoices
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Invoice '{}' not found", id)))?;
        invoice.status = status;
        invoice.is_active = is_active;
        invoice.updated_at = Utc::now();
        Ok(())
    }

    async fn update_terms(
        &self,
        id: &str,
        due_date: Option<DateTime<Utc>>,
        terms: Option<String>,
    ) -> Result<()> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let invoice = store
            .invoices
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Invoice '{}' not found", id)))?;
        if let Some(due_date) = due_date {
            invoice.due_date = due_date;
        }
        if let Some(terms) = terms {
            invoice.terms = Some(terms);
        }
        invoice.updated_at = Utc::now();
        Ok(())
    }
}
