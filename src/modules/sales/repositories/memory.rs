use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::core::{AppError, Result};
use crate::modules::sales::models::{Sale, SalePayment, SaleStatus};
use crate::modules::sequences::NumberSource;

use super::SaleRepository;

#[derive(Default)]
struct Store {
    sales: HashMap<String, Sale>,
    /// Stand-in for the unique index on sale_number
    numbers: HashSet<String>,
}

/// In-memory sale store for service-level tests and demos.
#[derive(Default)]
pub struct MemorySaleRepository {
    store: Mutex<Store>,
}

impl MemorySaleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NumberSource for MemorySaleRepository {
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
impl SaleRepository for MemorySaleRepository {
    async fn insert(&self, sale: &Sale) -> Result<()> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        if store.numbers.contains(&sale.sale_number) {
            return Err(AppError::conflict(format!(
                "Sale number '{}' already exists",
                sale.sale_number
            )));
        }
        store.numbers.insert(sale.sale_number.clone());
        store.sales.insert(sale.id.clone(), sale.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Sale>> {
        Ok(self
            .store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .sales
            .get(id)
            .cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Sale>> {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let mut sales: Vec<Sale> = store.sales.values().cloned().collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.clamp(1, 100) as usize)
            .collect())
    }

    async fn update_status(&self, id: &str, status: SaleStatus, is_active: bool) -> Result<()> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let sale = store
            .sales
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Sale '{}' not found", id)))?;
        sale.status = status;
        sale.is_active = is_active;
        sale.updated_at = Utc::now();
        Ok(())
    }

    async fn set_invoice_id(&self, sale_id: &str, invoice_id: &str) -> Result<()> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let sale = store
            .sales
            .get_mut(sale_id)
            .ok_or_else(|| AppError::not_found(format!("Sale '{}' not found", sale_id)))?;
        sale.invoice_id = Some(invoice_id.to_string());
        sale.updated_at = Utc::now();
        Ok(())
    }

    async fn update_payment(&self, sale_id: &str, payment: &SalePayment) -> Result<()> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        let sale = store
            .sales
            .get_mut(sale_id)
            .ok_or_else(|| AppError::not_found(format!("Sale '{}' not found", sale_id)))?;
        sale.payment = payment.clone();
        sale.updated_at = Utc::now();
        Ok(())
    }
}
