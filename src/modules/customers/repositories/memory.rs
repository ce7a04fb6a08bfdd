use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::core::Result;
use crate::modules::customers::models::{Owner, Pet};

use super::CustomerRepository;

/// In-memory customer store for service-level tests and demos.
#[derive(Default)]
pub struct MemoryCustomerRepository {
    owners: Mutex<HashMap<String, Owner>>,
    pets: Mutex<HashMap<String, Pet>>,
}

impl MemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_owner(&self, owner: Owner) {
        self.owners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(owner.id.clone(), owner);
    }

    pub fn add_pet(&self, pet: Pet) {
        self.pets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(pet.id.clone(), pet);
    }
}

#[async_trait]
impl CustomerRepository for MemoryCustomerRepository {
    async fn find_owner(&self, owner_id: &str) -> Result<Option<Owner>> {
        Ok(self
            .owners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(owner_id)
            .cloned())
    }

    async fn find_pet(&self, pet_id: &str) -> Result<Option<Pet>> {
        Ok(self
            .pets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(pet_id)
            .cloned())
    }

    async fn record_visit(
        &self,
        owner_id: &str,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut owners = self.owners.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(owner) = owners.get_mut(owner_id) {
            owner.total_spent += amount;
            owner.last_visit = Some(at);
        }
        Ok(())
    }
}
