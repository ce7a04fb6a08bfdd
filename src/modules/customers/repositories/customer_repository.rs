use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{MySqlPool, Row};

use crate::core::Result;
use crate::modules::customers::models::{Owner, Pet};

/// Read-mostly port over owner and pet identity.
///
/// `record_visit` is the one write: the owner aggregate bump after a
/// committed sale. Callers treat its failure as non-fatal.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_owner(&self, owner_id: &str) -> Result<Option<Owner>>;

    async fn find_pet(&self, pet_id: &str) -> Result<Option<Pet>>;

    /// Adds `amount` to the owner's running spend and stamps the visit.
    async fn record_visit(&self, owner_id: &str, amount: Decimal, at: DateTime<Utc>)
        -> Result<()>;
}

/// MySQL-backed customer repository
pub struct MySqlCustomerRepository {
    pool: MySqlPool,
}

impl MySqlCustomerRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for MySqlCustomerRepository {
    async fn find_owner(&self, owner_id: &str) -> Result<Option<Owner>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, phone, address, gst_number,
                   total_spent, last_visit, created_at
            FROM owners
            WHERE id = ?
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Owner {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                phone: row.try_get("phone")?,
                address: row.try_get("address")?,
                gst_number: row.try_get("gst_number")?,
                total_spent: row.try_get("total_spent")?,
                last_visit: row.try_get("last_visit")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    async fn find_pet(&self, pet_id: &str) -> Result<Option<Pet>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, species
            FROM pets
            WHERE id = ?
            "#,
        )
        .bind(pet_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Pet {
                id: row.try_get("id")?,
                owner_id: row.try_get("owner_id")?,
                name: row.try_get("name")?,
                species: row.try_get("species")?,
            })
        })
        .transpose()
    }

    async fn record_visit(
        &self,
        owner_id: &str,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE owners
            SET total_spent = total_spent + ?, last_visit = ?
            WHERE id = ?
            "#,
        )
        .bind(amount)
        .bind(at)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
