use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::core::{round_money, AppError, Result};
use crate::modules::appointments::models::{Appointment, AppointmentStatus};
use crate::modules::appointments::repositories::AppointmentRepository;
use crate::modules::customers::repositories::CustomerRepository;
use crate::modules::inventory::models::MovementType;
use crate::modules::inventory::services::InventoryService;
use crate::modules::sales::models::{
    CompleteAppointmentRequest, CreateSaleRequest, PaymentStatus, Sale, SaleLineItem,
    SalePayment, SaleResponse, SaleStatus,
};
use crate::modules::sales::repositories::SaleRepository;
use crate::modules::sequences::{
    collision_backoff, DocumentFamily, SequenceGenerator, MAX_NUMBER_ATTEMPTS,
};
use crate::modules::taxes::services::GstCalculator;

/// Appointment completion result: the updated appointment plus the sale
/// spawned for dispensed items, when there were any.
#[derive(Debug, Serialize)]
pub struct CompletedAppointment {
    pub appointment: Appointment,
    pub sale: Option<SaleResponse>,
}

/// Sale engine: turns a validated cart into a committed sale.
///
/// A sale commits in two steps: persist the record, then decrement stock
/// per line. A decrement failure after the record is written rolls the
/// already-applied decrements back and cancels the record, so no sale is
/// ever left visible with under-decremented stock.
pub struct SaleService {
    sale_repo: Arc<dyn SaleRepository>,
    customer_repo: Arc<dyn CustomerRepository>,
    appointment_repo: Arc<dyn AppointmentRepository>,
    inventory: Arc<InventoryService>,
    calculator: GstCalculator,
    sequences: SequenceGenerator,
}

impl SaleService {
    pub fn new(
        sale_repo: Arc<dyn SaleRepository>,
        customer_repo: Arc<dyn CustomerRepository>,
        appointment_repo: Arc<dyn AppointmentRepository>,
        inventory: Arc<InventoryService>,
    ) -> Self {
        Self {
            sale_repo,
            customer_repo,
            appointment_repo,
            inventory,
            calculator: GstCalculator::new(),
            sequences: SequenceGenerator::new(),
        }
    }

    /// Creates a sale from a cart.
    pub async fn create_sale(&self, request: CreateSaleRequest) -> Result<SaleResponse> {
        if request.items.is_empty() {
            return Err(AppError::validation("Sale must have at least one item"));
        }

        self.customer_repo
            .find_owner(&request.owner_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Owner '{}' not found", request.owner_id))
            })?;

        if let Some(pet_id) = &request.pet_id {
            let pet = self
                .customer_repo
                .find_pet(pet_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Pet '{}' not found", pet_id)))?;
            if pet.owner_id != request.owner_id {
                return Err(AppError::validation(format!(
                    "Pet '{}' does not belong to owner '{}'",
                    pet_id, request.owner_id
                )));
            }
        }

        // Price every line against the catalog as it stands right now;
        // the snapshots keep these terms even if the catalog changes later.
        let mut lines = Vec::with_capacity(request.items.len());
        for line_request in &request.items {
            if line_request.quantity <= 0 {
                return Err(AppError::validation(format!(
                    "Quantity must be positive, got: {}",
                    line_request.quantity
                )));
            }

            let item = self.inventory.get_item(&line_request.item_id).await?;
            if !item.is_active {
                return Err(AppError::conflict(format!(
                    "Inventory item '{}' is inactive",
                    item.sku
                )));
            }
            if item.quantity < line_request.quantity {
                return Err(AppError::InsufficientStock {
                    sku: item.sku,
                    requested: line_request.quantity,
                    available: item.quantity,
                });
            }

            let unit_price = line_request.unit_price.unwrap_or(item.unit_price);
            let amounts = self.calculator.price_line(
                line_request.quantity,
                unit_price,
                line_request.discount,
                line_request.discount_type,
                &item.gst,
            )?;

            lines.push(SaleLineItem {
                item_id: item.id,
                sku: item.sku,
                name: item.name,
                hsn_sac_code: item.gst.hsn_sac_code.clone(),
                quantity: line_request.quantity,
                unit_price,
                discount: line_request.discount,
                discount_type: line_request.discount_type,
                gst_applicable: item.gst.applicable,
                gst_rate: item.gst.rate,
                gst_type: item.gst.gst_type,
                cess_rate: item.gst.cess_rate,
                subtotal: amounts.subtotal,
                discount_amount: amounts.discount_amount,
                taxable_amount: amounts.taxable_amount,
                gst_amount: amounts.gst_amount,
                cess_amount: amounts.cess_amount,
                total: amounts.total,
            });
        }

        // Lines are rounded individually, so plain sums reconcile exactly
        let subtotal = round_money(lines.iter().map(|l| l.subtotal).sum());
        let total_discount = round_money(lines.iter().map(|l| l.discount_amount).sum());
        let total_taxable = round_money(lines.iter().map(|l| l.taxable_amount).sum());
        let total_gst = round_money(lines.iter().map(|l| l.gst_amount).sum());
        let grand_total = round_money(lines.iter().map(|l| l.total).sum());

        let now = Utc::now();
        let tendered = request
            .payment
            .as_ref()
            .map(|p| p.paid_amount.max(Decimal::ZERO))
            .unwrap_or(Decimal::ZERO);
        let paid_amount = tendered.min(grand_total);
        let change_amount = round_money(tendered - paid_amount);
        let payment = SalePayment {
            method: request.payment.as_ref().map(|p| p.method).unwrap_or_default(),
            status: PaymentStatus::derive(paid_amount, grand_total),
            paid_amount,
            due_amount: round_money(grand_total - paid_amount),
            transaction_id: request
                .payment
                .as_ref()
                .and_then(|p| p.transaction_id.clone()),
            paid_at: (paid_amount > Decimal::ZERO).then_some(now),
        };

        // Number allocation and insert race against concurrent sales; the
        // unique index turns the loser's insert into a Conflict we retry.
        let mut attempt = 0;
        let sale = loop {
            attempt += 1;
            let sale_number = self
                .sequences
                .next_number(self.sale_repo.as_ref(), DocumentFamily::Sale, now)
                .await?;

            let candidate = Sale {
                id: Uuid::new_v4().to_string(),
                sale_number,
                owner_id: request.owner_id.clone(),
                pet_id: request.pet_id.clone(),
                items: lines.clone(),
                subtotal,
                total_discount,
                total_taxable,
                total_gst,
                grand_total,
                payment: payment.clone(),
                status: SaleStatus::Confirmed,
                invoice_id: None,
                notes: request.notes.clone(),
                is_active: true,
                created_at: now,
                updated_at: now,
            };

            match self.sale_repo.insert(&candidate).await {
                Ok(()) => break candidate,
                Err(err) if err.is_conflict() && attempt < MAX_NUMBER_ATTEMPTS => {
                    tracing::warn!(
                        attempt,
                        sale_number = %candidate.sale_number,
                        "Sale number collision, regenerating"
                    );
                    tokio::time::sleep(collision_backoff(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        };

        self.commit_decrements(&sale).await?;

        // Owner aggregates are best-effort; a failure here never unwinds
        // the committed sale.
        if let Err(err) = self
            .customer_repo
            .record_visit(&sale.owner_id, sale.grand_total, now)
            .await
        {
            tracing::warn!(
                owner_id = %sale.owner_id,
                error = %err,
                "Failed to update owner aggregates after sale"
            );
        }

        tracing::info!(
            sale_number = %sale.sale_number,
            grand_total = %sale.grand_total,
            items = sale.items.len(),
            "Sale created"
        );

        Ok(SaleResponse {
            sale,
            change_amount,
        })
    }

    /// Applies the per-line stock decrements for a freshly persisted sale,
    /// compensating and cancelling the record if any line fails.
    async fn commit_decrements(&self, sale: &Sale) -> Result<()> {
        for (index, line) in sale.items.iter().enumerate() {
            let result = self
                .inventory
                .adjust_stock(
                    &line.item_id,
                    -line.quantity,
                    MovementType::Sale,
                    "system",
                    None,
                    Some(sale.sale_number.clone()),
                )
                .await;

            if let Err(err) = result {
                tracing::error!(
                    sale_number = %sale.sale_number,
                    sku = %line.sku,
                    error = %err,
                    "Stock decrement failed after sale persisted, rolling back"
                );

                for restored in &sale.items[..index] {
                    if let Err(restore_err) = self
                        .inventory
                        .restore_stock(&restored.item_id, restored.quantity, &sale.sale_number)
                        .await
                    {
                        tracing::error!(
                            sale_number = %sale.sale_number,
                            sku = %restored.sku,
                            error = %restore_err,
                            "Compensating restore failed"
                        );
                    }
                }

                self.sale_repo
                    .update_status(&sale.id, SaleStatus::Cancelled, false)
                    .await?;

                return Err(err);
            }
        }
        Ok(())
    }

    pub async fn get_sale(&self, id: &str) -> Result<Sale> {
        self.sale_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale '{}' not found", id)))
    }

    pub async fn list_sales(&self, limit: i64, offset: i64) -> Result<Vec<Sale>> {
        self.sale_repo.list(limit, offset).await
    }

    /// Cancels a sale and returns its stock.
    pub async fn cancel_sale(&self, id: &str) -> Result<Sale> {
        let sale = self.get_sale(id).await?;

        match sale.status {
            SaleStatus::Delivered => {
                return Err(AppError::conflict(format!(
                    "Sale '{}' has been delivered and cannot be cancelled",
                    sale.sale_number
                )))
            }
            SaleStatus::Cancelled => {
                return Err(AppError::conflict(format!(
                    "Sale '{}' is already cancelled",
                    sale.sale_number
                )))
            }
            SaleStatus::Confirmed => {}
        }

        self.sale_repo
            .update_status(id, SaleStatus::Cancelled, false)
            .await?;

        for line in &sale.items {
            self.inventory
                .restore_stock(&line.item_id, line.quantity, &sale.sale_number)
                .await?;
        }

        tracing::info!(sale_number = %sale.sale_number, "Sale cancelled, stock restored");
        self.get_sale(id).await
    }

    /// Marks a confirmed sale as delivered, freezing it against cancellation.
    pub async fn mark_delivered(&self, id: &str) -> Result<Sale> {
        let sale = self.get_sale(id).await?;
        if sale.status != SaleStatus::Confirmed {
            return Err(AppError::conflict(format!(
                "Sale '{}' is {} and cannot be marked delivered",
                sale.sale_number, sale.status
            )));
        }

        self.sale_repo
            .update_status(id, SaleStatus::Delivered, true)
            .await?;
        self.get_sale(id).await
    }

    /// Completes an appointment, spawning a sale for dispensed items.
    ///
    /// Thin orchestration: all stock and tax handling goes through
    /// `create_sale` with the appointment's owner and pet.
    pub async fn complete_appointment(
        &self,
        appointment_id: &str,
        request: CompleteAppointmentRequest,
    ) -> Result<CompletedAppointment> {
        let appointment = self
            .appointment_repo
            .find_by_id(appointment_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Appointment '{}' not found", appointment_id))
            })?;

        match appointment.status {
            AppointmentStatus::Completed => {
                return Err(AppError::conflict(format!(
                    "Appointment '{}' is already completed",
                    appointment_id
                )))
            }
            AppointmentStatus::Cancelled => {
                return Err(AppError::conflict(format!(
                    "Appointment '{}' is cancelled",
                    appointment_id
                )))
            }
            AppointmentStatus::Scheduled => {}
        }

        let sale = if request.items.is_empty() {
            None
        } else {
            Some(
                self.create_sale(CreateSaleRequest {
                    owner_id: appointment.owner_id.clone(),
                    pet_id: appointment.pet_id.clone(),
                    items: request.items,
                    payment: request.payment,
                    notes: request.notes,
                })
                .await?,
            )
        };

        self.appointment_repo
            .mark_completed(appointment_id, sale.as_ref().map(|s| s.sale.id.as_str()))
            .await?;

        let appointment = self
            .appointment_repo
            .find_by_id(appointment_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Appointment '{}' not found", appointment_id))
            })?;

        Ok(CompletedAppointment { appointment, sale })
    }
}
