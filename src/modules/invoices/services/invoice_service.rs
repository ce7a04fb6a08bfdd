use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::core::{round_money, round_rupees, AppError, Result};
use crate::modules::customers::repositories::CustomerRepository;
use crate::modules::invoices::models::{
    BusinessSnapshot, CustomerSnapshot, GenerateInvoiceRequest, Invoice, InvoiceLineItem,
    InvoiceResponse, InvoiceStatus, UpdateTermsRequest,
};
use crate::modules::invoices::repositories::InvoiceRepository;
use crate::modules::sales::models::{PaymentStatus, Sale, SaleStatus};
use crate::modules::sales::repositories::SaleRepository;
use crate::modules::sequences::{
    collision_backoff, DocumentFamily, SequenceGenerator, MAX_NUMBER_ATTEMPTS,
};
use crate::modules::taxes::models::GstType;
use crate::modules::taxes::services::GstCalculator;

/// Payment terms applied when the caller does not supply a due date
const DEFAULT_DUE_DAYS: i64 = 30;

/// Invoice engine: derives the billing document from a committed sale.
///
/// At most one invoice ever derives from a sale; the per-line GST is
/// re-expressed in full component form from each line's taxable amount
/// and rate, and the payable figure is the grand total rounded to whole
/// rupees with the difference carried as round-off.
pub struct InvoiceService {
    invoice_repo: Arc<dyn InvoiceRepository>,
    sale_repo: Arc<dyn SaleRepository>,
    customer_repo: Arc<dyn CustomerRepository>,
    default_business: BusinessSnapshot,
    calculator: GstCalculator,
    sequences: SequenceGenerator,
}

impl InvoiceService {
    pub fn new(
        invoice_repo: Arc<dyn InvoiceRepository>,
        sale_repo: Arc<dyn SaleRepository>,
        customer_repo: Arc<dyn CustomerRepository>,
        default_business: BusinessSnapshot,
    ) -> Self {
        Self {
            invoice_repo,
            sale_repo,
            customer_repo,
            default_business,
            calculator: GstCalculator::new(),
            sequences: SequenceGenerator::new(),
        }
    }

    /// Derives the invoice for a sale.
    pub async fn generate_invoice(
        &self,
        request: GenerateInvoiceRequest,
    ) -> Result<InvoiceResponse> {
        let sale = self
            .sale_repo
            .find_by_id(&request.sale_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale '{}' not found", request.sale_id)))?;

        if sale.status == SaleStatus::Cancelled {
            return Err(AppError::conflict(format!(
                "Sale '{}' is cancelled and cannot be invoiced",
                sale.sale_number
            )));
        }
        if sale.items.is_empty() {
            return Err(AppError::validation(format!(
                "Sale '{}' has no items to invoice",
                sale.sale_number
            )));
        }

        if let Some(existing) = self.invoice_repo.find_by_sale_id(&sale.id).await? {
            return Err(AppError::conflict(format!(
                "Invoice '{}' already exists for sale '{}'",
                existing.invoice_number, sale.sale_number
            )));
        }

        let owner = self
            .customer_repo
            .find_owner(&sale.owner_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Owner '{}' not found", sale.owner_id)))?;

        let customer = CustomerSnapshot {
            name: owner.name,
            email: owner.email,
            phone: owner.phone,
            address: owner.address,
            gst_number: owner.gst_number,
        };
        let business = request.business.unwrap_or_else(|| self.default_business.clone());

        // Re-expand every line's GST into explicit components from its
        // stored taxable amount and rate
        let mut items = Vec::with_capacity(sale.items.len());
        for line in &sale.items {
            let gst_type = if line.gst_applicable {
                line.gst_type
            } else {
                GstType::Exempt
            };
            let split = self.calculator.split(
                line.taxable_amount,
                line.gst_rate,
                gst_type,
                line.cess_rate,
            )?;

            let total = round_money(line.taxable_amount + split.total_tax);
            items.push(InvoiceLineItem {
                item_id: line.item_id.clone(),
                sku: line.sku.clone(),
                name: line.name.clone(),
                hsn_sac_code: line.hsn_sac_code.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
                discount_amount: line.discount_amount,
                taxable_amount: line.taxable_amount,
                gst_rate: line.gst_rate,
                gst_type,
                cgst_rate: split.cgst_rate,
                cgst_amount: split.cgst_amount,
                sgst_rate: split.sgst_rate,
                sgst_amount: split.sgst_amount,
                igst_rate: split.igst_rate,
                igst_amount: split.igst_amount,
                cess_rate: line.cess_rate,
                cess_amount: split.cess_amount,
                total,
            });
        }

        let subtotal = round_money(items.iter().map(|i| i.subtotal).sum());
        let total_discount = round_money(items.iter().map(|i| i.discount_amount).sum());
        let total_taxable = round_money(items.iter().map(|i| i.taxable_amount).sum());
        let total_cgst = round_money(items.iter().map(|i| i.cgst_amount).sum());
        let total_sgst = round_money(items.iter().map(|i| i.sgst_amount).sum());
        let total_igst = round_money(items.iter().map(|i| i.igst_amount).sum());
        let total_cess = round_money(items.iter().map(|i| i.cess_amount).sum());
        let grand_total = round_money(items.iter().map(|i| i.total).sum());
        let final_amount = round_rupees(grand_total);
        let round_off = round_money(final_amount - grand_total);

        let now = Utc::now();
        let due_date = request
            .due_date
            .unwrap_or_else(|| now + Duration::days(DEFAULT_DUE_DAYS));

        let mut attempt = 0;
        let invoice = loop {
            attempt += 1;
            let invoice_number = self
                .sequences
                .next_number(self.invoice_repo.as_ref(), DocumentFamily::Invoice, now)
                .await?;

            let candidate = Invoice {
                id: Uuid::new_v4().to_string(),
                invoice_number,
                sale_id: sale.id.clone(),
                sale_number: sale.sale_number.clone(),
                customer: customer.clone(),
                business: business.clone(),
                items: items.clone(),
                subtotal,
                total_discount,
                total_taxable,
                total_cgst,
                total_sgst,
                total_igst,
                total_cess,
                grand_total,
                round_off,
                final_amount,
                issue_date: now,
                due_date,
                terms: request.terms.clone(),
                status: InvoiceStatus::Issued,
                is_active: true,
                created_at: now,
                updated_at: now,
            };

            match self.invoice_repo.insert(&candidate).await {
                Ok(()) => break candidate,
                Err(err) if err.is_conflict() && attempt < MAX_NUMBER_ATTEMPTS => {
                    tracing::warn!(
                        attempt,
                        invoice_number = %candidate.invoice_number,
                        "Invoice number collision, regenerating"
                    );
                    tokio::time::sleep(collision_backoff(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        };

        self.sale_repo.set_invoice_id(&sale.id, &invoice.id).await?;

        tracing::info!(
            invoice_number = %invoice.invoice_number,
            sale_number = %sale.sale_number,
            final_amount = %invoice.final_amount,
            "Invoice generated"
        );

        let payment = invoice.payment_view(&sale);
        Ok(InvoiceResponse { invoice, payment })
    }

    pub async fn get_invoice(&self, id: &str) -> Result<InvoiceResponse> {
        let invoice = self
            .invoice_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice '{}' not found", id)))?;

        let sale = self.linked_sale(&invoice).await?;
        let payment = invoice.payment_view(&sale);
        Ok(InvoiceResponse { invoice, payment })
    }

    /// Cancels an unpaid invoice. Inventory is untouched: stock reversal
    /// is governed by cancelling the sale, separately.
    pub async fn cancel_invoice(&self, id: &str) -> Result<InvoiceResponse> {
        let invoice = self
            .invoice_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice '{}' not found", id)))?;

        if invoice.status == InvoiceStatus::Cancelled {
            return Err(AppError::conflict(format!(
                "Invoice '{}' is already cancelled",
                invoice.invoice_number
            )));
        }

        let sale = self.linked_sale(&invoice).await?;
        if invoice.payment_view(&sale).status == PaymentStatus::Paid {
            return Err(AppError::conflict(format!(
                "Invoice '{}' is paid and cannot be cancelled",
                invoice.invoice_number
            )));
        }

        self.invoice_repo
            .update_status(id, InvoiceStatus::Cancelled, false)
            .await?;

        tracing::info!(invoice_number = %invoice.invoice_number, "Invoice cancelled");
        self.get_invoice(id).await
    }

    /// Adjusts the post-issue mutable fields: due date and terms.
    pub async fn update_terms(
        &self,
        id: &str,
        request: UpdateTermsRequest,
    ) -> Result<InvoiceResponse> {
        let invoice = self
            .invoice_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice '{}' not found", id)))?;

        if invoice.status == InvoiceStatus::Cancelled {
            return Err(AppError::conflict(format!(
                "Invoice '{}' is cancelled",
                invoice.invoice_number
            )));
        }

        self.invoice_repo
            .update_terms(id, request.due_date, request.terms)
            .await?;
        self.get_invoice(id).await
    }

    async fn linked_sale(&self, invoice: &Invoice) -> Result<Sale> {
        self.sale_repo
            .find_by_id(&invoice.sale_id)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Sale '{}' behind invoice '{}' is missing",
                    invoice.sale_id, invoice.invoice_number
                ))
            })
    }
}
