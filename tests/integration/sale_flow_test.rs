// End-to-end sale engine behavior over in-memory storage: cart
// validation, totals reconciliation, stock commitment, cancellation
// round-trips, and the rollback path when a decrement fails after the
// sale record is already persisted.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use pawledger::core::{AppError, Result};
use pawledger::modules::appointments::models::AppointmentStatus;
use pawledger::modules::customers::repositories::CustomerRepository;
use pawledger::modules::inventory::models::{
    InventoryItem, MovementType, NewStockMovement, StockMovement,
};
use pawledger::modules::inventory::repositories::{
    InventoryRepository, MemoryInventoryRepository,
};
use pawledger::modules::inventory::services::{InventoryService, LogLowStockNotifier};
use pawledger::modules::sales::models::{
    CompleteAppointmentRequest, CreateSaleRequest, PaymentMethod, PaymentStatus,
    SalePaymentRequest, SaleStatus,
};
use pawledger::modules::sales::repositories::SaleRepository;
use pawledger::modules::sales::services::SaleService;
use pawledger::modules::taxes::models::GstType;

#[path = "../support/mod.rs"]
mod support;

use support::{cart_line, engine};

#[tokio::test]
async fn test_create_sale_reconciles_totals_and_commits_stock() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    let food = engine
        .add_item("FOOD-10KG", dec!(100), 10, dec!(18), GstType::CgstSgst)
        .await;
    let shampoo = engine
        .add_item("SHMP-500", dec!(250), 4, dec!(12), GstType::CgstSgst)
        .await;

    let response = engine
        .sales
        .create_sale(CreateSaleRequest {
            owner_id: "owner-1".to_string(),
            pet_id: None,
            items: vec![
                cart_line(&food.id, 2, dec!(10)),
                cart_line(&shampoo.id, 1, Decimal::ZERO),
            ],
            payment: None,
            notes: None,
        })
        .await
        .unwrap();

    let sale = &response.sale;
    assert!(sale.sale_number.starts_with("SAL-"));
    assert_eq!(sale.items.len(), 2);
    assert_eq!(sale.status, SaleStatus::Confirmed);

    // Line identities and sale-level reconciliation
    for line in &sale.items {
        assert_eq!(line.taxable_amount, line.subtotal - line.discount_amount);
        assert_eq!(line.total, line.taxable_amount + line.gst_amount);
    }
    let line_sum: Decimal = sale.items.iter().map(|l| l.total).sum();
    assert_eq!(sale.grand_total, line_sum);
    assert_eq!(sale.grand_total, dec!(492.40)); // 212.40 + 280.00

    // Unpaid by default
    assert_eq!(sale.payment.status, PaymentStatus::Pending);
    assert_eq!(sale.payment.due_amount, sale.grand_total);
    assert_eq!(response.change_amount, Decimal::ZERO);

    // Stock came down and the movements carry the sale number
    let food_after = engine.inventory.get_item(&food.id).await.unwrap();
    assert_eq!(food_after.quantity, 8);
    assert_eq!(food_after.total_sold, 2);
    let movements = engine.inventory.movement_history(&food.id).await.unwrap();
    let sale_movements: Vec<&StockMovement> = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::Sale)
        .collect();
    assert_eq!(sale_movements.len(), 1);
    assert_eq!(sale_movements[0].quantity_change, -2);
    assert_eq!(
        sale_movements[0].reference.as_deref(),
        Some(sale.sale_number.as_str())
    );

    // Owner aggregates were bumped
    let owner = engine
        .customer_repo
        .find_owner("owner-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner.total_spent, sale.grand_total);
    assert!(owner.last_visit.is_some());
}

#[tokio::test]
async fn test_snapshot_survives_catalog_edits() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    let item = engine
        .add_item("FOOD-10KG", dec!(100), 10, dec!(18), GstType::CgstSgst)
        .await;

    let response = engine
        .sales
        .create_sale(CreateSaleRequest {
            owner_id: "owner-1".to_string(),
            pet_id: None,
            items: vec![cart_line(&item.id, 1, Decimal::ZERO)],
            payment: None,
            notes: None,
        })
        .await
        .unwrap();

    // Deactivate the item after the sale; the stored snapshot keeps the
    // original name, price and GST terms
    engine.inventory.deactivate_item(&item.id).await.unwrap();
    let sale = engine.sales.get_sale(&response.sale.id).await.unwrap();
    assert_eq!(sale.items[0].sku, "FOOD-10KG");
    assert_eq!(sale.items[0].unit_price, dec!(100));
    assert_eq!(sale.items[0].gst_rate, dec!(18));
}

#[tokio::test]
async fn test_insufficient_stock_rejects_and_leaves_stock_untouched() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    let item = engine
        .add_item("FOOD-10KG", dec!(100), 3, dec!(18), GstType::CgstSgst)
        .await;

    let result = engine
        .sales
        .create_sale(CreateSaleRequest {
            owner_id: "owner-1".to_string(),
            pet_id: None,
            items: vec![cart_line(&item.id, 5, Decimal::ZERO)],
            payment: None,
            notes: None,
        })
        .await;

    match result {
        Err(AppError::InsufficientStock {
            requested,
            available,
            ..
        }) => {
            assert_eq!(requested, 5);
            assert_eq!(available, 3);
        }
        other => panic!("Expected InsufficientStock, got {:?}", other.map(|r| r.sale.id)),
    }

    let after = engine.inventory.get_item(&item.id).await.unwrap();
    assert_eq!(after.quantity, 3);
    assert!(engine.sale_repo.list(10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_identity_validation() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    engine.add_owner("owner-2", "Vikram Shetty");
    engine.add_pet("pet-1", "owner-1", "Bruno");
    let item = engine
        .add_item("FOOD-10KG", dec!(100), 10, dec!(18), GstType::CgstSgst)
        .await;

    // Unknown owner
    let result = engine
        .sales
        .create_sale(CreateSaleRequest {
            owner_id: "nobody".to_string(),
            pet_id: None,
            items: vec![cart_line(&item.id, 1, Decimal::ZERO)],
            payment: None,
            notes: None,
        })
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    // Pet belongs to a different owner
    let result = engine
        .sales
        .create_sale(CreateSaleRequest {
            owner_id: "owner-2".to_string(),
            pet_id: Some("pet-1".to_string()),
            items: vec![cart_line(&item.id, 1, Decimal::ZERO)],
            payment: None,
            notes: None,
        })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Empty cart
    let result = engine
        .sales
        .create_sale(CreateSaleRequest {
            owner_id: "owner-1".to_string(),
            pet_id: None,
            items: vec![],
            payment: None,
            notes: None,
        })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Unknown item
    let result = engine
        .sales
        .create_sale(CreateSaleRequest {
            owner_id: "owner-1".to_string(),
            pet_id: None,
            items: vec![cart_line("missing", 1, Decimal::ZERO)],
            payment: None,
            notes: None,
        })
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_overpayment_reports_change_not_negative_due() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    let item = engine
        .add_item("FOOD-10KG", dec!(100), 10, dec!(18), GstType::CgstSgst)
        .await;

    let response = engine
        .sales
        .create_sale(CreateSaleRequest {
            owner_id: "owner-1".to_string(),
            pet_id: None,
            items: vec![cart_line(&item.id, 2, dec!(10))],
            payment: Some(SalePaymentRequest {
                method: PaymentMethod::Cash,
                paid_amount: dec!(250),
                transaction_id: None,
            }),
            notes: None,
        })
        .await
        .unwrap();

    // Grand total 212.40; 250 tendered
    assert_eq!(response.sale.payment.paid_amount, dec!(212.40));
    assert_eq!(response.sale.payment.due_amount, Decimal::ZERO);
    assert_eq!(response.sale.payment.status, PaymentStatus::Paid);
    assert_eq!(response.change_amount, dec!(37.60));
}

#[tokio::test]
async fn test_cancel_sale_round_trips_stock() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    let item = engine
        .add_item("FOOD-10KG", dec!(100), 10, dec!(18), GstType::CgstSgst)
        .await;

    let response = engine
        .sales
        .create_sale(CreateSaleRequest {
            owner_id: "owner-1".to_string(),
            pet_id: None,
            items: vec![cart_line(&item.id, 2, Decimal::ZERO)],
            payment: None,
            notes: None,
        })
        .await
        .unwrap();

    assert_eq!(
        engine.inventory.get_item(&item.id).await.unwrap().quantity,
        8
    );

    let cancelled = engine.sales.cancel_sale(&response.sale.id).await.unwrap();
    assert_eq!(cancelled.status, SaleStatus::Cancelled);
    assert!(!cancelled.is_active);
    assert_eq!(
        engine.inventory.get_item(&item.id).await.unwrap().quantity,
        10
    );

    // The compensating movement references the sale number
    let movements = engine.inventory.movement_history(&item.id).await.unwrap();
    assert!(movements.iter().any(|m| {
        m.movement_type == MovementType::Adjustment
            && m.quantity_change == 2
            && m.reference.as_deref() == Some(response.sale.sale_number.as_str())
    }));

    // A cancelled sale stays cancelled
    let again = engine.sales.cancel_sale(&response.sale.id).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_delivered_sale_cannot_be_cancelled() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    let item = engine
        .add_item("FOOD-10KG", dec!(100), 10, dec!(18), GstType::CgstSgst)
        .await;

    let response = engine
        .sales
        .create_sale(CreateSaleRequest {
            owner_id: "owner-1".to_string(),
            pet_id: None,
            items: vec![cart_line(&item.id, 1, Decimal::ZERO)],
            payment: None,
            notes: None,
        })
        .await
        .unwrap();

    let delivered = engine.sales.mark_delivered(&response.sale.id).await.unwrap();
    assert_eq!(delivered.status, SaleStatus::Delivered);

    let result = engine.sales.cancel_sale(&response.sale.id).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert_eq!(
        engine.inventory.get_item(&item.id).await.unwrap().quantity,
        9
    );
}

#[tokio::test]
async fn test_complete_appointment_spawns_sale() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    engine.add_pet("pet-1", "owner-1", "Bruno");
    engine.add_appointment("appt-1", "owner-1", Some("pet-1")).await;
    let item = engine
        .add_item("MEDS-DEWORM", dec!(80), 20, Decimal::ZERO, GstType::Exempt)
        .await;

    let completed = engine
        .sales
        .complete_appointment(
            "appt-1",
            CompleteAppointmentRequest {
                items: vec![cart_line(&item.id, 2, Decimal::ZERO)],
                payment: None,
                notes: Some("post-checkup meds".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(completed.appointment.status, AppointmentStatus::Completed);
    let sale = completed.sale.expect("sale spawned for dispensed items");
    assert_eq!(sale.sale.pet_id.as_deref(), Some("pet-1"));
    assert_eq!(completed.appointment.sale_id.as_deref(), Some(sale.sale.id.as_str()));
    assert_eq!(
        engine.inventory.get_item(&item.id).await.unwrap().quantity,
        18
    );

    // Completing again is rejected
    let again = engine
        .sales
        .complete_appointment(
            "appt-1",
            CompleteAppointmentRequest {
                items: vec![],
                payment: None,
                notes: None,
            },
        )
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_complete_appointment_without_items_spawns_no_sale() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    engine.add_appointment("appt-1", "owner-1", None).await;

    let completed = engine
        .sales
        .complete_appointment(
            "appt-1",
            CompleteAppointmentRequest {
                items: vec![],
                payment: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(completed.appointment.status, AppointmentStatus::Completed);
    assert!(completed.sale.is_none());
    assert!(engine.sale_repo.list(10, 0).await.unwrap().is_empty());
}

/// Inventory repository that fails adjustments for one designated item,
/// simulating a mid-commit storage failure.
struct FlakyInventoryRepository {
    inner: MemoryInventoryRepository,
    fail_item_id: Mutex<Option<String>>,
}

impl FlakyInventoryRepository {
    fn new() -> Self {
        Self {
            inner: MemoryInventoryRepository::new(),
            fail_item_id: Mutex::new(None),
        }
    }

    fn fail_for(&self, item_id: &str) {
        *self.fail_item_id.lock().unwrap() = Some(item_id.to_string());
    }
}

#[async_trait]
impl InventoryRepository for FlakyInventoryRepository {
    async fn insert(&self, item: &InventoryItem) -> Result<()> {
        self.inner.insert(item).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<InventoryItem>> {
        self.inner.find_by_id(id).await
    }

    async fn list_active(&self) -> Result<Vec<InventoryItem>> {
        self.inner.list_active().await
    }

    async fn adjust_quantity(
        &self,
        item_id: &str,
        movement: NewStockMovement,
    ) -> Result<InventoryItem> {
        let failing = self.fail_item_id.lock().unwrap().clone();
        if movement.movement_type == MovementType::Sale && failing.as_deref() == Some(item_id) {
            return Err(AppError::internal("simulated storage failure"));
        }
        self.inner.adjust_quantity(item_id, movement).await
    }

    async fn movements(&self, item_id: &str) -> Result<Vec<StockMovement>> {
        self.inner.movements(item_id).await
    }

    async fn deactivate(&self, id: &str) -> Result<()> {
        self.inner.deactivate(id).await
    }
}

#[tokio::test]
async fn test_decrement_failure_rolls_back_and_cancels_sale() {
    // Assemble an engine whose inventory storage fails on the second line
    let flaky = Arc::new(FlakyInventoryRepository::new());
    let base = engine();
    let inventory = Arc::new(InventoryService::new(
        flaky.clone(),
        base.customer_repo.clone(),
        Arc::new(LogLowStockNotifier),
    ));
    let sales = Arc::new(SaleService::new(
        base.sale_repo.clone(),
        base.customer_repo.clone(),
        base.appointment_repo.clone(),
        inventory.clone(),
    ));

    base.add_owner("owner-1", "Asha Rao");
    let first = inventory
        .create_item(pawledger::modules::inventory::models::CreateItemRequest {
            sku: "FOOD-10KG".to_string(),
            name: "Dog food 10kg".to_string(),
            category: "food".to_string(),
            quantity: 10,
            unit_price: dec!(100),
            min_stock: 0,
            gst: None,
        })
        .await
        .unwrap();
    let second = inventory
        .create_item(pawledger::modules::inventory::models::CreateItemRequest {
            sku: "SHMP-500".to_string(),
            name: "Shampoo 500ml".to_string(),
            category: "grooming".to_string(),
            quantity: 5,
            unit_price: dec!(250),
            min_stock: 0,
            gst: None,
        })
        .await
        .unwrap();

    flaky.fail_for(&second.id);

    let result = sales
        .create_sale(CreateSaleRequest {
            owner_id: "owner-1".to_string(),
            pet_id: None,
            items: vec![
                cart_line(&first.id, 3, Decimal::ZERO),
                cart_line(&second.id, 1, Decimal::ZERO),
            ],
            payment: None,
            notes: None,
        })
        .await;

    assert!(matches!(result, Err(AppError::Internal(_))));

    // First line's decrement was compensated
    assert_eq!(inventory.get_item(&first.id).await.unwrap().quantity, 10);
    assert_eq!(inventory.get_item(&second.id).await.unwrap().quantity, 5);

    // The persisted sale was cancelled, not left dangling
    let sales_on_file = base.sale_repo.list(10, 0).await.unwrap();
    assert_eq!(sales_on_file.len(), 1);
    assert_eq!(sales_on_file[0].status, SaleStatus::Cancelled);
    assert!(!sales_on_file[0].is_active);
}
