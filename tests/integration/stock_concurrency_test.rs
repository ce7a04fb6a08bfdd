// Concurrent sales of one SKU must never oversell: the guard and the
// decrement are a single atomic step in the repository, so N racing
// decrements against a stock of S leave exactly max(0, S - N) behind.

use rust_decimal_macros::dec;

use pawledger::core::AppError;
use pawledger::modules::inventory::models::MovementType;
use pawledger::modules::taxes::models::GstType;

#[path = "../support/mod.rs"]
mod support;

use support::engine;

#[tokio::test]
async fn test_racing_decrements_never_oversell() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    let item = engine
        .add_item("FOOD-10KG", dec!(100), 12, dec!(18), GstType::CgstSgst)
        .await;

    let mut handles = Vec::new();
    for worker in 0..20 {
        let inventory = engine.inventory.clone();
        let item_id = item.id.clone();
        handles.push(tokio::spawn(async move {
            inventory
                .adjust_stock(
                    &item_id,
                    -1,
                    MovementType::Sale,
                    "system",
                    Some(format!("till-{}", worker)),
                    None,
                )
                .await
        }));
    }

    let mut sold = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => sold += 1,
            Err(AppError::InsufficientStock { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(sold, 12);
    assert_eq!(rejected, 8);

    let after = engine.inventory.get_item(&item.id).await.unwrap();
    assert_eq!(after.quantity, 0);
    assert_eq!(after.total_sold, 12);

    // Every committed decrement left its movement; rejected ones left none
    let movements = engine.inventory.movement_history(&item.id).await.unwrap();
    let sale_movements = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::Sale)
        .count();
    assert_eq!(sale_movements, 12);
}

#[tokio::test]
async fn test_mixed_restock_and_sales_stay_non_negative() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    let item = engine
        .add_item("SHMP-500", dec!(250), 2, dec!(12), GstType::CgstSgst)
        .await;

    // Sell out, restock, sell again; an oversell in between is rejected
    engine
        .inventory
        .adjust_stock(&item.id, -2, MovementType::Sale, "system", None, None)
        .await
        .unwrap();

    let oversell = engine
        .inventory
        .adjust_stock(&item.id, -1, MovementType::Sale, "system", None, None)
        .await;
    assert!(matches!(oversell, Err(AppError::InsufficientStock { .. })));

    engine
        .inventory
        .adjust_stock(
            &item.id,
            5,
            MovementType::Purchase,
            "system",
            Some("restock".to_string()),
            None,
        )
        .await
        .unwrap();

    let after = engine
        .inventory
        .adjust_stock(&item.id, -3, MovementType::Sale, "system", None, None)
        .await
        .unwrap();
    assert_eq!(after.quantity, 2);
    assert_eq!(after.total_sold, 5);

    // Replaying the movement log reconstructs the quantity
    let movements = engine.inventory.movement_history(&item.id).await.unwrap();
    let replayed: i32 = 2 + movements.iter().map(|m| m.quantity_change).sum::<i32>();
    assert_eq!(replayed, after.quantity);
}

#[tokio::test]
async fn test_sell_to_pet_validates_identity_and_records_usage() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    engine.add_owner("owner-2", "Vikram Shetty");
    engine.add_pet("pet-1", "owner-1", "Bruno");
    let item = engine
        .add_item("MEDS-DEWORM", dec!(80), 5, rust_decimal::Decimal::ZERO, GstType::Exempt)
        .await;

    let after = engine
        .inventory
        .sell_to_pet(&item.id, "pet-1", "owner-1", 2, "dr-mehta", None)
        .await
        .unwrap();
    assert_eq!(after.quantity, 3);
    assert_eq!(after.total_sold, 2);

    let movements = engine.inventory.movement_history(&item.id).await.unwrap();
    assert!(movements.iter().any(|m| {
        m.movement_type == MovementType::Sale
            && m.reference.as_deref() == Some("pet:pet-1")
            && m.actor == "dr-mehta"
    }));

    // Pet belonging to a different owner
    let mismatch = engine
        .inventory
        .sell_to_pet(&item.id, "pet-1", "owner-2", 1, "dr-mehta", None)
        .await;
    assert!(matches!(mismatch, Err(AppError::Validation(_))));

    // Unknown pet
    let missing = engine
        .inventory
        .sell_to_pet(&item.id, "ghost", "owner-1", 1, "dr-mehta", None)
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    // Stock untouched by the rejections
    assert_eq!(engine.inventory.get_item(&item.id).await.unwrap().quantity, 3);
}

#[tokio::test]
async fn test_inactive_item_rejects_sales_but_not_restocks() {
    let engine = engine();
    engine.add_owner("owner-1", "Asha Rao");
    let item = engine
        .add_item("MEDS-DEWORM", dec!(80), 5, rust_decimal::Decimal::ZERO, GstType::Exempt)
        .await;

    engine.inventory.deactivate_item(&item.id).await.unwrap();

    let sale = engine
        .inventory
        .adjust_stock(&item.id, -1, MovementType::Sale, "system", None, None)
        .await;
    assert!(matches!(sale, Err(AppError::Conflict(_))));

    // Returns and corrections still apply to a deactivated item
    let restored = engine
        .inventory
        .restore_stock(&item.id, 1, "SAL-202508-0001")
        .await
        .unwrap();
    assert_eq!(restored.quantity, 6);
}
