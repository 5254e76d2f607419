//! Ledger tests: count set-semantics, receipts and last-cost movement,
//! transfer conservation, waste checks, count correction and deletion, and
//! same-key write serialization.

mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use uuid::Uuid;

use backline_engine::{entities::UnitKind, errors::ServiceError};

use common::{create_base_unit, create_item, create_unit, day, TestEngine};

#[tokio::test]
async fn a_count_sets_on_hand_rather_than_adding() {
    let harness = TestEngine::new();
    let engine = &harness.engine;

    let oz = create_base_unit(engine, "ounce").await;
    let item = create_item(engine, "flour", oz, dec!(0.10), dec!(100)).await;
    let location = Uuid::new_v4();

    let count = engine.ledger.create_count(location, Some(day(1))).await.unwrap();
    engine.ledger.apply_count(count, item, dec!(50), oz).await.unwrap();
    engine.ledger.apply_count(count, item, dec!(50), oz).await.unwrap();

    assert_eq!(engine.ledger.on_hand(item, location).await.unwrap(), dec!(50));
}

#[tokio::test]
async fn count_lines_snapshot_the_cost_in_effect() {
    let harness = TestEngine::new();
    let engine = &harness.engine;

    let oz = create_base_unit(engine, "ounce").await;
    let item = create_item(engine, "flour", oz, dec!(0.25), dec!(100)).await;
    let location = Uuid::new_v4();

    let count = engine.ledger.create_count(location, Some(day(1))).await.unwrap();
    let line_id = engine
        .ledger
        .apply_count(count, item, dec!(40), oz)
        .await
        .unwrap();

    let line = engine.store.get_count_line(line_id).await.unwrap().unwrap();
    assert_eq!(line.unit_cost_snapshot, dec!(0.25));
    assert_eq!(line.derived_base_units, dec!(40));
}

#[tokio::test]
async fn receipts_add_stock_and_move_last_cost() {
    let harness = TestEngine::new();
    let engine = &harness.engine;

    let oz = create_base_unit(engine, "ounce").await;
    // A 10 oz case unit.
    let case = create_unit(engine, "case", UnitKind::Mass, dec!(10)).await;
    let item = create_item(engine, "butter", oz, dec!(0.20), dec!(100)).await;
    let location = Uuid::new_v4();

    engine
        .ledger
        .apply_receipt(
            Uuid::new_v4(),
            item,
            location,
            dec!(2),
            case,
            dec!(30.00),
            Some(day(2)),
        )
        .await
        .unwrap();

    assert_eq!(engine.ledger.on_hand(item, location).await.unwrap(), dec!(20));
    // price_each / derived_base_units = 30 / 20
    let updated = engine.store.get_item(item).await.unwrap().unwrap();
    assert_eq!(updated.last_cost, dec!(1.50));
}

#[tokio::test]
async fn transfers_conserve_total_stock() {
    let harness = TestEngine::new();
    let engine = &harness.engine;

    let oz = create_base_unit(engine, "ounce").await;
    let item = create_item(engine, "sugar", oz, dec!(0.05), dec!(100)).await;
    let (kitchen, bar) = (Uuid::new_v4(), Uuid::new_v4());

    let count = engine.ledger.create_count(kitchen, Some(day(1))).await.unwrap();
    engine.ledger.apply_count(count, item, dec!(100), oz).await.unwrap();

    engine
        .ledger
        .apply_transfer(item, kitchen, bar, dec!(30), oz, Some(day(2)))
        .await
        .unwrap();

    let kitchen_on_hand = engine.ledger.on_hand(item, kitchen).await.unwrap();
    let bar_on_hand = engine.ledger.on_hand(item, bar).await.unwrap();
    assert_eq!(kitchen_on_hand, dec!(70));
    assert_eq!(bar_on_hand, dec!(30));
    assert_eq!(kitchen_on_hand + bar_on_hand, dec!(100));
}

#[tokio::test]
async fn oversized_transfers_are_rejected_and_leave_both_sides_unchanged() {
    let harness = TestEngine::new();
    let engine = &harness.engine;

    let oz = create_base_unit(engine, "ounce").await;
    let item = create_item(engine, "sugar", oz, dec!(0.05), dec!(100)).await;
    let (kitchen, bar) = (Uuid::new_v4(), Uuid::new_v4());

    let count = engine.ledger.create_count(kitchen, Some(day(1))).await.unwrap();
    engine.ledger.apply_count(count, item, dec!(10), oz).await.unwrap();

    let result = engine
        .ledger
        .apply_transfer(item, kitchen, bar, dec!(11), oz, Some(day(2)))
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientInventory(_)));

    assert_eq!(engine.ledger.on_hand(item, kitchen).await.unwrap(), dec!(10));
    assert_eq!(engine.ledger.on_hand(item, bar).await.unwrap(), dec!(0));
}

#[tokio::test]
async fn transfers_to_the_same_location_are_invalid() {
    let harness = TestEngine::new();
    let engine = &harness.engine;

    let oz = create_base_unit(engine, "ounce").await;
    let item = create_item(engine, "sugar", oz, dec!(0.05), dec!(100)).await;
    let kitchen = Uuid::new_v4();

    let result = engine
        .ledger
        .apply_transfer(item, kitchen, kitchen, dec!(1), oz, None)
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn waste_subtracts_and_refuses_to_go_negative() {
    let harness = TestEngine::new();
    let engine = &harness.engine;

    let oz = create_base_unit(engine, "ounce").await;
    let item = create_item(engine, "cream", oz, dec!(0.30), dec!(100)).await;
    let walk_in = Uuid::new_v4();

    let count = engine.ledger.create_count(walk_in, Some(day(1))).await.unwrap();
    engine.ledger.apply_count(count, item, dec!(8), oz).await.unwrap();

    engine
        .ledger
        .apply_waste(item, walk_in, dec!(3), oz, "spoilage", Some(day(2)))
        .await
        .unwrap();
    assert_eq!(engine.ledger.on_hand(item, walk_in).await.unwrap(), dec!(5));

    let result = engine
        .ledger
        .apply_waste(item, walk_in, dec!(6), oz, "spoilage", Some(day(3)))
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientInventory(_)));
    assert_eq!(engine.ledger.on_hand(item, walk_in).await.unwrap(), dec!(5));
}

#[tokio::test]
async fn correcting_a_count_line_reverses_then_reapplies() {
    let harness = TestEngine::new();
    let engine = &harness.engine;

    let oz = create_base_unit(engine, "ounce").await;
    let item = create_item(engine, "flour", oz, dec!(0.10), dec!(100)).await;
    let location = Uuid::new_v4();

    let count = engine.ledger.create_count(location, Some(day(1))).await.unwrap();
    let line_id = engine
        .ledger
        .apply_count(count, item, dec!(100), oz)
        .await
        .unwrap();

    // A receipt lands between the count and its correction.
    engine
        .ledger
        .apply_receipt(
            Uuid::new_v4(),
            item,
            location,
            dec!(40),
            oz,
            dec!(4.00),
            Some(day(2)),
        )
        .await
        .unwrap();
    assert_eq!(engine.ledger.on_hand(item, location).await.unwrap(), dec!(140));

    // 140 - 100 + 90: the in-between receipt survives the correction.
    engine.ledger.correct_count_line(line_id, dec!(90)).await.unwrap();
    assert_eq!(engine.ledger.on_hand(item, location).await.unwrap(), dec!(130));

    let line = engine.store.get_count_line(line_id).await.unwrap().unwrap();
    assert_eq!(line.qty, dec!(90));
    assert_eq!(line.derived_base_units, dec!(90));
}

#[tokio::test]
async fn deleting_a_count_session_reverses_every_line() {
    let harness = TestEngine::new();
    let engine = &harness.engine;

    let oz = create_base_unit(engine, "ounce").await;
    let item = create_item(engine, "flour", oz, dec!(0.10), dec!(100)).await;
    let location = Uuid::new_v4();

    let count = engine.ledger.create_count(location, Some(day(1))).await.unwrap();
    engine.ledger.apply_count(count, item, dec!(50), oz).await.unwrap();
    engine
        .ledger
        .apply_receipt(
            Uuid::new_v4(),
            item,
            location,
            dec!(10),
            oz,
            dec!(1.00),
            Some(day(2)),
        )
        .await
        .unwrap();

    engine.ledger.delete_count_session(count).await.unwrap();

    // 60 - 50: only the receipt's effect remains.
    assert_eq!(engine.ledger.on_hand(item, location).await.unwrap(), dec!(10));
    assert!(engine.store.get_count(count).await.unwrap().is_none());
    assert!(engine.store.lines_for_count(count).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_units_fail_conversion_as_not_found() {
    let harness = TestEngine::new();
    let engine = &harness.engine;

    let oz = create_base_unit(engine, "ounce").await;
    let item = create_item(engine, "flour", oz, dec!(0.10), dec!(100)).await;
    let location = Uuid::new_v4();

    let count = engine.ledger.create_count(location, None).await.unwrap();
    let result = engine
        .ledger
        .apply_count(count, item, dec!(1), Uuid::new_v4())
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn concurrent_waste_on_one_key_serializes() {
    let harness = TestEngine::new();
    let engine = &harness.engine;

    let oz = create_base_unit(engine, "ounce").await;
    let item = create_item(engine, "cream", oz, dec!(0.30), dec!(100)).await;
    let walk_in = Uuid::new_v4();

    let count = engine.ledger.create_count(walk_in, Some(day(1))).await.unwrap();
    engine.ledger.apply_count(count, item, dec!(100), oz).await.unwrap();

    let a = engine.ledger.apply_waste(item, walk_in, dec!(30), oz, "spill", None);
    let b = engine.ledger.apply_waste(item, walk_in, dec!(30), oz, "spill", None);
    let (ra, rb) = tokio::join!(a, b);
    ra.unwrap();
    rb.unwrap();

    // Both decrements land; neither read-modify-write clobbers the other.
    assert_eq!(engine.ledger.on_hand(item, walk_in).await.unwrap(), dec!(40));
}
