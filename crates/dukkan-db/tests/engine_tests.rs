//! End-to-end engine tests
//!
//! These tests run the transaction processors against an in-memory SQLite
//! database and check the ledger invariants after every scenario:
//!
//! - stock      == Σ stock movements
//! - customer   == Σ on-account sales − Σ payments
//! - supplier   == Σ purchase totals
//! - account    == opening + Σ in − Σ out
//!
//! plus atomicity: a failing commit must leave zero new rows behind.

use chrono::{Duration, Utc};

use dukkan_core::draft::{PurchaseDraft, PurchaseLine, SaleDraft, SaleLine};
use dukkan_core::{
    AccountKind, BusinessContext, Capability, CollectionMethod, Direction, FinanceSource,
    Money, MovementKind, PaymentMethod, Product, Role,
};
use dukkan_db::import::ImportBatch;
use dukkan_db::processor::account::AccountTxInput;
use dukkan_db::processor::movement::MovementInput;
use dukkan_db::processor::payment::PaymentInput;
use dukkan_db::repository::account::new_account;
use dukkan_db::repository::customer::new_customer;
use dukkan_db::repository::product::generate_product_id;
use dukkan_db::repository::supplier::new_supplier;
use dukkan_db::{Database, DbConfig, DbError, EngineError, OversellPolicy};

// =============================================================================
// Fixtures
// =============================================================================

async fn setup() -> (Database, BusinessContext) {
    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database");
    let ctx = BusinessContext::new("11111111-1111-1111-1111-111111111111", Role::Admin);
    (db, ctx)
}

fn test_product(ctx: &BusinessContext, name: &str, selling_minor: i64) -> Product {
    let now = Utc::now();
    Product {
        id: generate_product_id(),
        business_id: ctx.business_id.clone(),
        name: name.to_string(),
        product_code: format!("TST-{}", &generate_product_id()[..8]),
        barcode: None,
        supplier_id: None,
        category: None,
        buying_price_minor: selling_minor / 2,
        selling_price_minor: selling_minor,
        stock_quantity: 0,
        critical_stock_level: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Inserts a product and gives it `stock` units through the movement ledger,
/// so the invariant holds before the scenario starts.
async fn seed_product(
    db: &Database,
    ctx: &BusinessContext,
    name: &str,
    selling_minor: i64,
    stock: i64,
) -> Product {
    let product = test_product(ctx, name, selling_minor);
    db.products().insert(&product).await.unwrap();

    if stock != 0 {
        db.movement_processor()
            .process_stock_movement(
                ctx,
                MovementInput {
                    product_id: product.id.clone(),
                    amount: stock,
                    kind: MovementKind::Adjustment,
                    document_id: None,
                    description: Some("opening stock".to_string()),
                },
            )
            .await
            .unwrap();
    }

    db.products()
        .get_by_id(&ctx.business_id, &product.id)
        .await
        .unwrap()
        .unwrap()
}

async fn assert_no_drift(db: &Database, ctx: &BusinessContext) {
    let drifts = db.reconciler().run(ctx).await.unwrap();
    assert!(drifts.is_empty(), "unexpected drift: {drifts:?}");
}

// =============================================================================
// Sale scenarios
// =============================================================================

#[tokio::test]
async fn cash_sale_decrements_stock_and_records_movement() {
    let (db, ctx) = setup().await;
    // product X: stock 10, price 50.00
    let product = seed_product(&db, &ctx, "PRODUCT X", 5000, 10).await;

    let sale = db
        .sale_processor()
        .commit_sale(
            &ctx,
            SaleDraft::new(PaymentMethod::Cash)
                .add_line(SaleLine::new(product.id.clone(), 2, Money::from_minor(5000))),
        )
        .await
        .unwrap();

    assert_eq!(sale.final_amount_minor, 10_000); // 100.00
    assert_eq!(sale.total_amount_minor, 10_000);
    assert!(sale.customer_id.is_none());

    let after = db
        .products()
        .get_by_id(&ctx.business_id, &product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.stock_quantity, 8);

    let movements = db
        .movements()
        .list_for_document(&ctx.business_id, &sale.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].amount, -2);
    assert_eq!(movements[0].kind, MovementKind::Sale);

    // stock invariant: cache equals ledger fold
    let ledger = db
        .movements()
        .ledger_total(&ctx.business_id, &product.id)
        .await
        .unwrap();
    assert_eq!(after.stock_quantity, ledger);

    assert_no_drift(&db, &ctx).await;
}

#[tokio::test]
async fn on_account_sale_then_payment_moves_customer_balance() {
    let (db, ctx) = setup().await;
    let product = seed_product(&db, &ctx, "PRODUCT Y", 5000, 10).await;

    let customer = new_customer(&ctx.business_id, "TEST CUSTOMER", None);
    db.customers().insert(&customer).await.unwrap();

    // On-account sale of 50.00 against balance 0
    db.sale_processor()
        .commit_sale(
            &ctx,
            SaleDraft::new(PaymentMethod::OnAccount)
                .with_customer(customer.id.clone())
                .add_line(SaleLine::new(product.id.clone(), 1, Money::from_minor(5000))),
        )
        .await
        .unwrap();

    let after_sale = db
        .customers()
        .get_by_id(&ctx.business_id, &customer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_sale.balance_minor, 5000);

    // Payment of 20.00 → balance 30.00
    db.payment_processor()
        .record_customer_payment(
            &ctx,
            PaymentInput {
                customer_id: customer.id.clone(),
                amount: Money::from_minor(2000),
                method: CollectionMethod::Cash,
                description: None,
            },
        )
        .await
        .unwrap();

    let after_payment = db
        .customers()
        .get_by_id(&ctx.business_id, &customer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_payment.balance_minor, 3000);

    // statement shows both documents, newest first
    let statement = db
        .customers()
        .statement(&ctx.business_id, &customer.id)
        .await
        .unwrap();
    assert_eq!(statement.len(), 2);

    assert_no_drift(&db, &ctx).await;
}

#[tokio::test]
async fn discount_is_clamped_to_line_value_on_commit() {
    let (db, ctx) = setup().await;
    let product = seed_product(&db, &ctx, "PRODUCT Z", 10_000, 5).await;

    // price 100.00, qty 3, requested discount 400.00 → clamped to 300.00
    let sale = db
        .sale_processor()
        .commit_sale(
            &ctx,
            SaleDraft::new(PaymentMethod::Cash).add_line(
                SaleLine::new(product.id.clone(), 3, Money::from_minor(10_000))
                    .with_discount(Money::from_minor(40_000)),
            ),
        )
        .await
        .unwrap();

    assert_eq!(sale.total_amount_minor, 30_000);
    assert_eq!(sale.final_amount_minor, 0); // never negative

    let items = db.sales().items(&sale.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].discount_minor, 30_000);
    assert_eq!(items[0].total_minor, 0);
}

#[tokio::test]
async fn sale_snapshot_freezes_product_name() {
    let (db, ctx) = setup().await;
    let mut product = seed_product(&db, &ctx, "OLD NAME", 1000, 5).await;

    let sale = db
        .sale_processor()
        .commit_sale(
            &ctx,
            SaleDraft::new(PaymentMethod::Cash)
                .add_line(SaleLine::new(product.id.clone(), 1, Money::from_minor(1000))),
        )
        .await
        .unwrap();

    product.name = "NEW NAME".to_string();
    db.products().update(&product).await.unwrap();

    let items = db.sales().items(&sale.id).await.unwrap();
    assert_eq!(items[0].product_name, "OLD NAME");
}

// =============================================================================
// Atomicity
// =============================================================================

#[tokio::test]
async fn failing_sale_leaves_zero_rows() {
    let (db, ctx) = setup().await;
    let product = seed_product(&db, &ctx, "REAL PRODUCT", 1000, 10).await;

    // Second line references a product that does not exist.
    let result = db
        .sale_processor()
        .commit_sale(
            &ctx,
            SaleDraft::new(PaymentMethod::Cash)
                .add_line(SaleLine::new(product.id.clone(), 2, Money::from_minor(1000)))
                .add_line(SaleLine::new("no-such-product", 1, Money::from_minor(500))),
        )
        .await;

    assert!(matches!(
        result,
        Err(EngineError::Db(DbError::NotFound { .. }))
    ));

    // No partial state: no sale, no items, no movements, stock untouched.
    assert_eq!(db.sales().count(&ctx.business_id).await.unwrap(), 0);

    let after = db
        .products()
        .get_by_id(&ctx.business_id, &product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.stock_quantity, 10);

    let movements = db
        .movements()
        .list_for_product(&ctx.business_id, &product.id)
        .await
        .unwrap();
    // only the opening adjustment
    assert_eq!(movements.len(), 1);

    assert_no_drift(&db, &ctx).await;
}

#[tokio::test]
async fn failing_purchase_leaves_zero_rows() {
    let (db, ctx) = setup().await;
    let supplier = new_supplier(&ctx.business_id, "SUPPLIER", None, None);
    db.suppliers().insert(&supplier).await.unwrap();
    let product = seed_product(&db, &ctx, "PRODUCT", 1000, 0).await;

    let result = db
        .purchase_processor()
        .commit_purchase(
            &ctx,
            PurchaseDraft::new(supplier.id.clone(), Utc::now().date_naive())
                .add_line(PurchaseLine::new(product.id.clone(), 5, Money::from_minor(400)))
                .add_line(PurchaseLine::new("ghost", 1, Money::from_minor(100))),
        )
        .await;

    assert!(result.is_err());

    let after_supplier = db
        .suppliers()
        .get_by_id(&ctx.business_id, &supplier.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_supplier.balance_minor, 0);

    let after_product = db
        .products()
        .get_by_id(&ctx.business_id, &product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_product.stock_quantity, 0);

    assert_no_drift(&db, &ctx).await;
}

// =============================================================================
// Validation & access
// =============================================================================

#[tokio::test]
async fn empty_draft_is_rejected_before_any_write() {
    let (db, ctx) = setup().await;

    let result = db
        .sale_processor()
        .commit_sale(&ctx, SaleDraft::new(PaymentMethod::Cash))
        .await;

    assert!(matches!(result, Err(EngineError::Validation(_))));
    assert_eq!(db.sales().count(&ctx.business_id).await.unwrap(), 0);
}

#[tokio::test]
async fn on_account_without_customer_is_rejected() {
    let (db, ctx) = setup().await;
    let product = seed_product(&db, &ctx, "PRODUCT", 1000, 5).await;

    let result = db
        .sale_processor()
        .commit_sale(
            &ctx,
            SaleDraft::new(PaymentMethod::OnAccount)
                .add_line(SaleLine::new(product.id, 1, Money::from_minor(1000))),
        )
        .await;

    assert!(matches!(result, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn non_positive_payment_is_rejected() {
    let (db, ctx) = setup().await;
    let customer = new_customer(&ctx.business_id, "CUSTOMER", None);
    db.customers().insert(&customer).await.unwrap();

    for amount in [0, -500] {
        let result = db
            .payment_processor()
            .record_customer_payment(
                &ctx,
                PaymentInput {
                    customer_id: customer.id.clone(),
                    amount: Money::from_minor(amount),
                    method: CollectionMethod::Cash,
                    description: None,
                },
            )
            .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }
}

#[tokio::test]
async fn staff_cannot_commit_purchases() {
    let (db, admin_ctx) = setup().await;
    let staff_ctx = BusinessContext::new(admin_ctx.business_id.clone(), Role::Staff);

    let supplier = new_supplier(&admin_ctx.business_id, "SUPPLIER", None, None);
    db.suppliers().insert(&supplier).await.unwrap();
    let product = seed_product(&db, &admin_ctx, "PRODUCT", 1000, 0).await;

    let result = db
        .purchase_processor()
        .commit_purchase(
            &staff_ctx,
            PurchaseDraft::new(supplier.id, Utc::now().date_naive())
                .add_line(PurchaseLine::new(product.id, 1, Money::from_minor(100))),
        )
        .await;

    assert!(matches!(result, Err(EngineError::Access(_))));

    // Staff may still record sales.
    assert!(staff_ctx.authorize(Capability::RecordSale).is_ok());
}

#[tokio::test]
async fn movement_against_unknown_product_is_not_found() {
    let (db, ctx) = setup().await;

    let result = db
        .movement_processor()
        .process_stock_movement(
            &ctx,
            MovementInput {
                product_id: "missing".to_string(),
                amount: 5,
                kind: MovementKind::Adjustment,
                document_id: None,
                description: None,
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(EngineError::Db(DbError::NotFound { .. }))
    ));
}

// =============================================================================
// Purchases & suppliers
// =============================================================================

#[tokio::test]
async fn purchase_increases_stock_and_supplier_balance() {
    let (db, ctx) = setup().await;
    let supplier = new_supplier(&ctx.business_id, "SUPPLIER", None, None);
    db.suppliers().insert(&supplier).await.unwrap();
    let product = seed_product(&db, &ctx, "PRODUCT", 2000, 0).await;

    // purchase 5 units at cost 10.00 → stock +5, supplier owed 50.00
    let purchase = db
        .purchase_processor()
        .commit_purchase(
            &ctx,
            PurchaseDraft::new(supplier.id.clone(), Utc::now().date_naive())
                .with_invoice_no("INV-7")
                .add_line(PurchaseLine::new(product.id.clone(), 5, Money::from_minor(1000))),
        )
        .await
        .unwrap();

    assert_eq!(purchase.total_amount_minor, 5000);

    let after_product = db
        .products()
        .get_by_id(&ctx.business_id, &product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_product.stock_quantity, 5);

    let after_supplier = db
        .suppliers()
        .get_by_id(&ctx.business_id, &supplier.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_supplier.balance_minor, 5000);

    // purchase does NOT rewrite the product's buying price
    assert_eq!(after_product.buying_price_minor, product.buying_price_minor);

    let movements = db
        .movements()
        .list_for_document(&ctx.business_id, &purchase.id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].amount, 5);
    assert_eq!(movements[0].kind, MovementKind::Purchase);

    // Cost history lives on the purchase item.
    let items = db.purchases().items(&purchase.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].cost_price_minor, 1000);
    assert_eq!(items[0].total_minor, 5000);

    assert_no_drift(&db, &ctx).await;
}

#[tokio::test]
async fn low_stock_is_surfaced_not_rejected() {
    let (db, ctx) = setup().await;

    let mut product = test_product(&ctx, "RUNNING LOW", 1000);
    product.critical_stock_level = 5;
    db.products().insert(&product).await.unwrap();

    // 3 units on hand, critical level 5 → listed as a warning.
    db.movement_processor()
        .process_stock_movement(
            &ctx,
            MovementInput {
                product_id: product.id.clone(),
                amount: 3,
                kind: MovementKind::Adjustment,
                document_id: None,
                description: None,
            },
        )
        .await
        .unwrap();

    let low = db.products().below_critical(&ctx.business_id).await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, product.id);

    // Selling while low still succeeds under the default policy.
    db.sale_processor()
        .commit_sale(
            &ctx,
            SaleDraft::new(PaymentMethod::Cash)
                .add_line(SaleLine::new(product.id.clone(), 3, Money::from_minor(1000))),
        )
        .await
        .unwrap();

    assert_no_drift(&db, &ctx).await;
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn account_transactions_adjust_balance_and_may_go_negative() {
    let (db, ctx) = setup().await;
    let account = new_account(&ctx.business_id, "Drawer", AccountKind::Cash, 10_000);
    db.accounts().insert(&account).await.unwrap();

    let now = Utc::now();

    db.account_processor()
        .record_account_transaction(
            &ctx,
            AccountTxInput {
                account_id: account.id.clone(),
                direction: Direction::In,
                amount: Money::from_minor(5000),
                category: Some("sales".to_string()),
                description: None,
                date: now,
            },
        )
        .await
        .unwrap();

    // Overdraw on purpose: no available-balance check.
    db.account_processor()
        .record_account_transaction(
            &ctx,
            AccountTxInput {
                account_id: account.id.clone(),
                direction: Direction::Out,
                amount: Money::from_minor(40_000),
                category: Some("rent".to_string()),
                description: None,
                date: now,
            },
        )
        .await
        .unwrap();

    let after = db
        .accounts()
        .get_by_id(&ctx.business_id, &account.id)
        .await
        .unwrap()
        .unwrap();
    // 10_000 + 5_000 − 40_000
    assert_eq!(after.balance_minor, -25_000);

    // account invariant: opening + ledger fold
    let ledger = db
        .accounts()
        .ledger_total(&ctx.business_id, &account.id)
        .await
        .unwrap();
    assert_eq!(after.balance_minor, account.opening_balance_minor + ledger);

    assert_no_drift(&db, &ctx).await;
}

// =============================================================================
// Oversell policies & concurrency
// =============================================================================

#[tokio::test]
async fn oversell_is_allowed_by_default() {
    let (db, ctx) = setup().await;
    let product = seed_product(&db, &ctx, "SCARCE", 1000, 1).await;

    // Sell 3 against stock 1: allowed, stock goes negative, ledger agrees.
    db.sale_processor()
        .commit_sale(
            &ctx,
            SaleDraft::new(PaymentMethod::Cash)
                .add_line(SaleLine::new(product.id.clone(), 3, Money::from_minor(1000))),
        )
        .await
        .unwrap();

    let after = db
        .products()
        .get_by_id(&ctx.business_id, &product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.stock_quantity, -2);

    assert_no_drift(&db, &ctx).await;
}

#[tokio::test]
async fn blocking_policy_rejects_oversell_and_rolls_back() {
    let (db, ctx) = setup().await;
    let product = seed_product(&db, &ctx, "SCARCE", 1000, 1).await;

    let result = db
        .sale_processor()
        .with_oversell_policy(OversellPolicy::Block)
        .commit_sale(
            &ctx,
            SaleDraft::new(PaymentMethod::Cash)
                .add_line(SaleLine::new(product.id.clone(), 2, Money::from_minor(1000))),
        )
        .await;

    match result {
        Err(EngineError::InsufficientStock {
            available,
            requested,
            ..
        }) => {
            assert_eq!(available, 1);
            assert_eq!(requested, 2);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(db.sales().count(&ctx.business_id).await.unwrap(), 0);
    assert_no_drift(&db, &ctx).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_of_last_unit_never_lose_a_decrement() {
    let (db, ctx) = setup().await;
    let product = seed_product(&db, &ctx, "LAST UNIT", 1000, 1).await;

    let processor = db.sale_processor().with_oversell_policy(OversellPolicy::Block);

    let draft = |pid: String| {
        SaleDraft::new(PaymentMethod::Cash).add_line(SaleLine::new(pid, 1, Money::from_minor(1000)))
    };

    let (a, b) = tokio::join!(
        processor.commit_sale(&ctx, draft(product.id.clone())),
        processor.commit_sale(&ctx, draft(product.id.clone())),
    );

    // Exactly one success, one InsufficientStock.
    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "got {a:?} / {b:?}");
    for result in [&a, &b] {
        if let Err(err) = result {
            assert!(matches!(err, EngineError::InsufficientStock { .. }));
        }
    }

    let after = db
        .products()
        .get_by_id(&ctx.business_id, &product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.stock_quantity, 0);
    assert_eq!(db.sales().count(&ctx.business_id).await.unwrap(), 1);

    assert_no_drift(&db, &ctx).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_permissive_sales_keep_ledger_consistent() {
    let (db, ctx) = setup().await;
    let product = seed_product(&db, &ctx, "POPULAR", 1000, 1).await;

    let processor = db.sale_processor();

    let draft = |pid: String| {
        SaleDraft::new(PaymentMethod::Cash).add_line(SaleLine::new(pid, 1, Money::from_minor(1000)))
    };

    let (a, b) = tokio::join!(
        processor.commit_sale(&ctx, draft(product.id.clone())),
        processor.commit_sale(&ctx, draft(product.id.clone())),
    );
    a.unwrap();
    b.unwrap();

    // Permissive policy: both sold, stock went negative, nothing was lost.
    let after = db
        .products()
        .get_by_id(&ctx.business_id, &product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.stock_quantity, -1);

    let ledger = db
        .movements()
        .ledger_total(&ctx.business_id, &product.id)
        .await
        .unwrap();
    assert_eq!(ledger, -1);

    assert_no_drift(&db, &ctx).await;
}

// =============================================================================
// Reconciliation
// =============================================================================

#[tokio::test]
async fn reconcile_detects_a_manually_corrupted_cache() {
    let (db, ctx) = setup().await;
    let product = seed_product(&db, &ctx, "PRODUCT", 1000, 10).await;

    assert_no_drift(&db, &ctx).await;

    // Corrupt the cache behind the ledger's back.
    sqlx::query("UPDATE products SET stock_quantity = stock_quantity + 7 WHERE id = ?")
        .bind(&product.id)
        .execute(db.pool())
        .await
        .unwrap();

    let drifts = db.reconciler().run(&ctx).await.unwrap();
    assert_eq!(drifts.len(), 1);
    assert_eq!(drifts[0].cached, 17);
    assert_eq!(drifts[0].derived, 10);
    assert_eq!(drifts[0].difference(), 7);
}

// =============================================================================
// Bulk import
// =============================================================================

#[tokio::test]
async fn import_routes_initial_stock_through_the_ledger() {
    let (db, ctx) = setup().await;

    let existing = new_supplier(&ctx.business_id, "EXISTING SUPPLIER", None, None);
    db.suppliers().insert(&existing).await.unwrap();

    // Backup payloads arrive as JSON; round through serde like a real import.
    let payload = format!(
        r#"{{
            "products": [
                {{
                    "name": "imported cola",
                    "product_code": "imp-001",
                    "category": "BEV",
                    "supplier_key": "old-1",
                    "buying_price_minor": 800,
                    "selling_price_minor": 1200,
                    "initial_stock": 24
                }},
                {{
                    "name": "imported chips",
                    "supplier_key": "old-2",
                    "buying_price_minor": 500,
                    "selling_price_minor": 900
                }}
            ],
            "supplier_mapping": {{
                "old-1": {{ "action": "existing", "id": "{}" }},
                "old-2": {{ "action": "create", "name": "New Wholesale" }}
            }}
        }}"#,
        existing.id
    );
    let batch: ImportBatch = serde_json::from_str(&payload).unwrap();
    assert_eq!(batch.products.len(), 2);

    let report = db.import().import_products(&ctx, batch).await.unwrap();

    assert_eq!(report.products_imported, 2);
    assert_eq!(report.suppliers_created, 1);
    assert_eq!(report.movements_emitted, 1);

    let cola = db
        .products()
        .get_by_code(&ctx.business_id, "IMP-001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cola.stock_quantity, 24);
    assert_eq!(cola.supplier_id.as_deref(), Some(existing.id.as_str()));

    // The invariant holds from the first row: stock came from the ledger.
    let ledger = db
        .movements()
        .ledger_total(&ctx.business_id, &cola.id)
        .await
        .unwrap();
    assert_eq!(ledger, 24);

    let created = db
        .suppliers()
        .get_by_name(&ctx.business_id, "NEW WHOLESALE")
        .await
        .unwrap();
    assert!(created.is_some());

    assert_no_drift(&db, &ctx).await;
}

#[tokio::test]
async fn staff_cannot_import() {
    let (db, admin_ctx) = setup().await;
    let staff_ctx = BusinessContext::new(admin_ctx.business_id.clone(), Role::Staff);

    let result = db
        .import()
        .import_products(
            &staff_ctx,
            ImportBatch {
                products: vec![],
                supplier_mapping: Default::default(),
            },
        )
        .await;

    assert!(matches!(result, Err(EngineError::Access(_))));
}

// =============================================================================
// Finance projection
// =============================================================================

#[tokio::test]
async fn finance_projection_merges_all_three_sources() {
    let (db, ctx) = setup().await;
    let product = seed_product(&db, &ctx, "PRODUCT", 5000, 10).await;

    let account = new_account(&ctx.business_id, "Drawer", AccountKind::Cash, 0);
    db.accounts().insert(&account).await.unwrap();

    let now = Utc::now();

    // One of each source: account transaction, sale, expense.
    db.account_processor()
        .record_account_transaction(
            &ctx,
            AccountTxInput {
                account_id: account.id.clone(),
                direction: Direction::In,
                amount: Money::from_minor(1500),
                category: None,
                description: Some("float".to_string()),
                date: now,
            },
        )
        .await
        .unwrap();

    db.sale_processor()
        .commit_sale(
            &ctx,
            SaleDraft::new(PaymentMethod::Cash)
                .add_line(SaleLine::new(product.id.clone(), 1, Money::from_minor(5000))),
        )
        .await
        .unwrap();

    let expense = dukkan_core::Expense {
        id: uuid::Uuid::new_v4().to_string(),
        business_id: ctx.business_id.clone(),
        title: "ELECTRICITY".to_string(),
        amount_minor: 2500,
        description: None,
        date: now,
        created_at: now,
    };
    db.expenses().insert(&expense).await.unwrap();

    let entries = db.finance().recent(&ctx, 50).await.unwrap();
    assert_eq!(entries.len(), 3);

    let mut sources: Vec<FinanceSource> = entries.iter().map(|e| e.source).collect();
    sources.sort_by_key(|s| format!("{s:?}"));
    assert_eq!(
        sources,
        vec![
            FinanceSource::Account,
            FinanceSource::Expense,
            FinanceSource::Sale
        ]
    );

    // Turnover over the surrounding hour equals the sale's final amount.
    let turnover = db
        .finance()
        .turnover(&ctx, now - Duration::hours(1), now + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(turnover.minor(), 5000);

    // Profit summary: revenue 50.00, COGS 25.00 (buying price = half),
    // expenses 25.00 → net 0.
    let summary = db.finance().profit_summary(&ctx).await.unwrap();
    assert_eq!(summary.revenue.minor(), 5000);
    assert_eq!(summary.cost_of_goods_sold.minor(), 2500);
    assert_eq!(summary.expenses.minor(), 2500);
    assert_eq!(summary.net_profit.minor(), 0);
    assert_eq!(summary.sale_count, 1);
    assert_eq!(summary.top_products.len(), 1);
    assert_eq!(summary.top_products[0].name, "PRODUCT");

    // Reports stay admin-only.
    let staff_ctx = BusinessContext::new(ctx.business_id.clone(), Role::Staff);
    assert!(matches!(
        db.finance().recent(&staff_ctx, 10).await,
        Err(EngineError::Access(_))
    ));
}

// =============================================================================
// Tenancy
// =============================================================================

#[tokio::test]
async fn operations_are_scoped_to_their_business() {
    let (db, ctx_a) = setup().await;
    let ctx_b = BusinessContext::new("22222222-2222-2222-2222-222222222222", Role::Admin);

    let product = seed_product(&db, &ctx_a, "A-ONLY", 1000, 5).await;

    // Business B cannot see or sell business A's product.
    assert!(db
        .products()
        .get_by_id(&ctx_b.business_id, &product.id)
        .await
        .unwrap()
        .is_none());

    let result = db
        .sale_processor()
        .commit_sale(
            &ctx_b,
            SaleDraft::new(PaymentMethod::Cash)
                .add_line(SaleLine::new(product.id.clone(), 1, Money::from_minor(1000))),
        )
        .await;
    assert!(matches!(
        result,
        Err(EngineError::Db(DbError::NotFound { .. }))
    ));

    // A's stock is untouched by B's failed attempt.
    let after = db
        .products()
        .get_by_id(&ctx_a.business_id, &product.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.stock_quantity, 5);
}
