//! # Seed Data Generator
//!
//! Populates a database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default dev database
//! cargo run -p dukkan-db --bin seed
//!
//! # Custom product count / database path
//! cargo run -p dukkan-db --bin seed -- --count 500 --db ./data/dukkan.db
//! ```
//!
//! Seeds a demo business with suppliers, products (opening stock routed
//! through the movement ledger), customers and accounts, then commits a few
//! example documents and reconciles, so the resulting database starts with
//! every invariant holding.

use std::env;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use dukkan_core::draft::{PurchaseDraft, PurchaseLine, SaleDraft, SaleLine};
use dukkan_core::{AccountKind, BusinessContext, CollectionMethod, Money, PaymentMethod, Product, Role};
use dukkan_db::processor::payment::PaymentInput;
use dukkan_db::repository::account::new_account;
use dukkan_db::repository::customer::new_customer;
use dukkan_db::repository::product::generate_product_id;
use dukkan_db::repository::supplier::new_supplier;
use dukkan_db::{Database, DbConfig};

/// Demo catalogue: (category, product names)
const CATALOGUE: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "COLA 330ML",
            "COLA 1L",
            "SODA WATER",
            "ORANGE JUICE",
            "ICE TEA PEACH",
            "DRINKING WATER 500ML",
            "AYRAN 250ML",
            "ENERGY DRINK",
        ],
    ),
    (
        "SNK",
        &[
            "POTATO CHIPS",
            "CHOCOLATE WAFER",
            "SALTED CRACKERS",
            "HAZELNUT BAR",
            "GUM MINT",
            "BISCUIT PLAIN",
        ],
    ),
    (
        "GRO",
        &[
            "RICE 1KG",
            "PASTA 500G",
            "SUNFLOWER OIL 1L",
            "SUGAR 1KG",
            "FLOUR 1KG",
            "TEA 500G",
            "LENTILS 1KG",
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 60;
    let mut db_path = String::from("./dukkan_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Dukkan Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./dukkan_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Dukkan Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let ctx = BusinessContext::new(uuid::Uuid::new_v4().to_string(), Role::Admin);

    // Suppliers
    let supplier_a = new_supplier(&ctx.business_id, "ANADOLU GIDA", Some("0212 000 00 01".into()), None);
    let supplier_b = new_supplier(&ctx.business_id, "MARMARA DAGITIM", None, Some("H. YILMAZ".into()));
    db.suppliers().insert(&supplier_a).await?;
    db.suppliers().insert(&supplier_b).await?;
    println!("✓ Seeded 2 suppliers");

    // Products, opening stock routed through the movement ledger
    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (category, names)) in CATALOGUE.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for variant in 0..4 {
                if generated >= count {
                    break 'outer;
                }

                let seed = category_idx * 100 + name_idx * 10 + variant;
                let supplier = if seed % 2 == 0 { &supplier_a } else { &supplier_b };
                let product = generate_product(&ctx.business_id, category, name, supplier.id.clone(), seed);
                let opening_stock = (seed % 40) as i64;

                db.products().insert(&product).await?;
                if opening_stock > 0 {
                    db.movement_processor()
                        .process_stock_movement(
                            &ctx,
                            dukkan_db::processor::movement::MovementInput {
                                product_id: product.id.clone(),
                                amount: opening_stock,
                                kind: dukkan_core::MovementKind::Adjustment,
                                document_id: None,
                                description: Some("Initial stock (seed)".to_string()),
                            },
                        )
                        .await?;
                }

                generated += 1;
            }
        }
    }

    println!("✓ Seeded {} products in {:?}", generated, start.elapsed());

    // Customers & accounts
    let customer = new_customer(&ctx.business_id, "AYSE KAYA", Some("0532 000 00 00".into()));
    db.customers().insert(&customer).await?;

    let cash = new_account(&ctx.business_id, "Main cash drawer", AccountKind::Cash, 50_000);
    let bank = new_account(&ctx.business_id, "Bank current", AccountKind::Bank, 1_250_000);
    db.accounts().insert(&cash).await?;
    db.accounts().insert(&bank).await?;
    println!("✓ Seeded 1 customer, 2 accounts");

    // A few example documents so reports have something to show
    let products = db.products().list(&ctx.business_id).await?;
    if products.len() >= 2 {
        let first = &products[0];
        let second = &products[1];

        db.purchase_processor()
            .commit_purchase(
                &ctx,
                PurchaseDraft::new(supplier_a.id.clone(), Utc::now().date_naive())
                    .with_invoice_no("SEED-0001")
                    .add_line(PurchaseLine::new(first.id.clone(), 24, first.buying_price()))
                    .add_line(PurchaseLine::new(second.id.clone(), 12, second.buying_price())),
            )
            .await?;

        db.sale_processor()
            .commit_sale(
                &ctx,
                SaleDraft::new(PaymentMethod::Cash)
                    .add_line(SaleLine::new(first.id.clone(), 2, first.selling_price())),
            )
            .await?;

        db.sale_processor()
            .commit_sale(
                &ctx,
                SaleDraft::new(PaymentMethod::OnAccount)
                    .with_customer(customer.id.clone())
                    .add_line(SaleLine::new(second.id.clone(), 1, second.selling_price())),
            )
            .await?;

        db.payment_processor()
            .record_customer_payment(
                &ctx,
                PaymentInput {
                    customer_id: customer.id.clone(),
                    amount: Money::from_minor(500),
                    method: CollectionMethod::Cash,
                    description: Some("Partial collection (seed)".to_string()),
                },
            )
            .await?;

        println!("✓ Committed example purchase, sales and payment");
    }

    // Every seeded balance must reconcile cleanly
    let drifts = db.reconciler().run(&ctx).await?;
    if drifts.is_empty() {
        println!("✓ Reconciliation clean");
    } else {
        eprintln!("⚠ Reconciliation found {} drifting balances", drifts.len());
        for drift in &drifts {
            eprintln!(
                "  {:?} {} cached={} derived={}",
                drift.entity, drift.name, drift.cached, drift.derived
            );
        }
    }

    println!();
    println!("✓ Seed complete! Business id: {}", ctx.business_id);

    Ok(())
}

/// Generates a single product with deterministic demo data.
fn generate_product(
    business_id: &str,
    category: &str,
    name: &str,
    supplier_id: String,
    seed: usize,
) -> Product {
    let now = Utc::now();

    let product_code = format!("{}-{:04}", category, seed);
    let barcode = Some(format!("869{:010}", seed));

    // Selling price 9.90 - 89.90, buying at 60-80% of it
    let selling = 990 + ((seed * 37) % 8000) as i64;
    let margin_pct = 60 + (seed % 20) as i64;
    let buying = selling * margin_pct / 100;

    Product {
        id: generate_product_id(),
        business_id: business_id.to_string(),
        name: format!("{} #{}", name, seed % 10),
        product_code,
        barcode,
        supplier_id: Some(supplier_id),
        category: Some(category.to_string()),
        buying_price_minor: buying,
        selling_price_minor: selling,
        stock_quantity: 0,
        critical_stock_level: 5,
        created_at: now,
        updated_at: now,
    }
}
