//! Seed script for development: fills an empty Entity Store tenant with
//! sample properties, a client, contracts and invoices through its REST API.
//!
//! Usage: `cargo run --bin seed`
//!
//! Reads `ENTITY_STORE_URL`, `SEED_USERNAME` and `SEED_PASSWORD` (and .env).

use std::time::Duration;

use anyhow::Context;
use aqario::services::entity_store::{EntityStore, HttpEntityStore, Resource};
use aqario::services::session::{self, Credentials, Session};
use chrono::{Datelike, Months, NaiveDate, Utc};
use serde_json::{json, Value};

const PROPERTY_TYPES: [&str; 5] = ["APARTMENT", "VILLA", "OFFICE", "SHOP", "LAND"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let base_url = std::env::var("ENTITY_STORE_URL").context("ENTITY_STORE_URL must be set")?;
    let username = std::env::var("SEED_USERNAME").unwrap_or_else(|_| "alpha_owner".to_string());
    let password = std::env::var("SEED_PASSWORD").unwrap_or_else(|_| "password".to_string());

    let store = HttpEntityStore::new(&base_url, Duration::from_secs(30), 50)?;

    println!("=== Aqario Seed Script ===");

    let credentials = Credentials {
        username: username.clone(),
        password,
    };
    let session = session::login(&store, &credentials)
        .await
        .with_context(|| format!("Login as {username} failed"))?
        .session();
    println!("[done] Logged in as {username}");

    let existing = store.list(&session, Resource::Properties).await?;
    if !existing.is_empty() {
        println!("[skip] Tenant already has {} properties", existing.len());
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let property_ids = seed_properties(&store, &session).await?;
    let client_id = seed_client(&store, &session).await?;
    let contract_ids = seed_contracts(&store, &session, &property_ids[..2], client_id, today).await?;
    seed_invoices(&store, &session, &contract_ids, today).await?;

    println!("\n=== Seed complete! ===");
    Ok(())
}

async fn seed_properties(store: &HttpEntityStore, session: &Session) -> anyhow::Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(PROPERTY_TYPES.len());
    for (i, property_type) in PROPERTY_TYPES.iter().enumerate() {
        let created = store
            .create(
                session,
                Resource::Properties,
                &json!({
                    "title": format!("Alpha Property {}", i + 1),
                    "property_type": property_type,
                    "area": format!("{}.00", 120 + 40 * i),
                    "location": format!("Location {}", i + 1),
                    "price": format!("{}.00", 2500 + 1500 * i),
                    "description": "Sample property",
                }),
            )
            .await?;
        ids.push(record_id(&created)?);
    }
    println!("[done] Created {} properties", ids.len());
    Ok(ids)
}

async fn seed_client(store: &HttpEntityStore, session: &Session) -> anyhow::Result<i64> {
    let created = store
        .create(
            session,
            Resource::Clients,
            &json!({
                "name": "Sample Client",
                "phone": "0500000000",
                "email": "client@alpha.com",
            }),
        )
        .await?;
    println!("[done] Created client");
    record_id(&created)
}

async fn seed_contracts(
    store: &HttpEntityStore,
    session: &Session,
    property_ids: &[i64],
    client_id: i64,
    today: NaiveDate,
) -> anyhow::Result<Vec<i64>> {
    let start = first_of_month(today, 5);
    let end = start
        .checked_add_months(Months::new(12))
        .context("contract end date out of range")?;

    let mut ids = Vec::with_capacity(property_ids.len());
    for property_id in property_ids {
        let created = store
            .create(
                session,
                Resource::Contracts,
                &json!({
                    "property": property_id,
                    "client": client_id,
                    "start_date": start,
                    "end_date": end,
                    "monthly_amount": "1000.00",
                    "total_amount": "12000.00",
                    "status": "ACTIVE",
                }),
            )
            .await?;
        ids.push(record_id(&created)?);
    }
    println!("[done] Created {} contracts", ids.len());
    Ok(ids)
}

/// Five paid months of rent per contract, plus a pending one for this month.
async fn seed_invoices(
    store: &HttpEntityStore,
    session: &Session,
    contract_ids: &[i64],
    today: NaiveDate,
) -> anyhow::Result<()> {
    let mut created = 0;
    for (c, contract_id) in contract_ids.iter().enumerate() {
        for back in (0..=5u32).rev() {
            let due = first_of_month(today, back);
            let paid = back > 0;
            store
                .create(
                    session,
                    Resource::Invoices,
                    &json!({
                        "invoice_number": format!("SEED-{}-{}{:02}", c + 1, due.year(), due.month()),
                        "contract": contract_id,
                        "amount": "1000.00",
                        "tax_rate": "15.00",
                        "due_date": due,
                        "paid_date": if paid { Some(due) } else { None },
                        "status": if paid { "PAID" } else { "PENDING" },
                    }),
                )
                .await?;
            created += 1;
        }
    }
    println!("[done] Created {created} invoices");
    Ok(())
}

fn first_of_month(today: NaiveDate, months_back: u32) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    first
        .checked_sub_months(Months::new(months_back))
        .unwrap_or(first)
}

fn record_id(created: &Value) -> anyhow::Result<i64> {
    created
        .get("id")
        .and_then(Value::as_i64)
        .context("Entity store response has no id")
}
