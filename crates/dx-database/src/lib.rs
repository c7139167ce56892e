//! Durable record store adapter.
//!
//! Transactional access to users, wallets, scenes, rake/agent rules,
//! tables, matches, and the append-only billing and round logs.
//!
//! ## Connectivity
//!
//! - [`db()`] — shared read-mostly connection from `DB_URL`
//! - [`connect()`] — dedicated connection for transactional owners
//!   (settlement engine, match composer)
//!
//! ## Repositories
//!
//! SQL lives behind repository traits implemented generically over
//! [`tokio_postgres::GenericClient`], so the same queries run on a plain
//! client and inside a transaction.

mod models;
mod repository;
mod schema;

pub use models::*;
pub use repository::*;
pub use schema::*;

use std::sync::Arc;
use tokio_postgres::Client;

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Establishes the shared database connection from `DB_URL`.
///
/// # Panics
///
/// Panics if `DB_URL` is not set or if the connection fails; the process
/// cannot run without its record store.
pub async fn db() -> Arc<Client> {
    Arc::new(connect().await)
}

/// Opens a dedicated connection for a component that needs to own
/// transactions (row locks must not interleave with unrelated traffic).
pub async fn connect() -> Client {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let ref url = std::env::var("DB_URL").expect("DB_URL must be set");
    let (client, connection) = tokio_postgres::connect(url, tls)
        .await
        .expect("database connection failed");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("database connection error: {}", e);
        }
    });
    client
}

/// Table for player identities and agent bindings.
#[rustfmt::skip]
pub const USERS:             &str = "users";
/// Table for agent aggregate counters.
#[rustfmt::skip]
pub const AGENTS:            &str = "agents";
/// Table for agent profit-sharing rules.
#[rustfmt::skip]
pub const AGENT_RULES:       &str = "agent_rules";
/// Append-only agent share audit rows.
#[rustfmt::skip]
pub const AGENT_PROFIT_LOGS: &str = "agent_profit_logs";
/// Table for player wallets.
#[rustfmt::skip]
pub const WALLETS:           &str = "wallets";
/// Append-only wallet delta rows.
#[rustfmt::skip]
pub const BILLING_LOGS:      &str = "billing_logs";
/// Table for game templates.
#[rustfmt::skip]
pub const SCENES:            &str = "scenes";
/// Table for rake (commission) rules.
#[rustfmt::skip]
pub const RAKE_RULES:        &str = "rake_rules";
/// Table for seated tables.
#[rustfmt::skip]
pub const TABLES:            &str = "tables";
/// Table for matches (one row per hand).
#[rustfmt::skip]
pub const MATCHES:           &str = "matches";
/// Append-only per-round action ledger.
#[rustfmt::skip]
pub const MATCH_ROUND_LOGS:  &str = "match_round_logs";
