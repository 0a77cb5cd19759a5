//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open a transaction when several statements must be
//! applied atomically, and pass `&mut *tx` through to the functions without any other changes.
//!
//! Statements with a `RETURNING` clause are read with `fetch_all`. SQLite only finishes the write once the statement
//! has been stepped to completion.
use std::{env, str::FromStr};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod captures;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod refunds;
pub mod transactions;

const SQLITE_DB_URL: &str = "sqlite://data/adyen_gateway.db";

pub fn db_url() -> String {
    let result = env::var("APG_DATABASE_URL").unwrap_or_else(|_| {
        info!("APG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

/// Opens a connection pool, creating the database file if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
