pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryReviewStore;
pub use store::{PgReviewStore, ReviewStore};

use anyhow::Context;
use sqlx::{PgPool, Postgres, migrate::MigrateDatabase, postgres::PgPoolOptions};

/// Create a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to database")?;

    Ok(pool)
}

/// Create the database named in `database_url` if it does not exist yet.
///
/// Connects through the server's maintenance database, so it must run before
/// [`create_pool`] for a fresh deployment.
pub async fn ensure_database_exists(database_url: &str) -> anyhow::Result<()> {
    let exists = Postgres::database_exists(database_url)
        .await
        .context("failed to check database existence")?;
    if !exists {
        Postgres::create_database(database_url)
            .await
            .context("failed to create database")?;
        tracing::info!("created database");
    }

    Ok(())
}

/// Run the migrations in this crate's `migrations/` folder.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    // Bundled at compile time
    sqlx::migrate!()
        .run(pool)
        .await
        .context("failed to run migrations")?;

    Ok(())
}
