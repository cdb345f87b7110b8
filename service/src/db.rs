//! Store locations from PostgreSQL.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Type alias for the database pool.
pub type Pool = PgPool;

/// Create a new database connection pool.
pub async fn create_pool(database_url: &str) -> Result<Pool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// A retail store location.
///
/// Coordinates live as text in the source table and are parsed on use.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    #[sqlx(rename = "id_store")]
    pub id: i64,
    pub number_store_cyreen: i32,
    pub latitude: String,
    pub longitude: String,
}

impl StoreRow {
    /// Parse the text coordinates; `None` when either does not parse.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.trim().parse().ok()?;
        let lon = self.longitude.trim().parse().ok()?;
        Some((lat, lon))
    }
}

/// Fetch all store locations.
pub async fn fetch_stores(pool: &Pool) -> Result<Vec<StoreRow>, sqlx::Error> {
    sqlx::query_as::<_, StoreRow>(
        "SELECT id_store, number_store_cyreen, longitude, latitude FROM stores",
    )
    .fetch_all(pool)
    .await
}
