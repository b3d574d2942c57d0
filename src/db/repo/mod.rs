//! Repository layer for database operations.
//!
//! Methods are organized across submodules by concern:
//! - this file: raw pricing configuration (product tiers, areas, techniques)
//! - `orders.rs` - order-line tier snapshots

mod orders;

use crate::catalog::{PricingCatalog, ProductConfig};
use crate::domain::SubjectId;
use serde_json::Value;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::warn;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn parse_raw(column: &str, key: &str, text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|e| {
        warn!(
            key = %key,
            column = %column,
            error = %e,
            "Stored pricing configuration is not valid JSON, treating as empty"
        );
        Value::Null
    })
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Round-trip to the database.
    ///
    /// # Errors
    /// Returns an error if the database does not answer.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // Product pricing configuration
    // =========================================================================

    /// Store the raw tier configuration of a subject, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn upsert_product_tiers(
        &self,
        subject: &SubjectId,
        raw: &Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO product_pricing (subject_id, tiers_json, updated_ms)
            VALUES (?, ?, ?)
            ON CONFLICT(subject_id) DO UPDATE SET
                tiers_json = excluded.tiers_json,
                updated_ms = excluded.updated_ms
            "#,
        )
        .bind(subject.as_str())
        .bind(raw.to_string())
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Store the raw marking-area configuration of a product.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn upsert_product_areas(
        &self,
        subject: &SubjectId,
        raw: &Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO product_pricing (subject_id, areas_json, updated_ms)
            VALUES (?, ?, ?)
            ON CONFLICT(subject_id) DO UPDATE SET
                areas_json = excluded.areas_json,
                updated_ms = excluded.updated_ms
            "#,
        )
        .bind(subject.as_str())
        .bind(raw.to_string())
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Raw configuration of one subject, if stored.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_product_config(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<ProductConfig>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT tiers_json, areas_json
            FROM product_pricing
            WHERE subject_id = ?
            "#,
        )
        .bind(subject.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ProductConfig {
            tiers: parse_raw("tiers_json", subject.as_str(), &row.get::<String, _>("tiers_json")),
            areas: parse_raw("areas_json", subject.as_str(), &row.get::<String, _>("areas_json")),
        }))
    }

    // =========================================================================
    // Techniques
    // =========================================================================

    /// Store a raw technique definition.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn upsert_technique(&self, technique_ref: &str, raw: &Value) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO techniques (technique_ref, raw_json, updated_ms)
            VALUES (?, ?, ?)
            ON CONFLICT(technique_ref) DO UPDATE SET
                raw_json = excluded.raw_json,
                updated_ms = excluded.updated_ms
            "#,
        )
        .bind(technique_ref)
        .bind(raw.to_string())
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // =========================================================================
    // Whole catalog
    // =========================================================================

    /// Load every stored product and technique into a catalog.
    ///
    /// # Errors
    /// Returns an error if a query fails.
    pub async fn load_catalog(&self) -> Result<PricingCatalog, sqlx::Error> {
        let mut catalog = PricingCatalog::new();

        let rows = sqlx::query(
            r#"
            SELECT subject_id, tiers_json, areas_json
            FROM product_pricing
            ORDER BY subject_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            let subject: String = row.get("subject_id");
            let config = ProductConfig {
                tiers: parse_raw("tiers_json", &subject, &row.get::<String, _>("tiers_json")),
                areas: parse_raw("areas_json", &subject, &row.get::<String, _>("areas_json")),
            };
            catalog.products.insert(SubjectId::new(subject), config);
        }

        let rows = sqlx::query(
            r#"
            SELECT technique_ref, raw_json
            FROM techniques
            ORDER BY technique_ref ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        for row in rows {
            let technique_ref: String = row.get("technique_ref");
            let raw = parse_raw("raw_json", &technique_ref, &row.get::<String, _>("raw_json"));
            catalog.set_technique(technique_ref, raw);
        }

        Ok(catalog)
    }

    /// Store every product and technique of `catalog` in one transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn import_catalog(&self, catalog: &PricingCatalog) -> Result<usize, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let now = now_ms();
        let mut written = 0usize;

        for (subject, config) in &catalog.products {
            sqlx::query(
                r#"
                INSERT INTO product_pricing (subject_id, tiers_json, areas_json, updated_ms)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(subject_id) DO UPDATE SET
                    tiers_json = excluded.tiers_json,
                    areas_json = excluded.areas_json,
                    updated_ms = excluded.updated_ms
                "#,
            )
            .bind(subject.as_str())
            .bind(config.tiers.to_string())
            .bind(config.areas.to_string())
            .bind(now)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        for (technique_ref, raw) in &catalog.techniques {
            sqlx::query(
                r#"
                INSERT INTO techniques (technique_ref, raw_json, updated_ms)
                VALUES (?, ?, ?)
                ON CONFLICT(technique_ref) DO UPDATE SET
                    raw_json = excluded.raw_json,
                    updated_ms = excluded.updated_ms
                "#,
            )
            .bind(technique_ref.as_str())
            .bind(raw.to_string())
            .bind(now)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        tx.commit().await?;
        Ok(written)
    }
}
