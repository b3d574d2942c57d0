//! Order-line tier snapshot operations for the repository.

use crate::domain::{Decimal, SubjectId, TierSnapshot};
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

use super::Repository;

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn to_u64(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

impl Repository {
    /// Record the tier that priced an order line.
    ///
    /// The first snapshot for a line wins: later configuration changes must
    /// not rewrite what the customer was charged.
    ///
    /// Returns true when a new snapshot was stored.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_tier_snapshot(&self, snapshot: &TierSnapshot) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO order_line_tiers (
                order_id, line_id, subject_id, quantity, qty_from, qty_to,
                unit_price, currency, source, captured_ms
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(order_id, line_id) DO NOTHING
            "#,
        )
        .bind(snapshot.order_id.as_str())
        .bind(snapshot.line_id.as_str())
        .bind(snapshot.subject_id.as_str())
        .bind(to_i64(snapshot.quantity))
        .bind(to_i64(snapshot.qty_from))
        .bind(to_i64(snapshot.qty_to))
        .bind(snapshot.unit_price.to_canonical_string())
        .bind(snapshot.currency.as_deref())
        .bind(snapshot.source.as_deref())
        .bind(snapshot.captured_ms)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All tier snapshots of an order, by line id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_tier_snapshots(&self, order_id: &str) -> Result<Vec<TierSnapshot>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, line_id, subject_id, quantity, qty_from, qty_to,
                   unit_price, currency, source, captured_ms
            FROM order_line_tiers
            WHERE order_id = ?
            ORDER BY line_id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let line_id: String = row.get("line_id");
                let price_str: String = row.get("unit_price");
                let unit_price = Decimal::from_str(&price_str).unwrap_or_else(|e| {
                    warn!(
                        order_id = %order_id,
                        line_id = %line_id,
                        unit_price = %price_str,
                        error = %e,
                        "Failed to parse snapshot unit price, using default"
                    );
                    Decimal::default()
                });

                TierSnapshot {
                    order_id: row.get("order_id"),
                    line_id,
                    subject_id: SubjectId::new(row.get::<String, _>("subject_id")),
                    quantity: to_u64(row.get("quantity")),
                    qty_from: to_u64(row.get("qty_from")),
                    qty_to: to_u64(row.get("qty_to")),
                    unit_price,
                    currency: row.get("currency"),
                    source: row.get("source"),
                    captured_ms: row.get("captured_ms"),
                }
            })
            .collect())
    }
}
