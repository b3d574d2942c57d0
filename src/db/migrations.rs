//! Database migrations and initialization.

use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::{debug, info};

/// Open (creating if needed) the pricing database and apply the schema.
///
/// `":memory:"` opens a private in-memory database on a single connection,
/// so every query sees the same schema.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = db_path == MEMORY;

    if !in_memory {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }
    }

    let url = if in_memory {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{}?mode=rwc", db_path)
    };

    let mut options = SqlitePoolOptions::new().max_connections(5);
    if in_memory {
        // closing the only connection would drop the database
        options = options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = options
        .after_connect(move |conn, _meta| {
            Box::pin(async move { configure_pragmas_conn(conn, in_memory).await })
        })
        .connect(&url)
        .await?;

    run_migrations(&pool).await?;

    info!(path = %db_path, "Pricing database ready");
    Ok(pool)
}

const MEMORY: &str = ":memory:";

/// Apply `schema.sql`. Every statement is idempotent.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let schema_sql = include_str!("schema.sql");

    let mut applied = 0usize;
    for statement in schema_sql.split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
            applied += 1;
        }
    }

    debug!(statements = applied, "Schema applied");
    Ok(())
}

/// Configure SQLite pragmas on each new connection.
async fn configure_pragmas_conn(
    conn: &mut SqliteConnection,
    in_memory: bool,
) -> Result<(), sqlx::Error> {
    use sqlx::Row;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;

    if !in_memory {
        // journal_mode returns the mode actually set
        let row = sqlx::query("PRAGMA journal_mode = WAL")
            .fetch_one(&mut *conn)
            .await?;
        let journal_mode: String = row.get(0);
        debug!(journal_mode = %journal_mode, "SQLite journal mode");
    }

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&mut *conn)
        .await?;

    Ok(())
}
