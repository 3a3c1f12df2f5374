use diesel::{
    PgConnection, RunQueryDsl,
    migration::{Migration, MigrationName, MigrationSource},
    pg::Pg,
    r2d2::{self, ConnectionManager, CustomizeConnection},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::collections::HashSet;
use std::time::Duration;

use crate::infrastructure::database::models::ColumnType;

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Serialises schema migration across processes sharing one database.
const MIGRATION_LOCK_KEY: i64 = 0x4149_4b52;

#[derive(Debug)]
pub enum DatabaseError {
    ConnectionError(String),
    PoolError(String),
    ConfigurationError(String),
    MigrationError(String),
    MigrationRequired(String),
}

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            DatabaseError::PoolError(msg) => write!(f, "Pool error: {}", msg),
            DatabaseError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            DatabaseError::MigrationError(msg) => write!(f, "Migration error: {}", msg),
            DatabaseError::MigrationRequired(msg) => write!(f, "Migration required: {}", msg),
        }
    }
}

impl std::error::Error for DatabaseError {}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub statement_timeout: Duration,
}

/// Applies `statement_timeout` to every connection the pool hands out.
#[derive(Debug)]
struct StatementTimeout(u128);

impl CustomizeConnection<PgConnection, r2d2::Error> for StatementTimeout {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), r2d2::Error> {
        diesel::sql_query(format!("SET statement_timeout = {}", self.0))
            .execute(conn)
            .map(|_| ())
            .map_err(r2d2::Error::QueryError)
    }
}

pub fn create_connection_pool(config: &DatabaseConfig) -> Result<DbPool, DatabaseError> {
    if config.url.is_empty() {
        return Err(DatabaseError::ConfigurationError(
            "DATABASE_URL not set".to_string(),
        ));
    }

    let manager = ConnectionManager::<PgConnection>::new(&config.url);

    r2d2::Pool::builder()
        .max_size(config.pool_size)
        .min_idle(Some(1))
        .connection_customizer(Box::new(StatementTimeout(
            config.statement_timeout.as_millis(),
        )))
        .build(manager)
        .map_err(|e| DatabaseError::PoolError(e.to_string()))
}

pub fn get_connection_from_pool(pool: &DbPool) -> Result<DbConnection, DatabaseError> {
    pool.get().map_err(|e| DatabaseError::PoolError(e.to_string()))
}

/// Brings the schema up to date under a session advisory lock, or, with
/// `apply == false`, only checks that nothing is pending. A database that
/// carries migrations this binary does not know is refused either way.
pub fn prepare_schema(conn: &mut PgConnection, apply: bool) -> Result<(), DatabaseError> {
    diesel::sql_query(format!("SELECT pg_advisory_lock({})", MIGRATION_LOCK_KEY))
        .execute(conn)
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

    let result = migrate_locked(conn, apply);

    if let Err(e) =
        diesel::sql_query(format!("SELECT pg_advisory_unlock({})", MIGRATION_LOCK_KEY)).execute(conn)
    {
        tracing::warn!("Failed to release migration lock: {}", e);
    }

    result
}

fn migrate_locked(conn: &mut PgConnection, apply: bool) -> Result<(), DatabaseError> {
    let known: HashSet<String> = MigrationSource::<Pg>::migrations(&MIGRATIONS)
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?
        .iter()
        .map(|m| m.name().version().to_string())
        .collect();

    let applied = conn
        .applied_migrations()
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    let unknown: Vec<String> = applied
        .iter()
        .map(|v| v.to_string())
        .filter(|v| !known.contains(v))
        .collect();
    if !unknown.is_empty() {
        return Err(DatabaseError::MigrationRequired(format!(
            "database carries migrations unknown to this build: {}",
            unknown.join(", ")
        )));
    }

    let pending = conn
        .has_pending_migration(MIGRATIONS)
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    if !pending {
        tracing::info!("Database schema is up to date");
        return Ok(());
    }
    if !apply {
        return Err(DatabaseError::MigrationRequired(
            "pending migrations and RUN_MIGRATIONS is disabled".to_string(),
        ));
    }

    let versions = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    for version in versions {
        tracing::info!("Applied migration {}", version);
    }
    Ok(())
}

/// Dimension declared on `ai_chunks.embedding`, if the column exists.
pub fn embedding_column_dimension(
    conn: &mut PgConnection,
) -> Result<Option<usize>, diesel::result::Error> {
    let rows: Vec<ColumnType> = diesel::sql_query(
        "SELECT format_type(atttypid, atttypmod) AS type_name \
         FROM pg_attribute \
         WHERE attrelid = to_regclass('ai_chunks') \
           AND attname = 'embedding' AND NOT attisdropped",
    )
    .load(conn)?;

    Ok(rows.first().and_then(|row| parse_vector_dimension(&row.type_name)))
}

/// Parses `vector(1536)` into `1536`.
fn parse_vector_dimension(type_name: &str) -> Option<usize> {
    type_name
        .strip_prefix("vector(")?
        .strip_suffix(')')?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vector_dimension() {
        assert_eq!(parse_vector_dimension("vector(1536)"), Some(1536));
        assert_eq!(parse_vector_dimension("vector"), None);
        assert_eq!(parse_vector_dimension("text"), None);
    }

    #[test]
    fn test_embedded_migrations_are_versioned() {
        let migrations = MigrationSource::<Pg>::migrations(&MIGRATIONS).unwrap();
        assert!(migrations.len() >= 4);
    }
}
