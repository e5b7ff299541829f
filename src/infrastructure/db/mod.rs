use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

pub type DbPool = AnyPool;

/// SQL flavour of the relational backend behind an [`AnyPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

pub async fn connect_pool(database_url: &str, max_connections: u32) -> anyhow::Result<DbPool> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Creates the schema when it is missing. Runs once at startup, never per request.
pub async fn migrate(pool: &DbPool, dialect: Dialect) -> anyhow::Result<()> {
    let identity = match dialect {
        Dialect::Postgres => "BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY",
        Dialect::Sqlite => "INTEGER PRIMARY KEY",
    };
    let statements = [
        format!(
            "CREATE TABLE IF NOT EXISTS documents (
                id {identity},
                revision BIGINT NOT NULL DEFAULT 0
            )"
        ),
        "CREATE TABLE IF NOT EXISTS document_data (
            document_id BIGINT PRIMARY KEY REFERENCES documents(id) ON DELETE CASCADE,
            file_data TEXT NOT NULL,
            extension TEXT NOT NULL CHECK (length(extension) <= 5),
            file_name TEXT NOT NULL CHECK (length(file_name) <= 255),
            mime_type TEXT NOT NULL CHECK (length(mime_type) <= 50)
        )"
        .to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS tags (
                id {identity},
                name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 255)
            )"
        ),
        "CREATE TABLE IF NOT EXISTS document_tags (
            document_id BIGINT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            tag_id BIGINT NOT NULL REFERENCES tags(id),
            PRIMARY KEY (document_id, tag_id)
        )"
        .to_string(),
    ];
    for stmt in &statements {
        sqlx::query(stmt).execute(pool).await?;
    }
    tracing::debug!(?dialect, "schema_ensured");
    Ok(())
}

pub mod repositories;
