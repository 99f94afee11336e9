use crate::config::{Config, MEMORY_DATABASE};
use anyhow::Result;
use libsql::{Builder, Connection, Database as LibsqlDatabase};
use std::path::Path;
use std::time::Duration;

const SYSTEM_MIGRATIONS: &[(&str, &str)] =
    &[("system/000_migrations_table.sql", include_str!("migrations/system/000_migrations_table.sql"))];

pub struct Database {
    _db: LibsqlDatabase,
    conn: Connection,
}

impl Database {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn is_migration_applied(conn: &Connection, name: &str) -> Result<bool> {
        let query = "SELECT 1 FROM _migrations WHERE name = ?";
        match conn.query(query, libsql::params![name]).await {
            Ok(mut rows) => Ok(rows.next().await?.is_some()),
            Err(e) => {
                if e.to_string().contains("no such table") {
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn record_migration(conn: &Connection, name: &str) -> Result<()> {
        let query = r#"
            INSERT INTO _migrations (name, applied_at)
            VALUES (?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#;
        conn.execute(query, libsql::params![name]).await?;
        Ok(())
    }

    async fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
        if Self::is_migration_applied(conn, name).await? {
            tracing::debug!("migration {} already applied, skipping", name);
            return Ok(());
        }

        tracing::info!("applying migration: {}", name);
        conn.execute_batch(sql)
            .await
            .map_err(|e| anyhow::anyhow!("failed to execute migration {name}: {e}"))?;

        Self::record_migration(conn, name).await?;
        Ok(())
    }

    pub async fn new(cfg: &Config, data_dir: &Path) -> Result<Self> {
        let db = if cfg.app.get_db() == MEMORY_DATABASE {
            tracing::info!("[db] running with an in-memory database");
            Builder::new_local(MEMORY_DATABASE).build().await?
        } else {
            let path = data_dir.join(cfg.app.get_db());
            match cfg.app.replica() {
                Some((url, token)) => {
                    tracing::info!("[db] running in synced database mode (offline writes)");
                    let sync_interval = Duration::from_secs(cfg.app.sync_interval_seconds);
                    Builder::new_synced_database(&path, url, token)
                        .sync_interval(sync_interval)
                        .build()
                        .await?
                }
                None => Builder::new_local(&path).build().await?,
            }
        };

        Self::setup(db).await
    }

    /// Opens a private in-memory database with all migrations applied.
    pub async fn in_memory() -> Result<Self> {
        let db = Builder::new_local(MEMORY_DATABASE).build().await?;
        Self::setup(db).await
    }

    async fn setup(db: LibsqlDatabase) -> Result<Self> {
        let conn = db.connect()?;
        conn.query("SELECT 1", ()).await?;

        for (filename, sql) in SYSTEM_MIGRATIONS {
            Self::run_migration(&conn, filename, sql).await?;
        }

        for (filename, sql) in crate::bookmark::migrations() {
            Self::run_migration(&conn, filename, sql).await?;
        }

        Ok(Database { _db: db, conn })
    }

    pub async fn ping(&self) -> Result<()> {
        self.conn.query("SELECT 1", ()).await?;
        Ok(())
    }
}
