//! SQLite storage with connection pooling and migrations
//!
//! Organized by domain:
//! - `batches` - Extraction batches and their records
//! - `reports` - Generated reports

use std::path::Path;

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;

mod batches;
mod reports;


pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Timestamp layout used by SQLite's `CURRENT_TIMESTAMP`
pub(crate) const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(s, SQLITE_DATETIME)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    db_path: String,
}

impl Database {
    /// Open (or create) the database file and run migrations
    pub fn new(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Backed by a temp file: a pooled `:memory:` database would give every
    /// connection its own empty schema.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "slipscan_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- One row per archive run
            CREATE TABLE IF NOT EXISTS extraction_batches (
                id INTEGER PRIMARY KEY,
                case_id TEXT,
                case_title TEXT,
                evidence_id TEXT,
                archive_sha256 TEXT NOT NULL,
                artifact_url TEXT,
                candidate_count INTEGER NOT NULL,
                processed_count INTEGER NOT NULL,
                skipped_count INTEGER NOT NULL,
                unreadable_count INTEGER NOT NULL DEFAULT 0,
                rejected_count INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_batches_case ON extraction_batches(case_id);

            -- Records keep their batch order through `position`
            CREATE TABLE IF NOT EXISTS transaction_records (
                id INTEGER PRIMARY KEY,
                batch_id INTEGER NOT NULL REFERENCES extraction_batches(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                file TEXT NOT NULL,
                bank TEXT NOT NULL,
                sender_name TEXT NOT NULL,
                sender_bank TEXT NOT NULL,
                sender_acc TEXT NOT NULL,
                receiver_name TEXT NOT NULL,
                receiver_bank TEXT NOT NULL,
                receiver_acc TEXT NOT NULL,
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                qr_code_text TEXT NOT NULL,
                UNIQUE(batch_id, position)
            );

            CREATE INDEX IF NOT EXISTS idx_records_batch ON transaction_records(batch_id);

            -- Report content is stored as JSON
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY,
                case_id TEXT NOT NULL,
                case_title TEXT NOT NULL,
                report_type TEXT NOT NULL,
                description TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at DATETIME NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reports_case ON reports(case_id);
            "#,
        )?;

        info!("Database migrations complete");
        Ok(())
    }
}
