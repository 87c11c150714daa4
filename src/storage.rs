use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::Submission;

/// StorageError
///
/// Internal persistence failure type. These errors are logged server-side and
/// never surfaced to public-form callers (see the always-ack policy in `store.rs`).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Backend(String),
}

/// BackendKind
///
/// Identifies the active persistence strategy. `Database` additionally enables
/// the store's lazy re-load on empty reads (a startup load against a slow or
/// briefly unreachable database may have yielded nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Database,
    File,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Database => "database",
            BackendKind::File => "file",
            BackendKind::Mock => "mock",
        }
    }
}

// 1. StorageBackend Contract

/// StorageBackend
///
/// Defines the abstract contract for submission persistence. Both backends hold
/// the collection as one JSON-encoded array and rewrite it wholesale on every
/// save; there are no incremental writes. This trait is what lets the store swap
/// between the durable database row, the local file, and the in-memory mock used
/// in tests, without the handlers knowing which is live.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Loads the full submission list. Absent or unparseable stored data yields
    /// an empty list (logged), not an error; only genuine I/O and database
    /// failures propagate.
    async fn load(&self) -> Result<Vec<Submission>, StorageError>;

    /// Persists the full submission list, replacing whatever was stored before.
    async fn save(&self, submissions: &[Submission]) -> Result<(), StorageError>;

    fn kind(&self) -> BackendKind;
}

/// StorageState
///
/// The concrete type used to inject the persistence strategy into the store.
pub type StorageState = Arc<dyn StorageBackend>;

// 2. Database Backend (durable key-value row)

/// The single logical row holding the entire encoded submission array.
const STORE_KEY: &str = "submissions";

/// DatabaseBackend
///
/// Durable persistence as one key-value row in a SQLite database:
/// `store(key TEXT PRIMARY KEY, value TEXT)`, key `submissions`, value the
/// JSON-encoded array. `load` bootstraps the table; `save` upserts the full
/// array every time, so the only atomicity relied upon is the single upsert's own.
pub struct DatabaseBackend {
    pool: SqlitePool,
}

impl DatabaseBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StorageBackend for DatabaseBackend {
    /// load
    ///
    /// Creates the backing table if absent, then decodes the single row. A
    /// missing or empty row is a fresh deployment; an unparseable value is
    /// logged and treated as empty rather than poisoning startup.
    async fn load(&self) -> Result<Vec<Submission>, StorageError> {
        sqlx::query("CREATE TABLE IF NOT EXISTS store (key TEXT PRIMARY KEY, value TEXT)")
            .execute(&self.pool)
            .await?;

        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM store WHERE key = ?")
                .bind(STORE_KEY)
                .fetch_optional(&self.pool)
                .await?;

        let Some(raw) = raw.filter(|v| !v.is_empty()) else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Submission>>(&raw) {
            Ok(submissions) => Ok(submissions),
            Err(e) => {
                tracing::warn!("stored submissions row is unparseable, starting empty: {e}");
                Ok(Vec::new())
            }
        }
    }

    /// save
    ///
    /// Serializes the whole list and upserts it into the single row.
    async fn save(&self, submissions: &[Submission]) -> Result<(), StorageError> {
        let json = serde_json::to_string(submissions)?;
        sqlx::query("INSERT OR REPLACE INTO store (key, value) VALUES (?, ?)")
            .bind(STORE_KEY)
            .bind(&json)
            .execute(&self.pool)
            .await?;
        tracing::debug!("database: saved {} submissions", submissions.len());
        Ok(())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Database
    }
}

// 3. File Backend (local JSON)

/// FileBackend
///
/// Filesystem persistence: a pretty-printed JSON array at the configured path.
/// Ephemeral on hosts with non-persistent disks, which is exactly why the
/// database backend is preferred when configured.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    /// load
    ///
    /// A missing file is a fresh deployment; unparseable content is logged and
    /// treated as empty. Only genuine I/O failures propagate.
    async fn load(&self) -> Result<Vec<Submission>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Vec<Submission>>(&raw) {
            Ok(submissions) => Ok(submissions),
            Err(e) => {
                tracing::warn!(
                    "submissions file {} is unparseable, starting empty: {e}",
                    self.path.display()
                );
                Ok(Vec::new())
            }
        }
    }

    /// save
    ///
    /// Ensures the parent directory exists, then overwrites the file with the
    /// pretty-printed encoding of the full list.
    async fn save(&self, submissions: &[Submission]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(submissions)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::File
    }
}

// 4. Mock Backend (For Unit Tests)

/// MockBackend
///
/// An in-memory implementation of `StorageBackend` used exclusively for unit and
/// integration testing. The failing variant lets tests exercise the always-ack
/// persistence policy without touching a disk or database.
#[derive(Clone, Default)]
pub struct MockBackend {
    saved: Arc<Mutex<Vec<Submission>>>,
    should_fail: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            should_fail: true,
        }
    }

    /// What the backend last persisted; lets tests assert store/backend convergence.
    pub fn saved(&self) -> Vec<Submission> {
        self.saved.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    async fn load(&self) -> Result<Vec<Submission>, StorageError> {
        if self.should_fail {
            return Err(StorageError::Backend("mock load failure".to_string()));
        }
        Ok(self.saved())
    }

    async fn save(&self, submissions: &[Submission]) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Backend("mock save failure".to_string()));
        }
        *self.saved.lock().expect("mock lock poisoned") = submissions.to_vec();
        Ok(())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Mock
    }
}
