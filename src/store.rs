use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::Submission;
use crate::storage::{BackendKind, StorageError, StorageState};

/// SubmissionStore
///
/// Owns the single in-memory submission sequence (insertion-order significant,
/// append-only until a full clear) and mirrors it to the injected persistence
/// backend on every mutation.
///
/// **Persistence policy (deliberate, debatable)**: mutations return the save
/// `Result` but the HTTP handlers log failures and acknowledge success anyway —
/// availability of the public form is favored over durability guarantees. The
/// result is surfaced here, not swallowed, so a caller that wants stronger
/// guarantees can have them.
///
/// Writers take the cache write lock across both the in-memory mutation and the
/// backend save, so two simultaneous submissions cannot interleave push+persist
/// and lose an update.
#[derive(Clone)]
pub struct SubmissionStore {
    backend: StorageState,
    cache: Arc<RwLock<Vec<Submission>>>,
}

impl SubmissionStore {
    pub fn new(backend: StorageState) -> Self {
        Self {
            backend,
            cache: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// load
    ///
    /// Startup hydration of the cache from the backend. A load failure degrades
    /// to an empty store rather than failing startup; the error is logged.
    pub async fn load(&self) {
        match self.backend.load().await {
            Ok(submissions) => {
                tracing::info!(
                    "{}: loaded {} submissions",
                    self.backend.kind().as_str(),
                    submissions.len()
                );
                *self.cache.write().await = submissions;
            }
            Err(e) => {
                tracing::warn!(
                    "{}: load failed, starting with an empty store: {e}",
                    self.backend.kind().as_str()
                );
            }
        }
    }

    /// snapshot
    ///
    /// A copy of the current sequence. When the database backend is active and
    /// the cache is empty, one re-load is attempted first — this covers a failed
    /// or raced startup load without introducing runtime backend switching.
    pub async fn snapshot(&self) -> Vec<Submission> {
        if self.backend.kind() == BackendKind::Database && self.cache.read().await.is_empty() {
            match self.backend.load().await {
                Ok(loaded) if !loaded.is_empty() => {
                    let mut cache = self.cache.write().await;
                    // Another request may have appended while we were loading.
                    if cache.is_empty() {
                        *cache = loaded;
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("database: lazy re-load failed: {e}"),
            }
        }
        self.cache.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// append
    ///
    /// Pushes a submission and persists the full sequence. The record is in the
    /// in-memory sequence even when the returned save result is an error.
    pub async fn append(&self, submission: Submission) -> Result<(), StorageError> {
        let mut cache = self.cache.write().await;
        cache.push(submission);
        self.backend.save(&cache).await
    }

    /// replace_all
    ///
    /// Replaces the whole sequence (the clear operation passes an empty one)
    /// and persists the result.
    pub async fn replace_all(&self, submissions: Vec<Submission>) -> Result<(), StorageError> {
        let mut cache = self.cache.write().await;
        *cache = submissions;
        self.backend.save(&cache).await
    }
}
