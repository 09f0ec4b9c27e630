use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{info, warn};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::types::SessionError;

/// Name of the merged output inside a session directory.
pub const ARTIFACT_NAME: &str = "scraped_output.pdf";

/// Lifecycle of a session. `Cleaned` has no variant: a cleaned session is
/// removed from the store entirely, which is what makes cleanup
/// exactly-once (removal from the map is the linearization point).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Directory allocated, nothing written yet.
    Created,
    /// Merged artifact written.
    Rendered,
    /// A response stream over the artifact has been opened.
    Served,
    /// Streamed once without cleanup; waiting for the client's
    /// acknowledgment or the janitor, whichever comes first.
    CleanupDeferred,
}

#[derive(Debug)]
struct SessionEntry {
    dir: PathBuf,
    state: SessionState,
    created_at: Instant,
    /// In-progress reads of the artifact. Cleanup never runs while this is
    /// nonzero; the janitor skips such sessions and catches them next sweep.
    readers: usize,
}

/// Owns the on-disk lifetime of every request's working directory.
///
/// One request owns one session; sessions are never shared. Destroying a
/// session means removing its directory, and exactly one caller can do so.
#[derive(Debug)]
pub struct SessionStore {
    root: PathBuf,
    max_age: Duration,
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>, max_age: Duration) -> Result<Self, SessionError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            max_age,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Allocate a fresh session directory.
    pub fn create(&self) -> Result<Uuid, SessionError> {
        let id = Uuid::new_v4();
        let dir = self.root.join(id.to_string());
        fs::create_dir_all(&dir)?;
        self.lock().insert(
            id,
            SessionEntry {
                dir,
                state: SessionState::Created,
                created_at: Instant::now(),
                readers: 0,
            },
        );
        Ok(id)
    }

    /// Write the merged artifact atomically (temp file, then rename) and
    /// advance the session to `Rendered`.
    pub fn write_artifact(&self, id: Uuid, bytes: &[u8]) -> Result<PathBuf, SessionError> {
        let dir = {
            let sessions = self.lock();
            let entry = sessions.get(&id).ok_or(SessionError::NotFound)?;
            entry.dir.clone()
        };

        let target = dir.join(ARTIFACT_NAME);
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        // Replace an existing artifact explicitly; rename alone does not on
        // every platform.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|err| SessionError::Io(err.error))?;

        let mut sessions = self.lock();
        if let Some(entry) = sessions.get_mut(&id) {
            entry.state = SessionState::Rendered;
        }
        Ok(target)
    }

    /// Register an in-progress read and return the artifact path.
    ///
    /// Verifies the artifact still exists; a session whose output is gone is
    /// indistinguishable from an unknown one. While the read is registered,
    /// cleanup of this session is excluded.
    pub fn begin_read(&self, id: Uuid) -> Result<PathBuf, SessionError> {
        let mut sessions = self.lock();
        let entry = sessions.get_mut(&id).ok_or(SessionError::NotFound)?;
        let artifact = entry.dir.join(ARTIFACT_NAME);
        if !artifact.is_file() {
            return Err(SessionError::NotFound);
        }
        entry.readers += 1;
        entry.state = SessionState::Served;
        Ok(artifact)
    }

    /// Drop a reader registration.
    ///
    /// With `clean` set, the session is removed once the last reader is gone
    /// (the client-acknowledged path). Without it, the session parks in
    /// `CleanupDeferred` for the janitor or a later acknowledgment.
    pub fn finish_read(&self, id: Uuid, clean: bool) {
        let removed = {
            let mut sessions = self.lock();
            let Some(entry) = sessions.get_mut(&id) else {
                return;
            };
            entry.readers = entry.readers.saturating_sub(1);
            if clean && entry.readers == 0 {
                sessions.remove(&id).map(|entry| entry.dir)
            } else {
                if !clean {
                    entry.state = SessionState::CleanupDeferred;
                }
                None
            }
        };
        if let Some(dir) = removed {
            remove_session_dir(&id, &dir);
        }
    }

    /// Remove every session older than the store's max age that has no
    /// in-progress read. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let expired: Vec<(Uuid, PathBuf)> = {
            let mut sessions = self.lock();
            let now = Instant::now();
            let aged: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, entry)| {
                    entry.readers == 0 && now.duration_since(entry.created_at) >= self.max_age
                })
                .map(|(id, _)| *id)
                .collect();
            aged.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|entry| (id, entry.dir)))
                .collect()
        };

        let count = expired.len();
        for (id, dir) in expired {
            remove_session_dir(&id, &dir);
        }
        count
    }

    /// Current lifecycle state, or `None` once the session is cleaned.
    pub fn state(&self, id: Uuid) -> Option<SessionState> {
        self.lock().get(&id).map(|entry| entry.state)
    }

    pub fn session_dir(&self, id: Uuid) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Best-effort removal. A failure is logged and swallowed: cleanup is out
/// of the client-visible failure path and must never fail a response
/// already in flight.
fn remove_session_dir(id: &Uuid, dir: &Path) {
    match fs::remove_dir_all(dir) {
        Ok(()) => info!("cleaned session {id}"),
        Err(err) => warn!("cleanup of session {id} failed: {err}"),
    }
}
