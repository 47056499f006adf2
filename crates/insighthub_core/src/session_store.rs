//! crates/insighthub_core/src/session_store.rs
//!
//! In-memory session storage with lazy TTL eviction.
//!
//! The store is constructed once at startup and shared by reference. Every
//! operation sweeps expired sessions, then performs its lookup and mutation
//! while holding the same lock, so `get_or_create` is a single
//! read-modify-write step even under a multi-threaded runtime.

use crate::domain::{DocType, Document, DocumentSummary, Page, Session, SessionStatus};
use crate::ports::{PortError, PortResult};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Default session lifetime, measured from the last access.
pub const DEFAULT_TTL_SECONDS: i64 = 60 * 60;

/// A source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct SessionStore {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECONDS)
    }
}

impl SessionStore {
    /// Creates a store using the system clock.
    pub fn new(ttl_seconds: i64) -> Self {
        Self::with_clock(ttl_seconds, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_seconds: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: Duration::seconds(ttl_seconds),
            clock,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Removes every expired session and returns how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();
        self.sweep(&mut sessions, now)
    }

    fn sweep(&self, sessions: &mut HashMap<String, Session>, now: DateTime<Utc>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_accessed <= self.ttl);
        let removed = before - sessions.len();
        if removed > 0 {
            debug!("Evicted {} expired session(s).", removed);
        }
        removed
    }

    fn is_blank(session_id: &str) -> bool {
        session_id.trim().is_empty()
    }

    /// Returns the session, creating an empty one if it does not exist.
    pub fn get_or_create(&self, session_id: &str) -> PortResult<Session> {
        if Self::is_blank(session_id) {
            return Err(PortError::InvalidArgument(
                "session_id is required".to_string(),
            ));
        }
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();
        self.sweep(&mut sessions, now);

        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id, now));
        session.last_accessed = now;
        Ok(session.clone())
    }

    /// Returns the session if it exists and has not expired.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        if Self::is_blank(session_id) {
            return None;
        }
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();
        self.sweep(&mut sessions, now);

        let session = sessions.get_mut(session_id)?;
        session.last_accessed = now;
        Some(session.clone())
    }

    /// Removes a session and everything stored in it.
    pub fn delete(&self, session_id: &str) -> bool {
        if Self::is_blank(session_id) {
            return false;
        }
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();
        self.sweep(&mut sessions, now);
        sessions.remove(session_id).is_some()
    }

    /// Inserts a document, replacing any previous document with the same id.
    pub fn upsert_document(
        &self,
        session_id: &str,
        doc_id: &str,
        filename: &str,
        doc_type: DocType,
        pages: Vec<Page>,
    ) -> PortResult<Arc<Document>> {
        if Self::is_blank(session_id) {
            return Err(PortError::InvalidArgument(
                "session_id is required".to_string(),
            ));
        }
        let now = self.clock.now();
        let mut sessions = self.sessions.lock();
        self.sweep(&mut sessions, now);

        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(session_id, now));
        let document = Arc::new(Document {
            doc_id: doc_id.to_string(),
            filename: filename.to_string(),
            doc_type,
            pages,
            created_at: now,
        });
        session
            .documents
            .insert(doc_id.to_string(), Arc::clone(&document));
        session.last_accessed = now;
        Ok(document)
    }

    /// All documents of a session, in no particular order.
    pub fn list_documents(&self, session_id: &str) -> Vec<Arc<Document>> {
        self.get(session_id)
            .map(|s| s.documents.into_values().collect())
            .unwrap_or_default()
    }

    /// The requested documents that exist, in the order of `doc_ids`.
    pub fn get_documents(&self, session_id: &str, doc_ids: &[String]) -> Vec<Arc<Document>> {
        let Some(session) = self.get(session_id) else {
            return Vec::new();
        };
        doc_ids
            .iter()
            .filter_map(|id| session.documents.get(id).cloned())
            .collect()
    }

    pub fn status(&self, session_id: &str) -> SessionStatus {
        match self.get(session_id) {
            Some(session) => {
                let documents: Vec<DocumentSummary> =
                    session.documents.values().map(|d| d.summary()).collect();
                SessionStatus {
                    session_exists: true,
                    session_id: session_id.to_string(),
                    document_count: documents.len(),
                    documents,
                }
            }
            None => SessionStatus {
                session_exists: false,
                session_id: session_id.to_string(),
                document_count: 0,
                documents: Vec::new(),
            },
        }
    }

    /// Number of sessions currently held, expired or not.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
