//! In-memory session table.
//!
//! # Responsibilities
//! - Create sessions with random 63-character identifiers
//! - Look up, update and destroy sessions by id
//! - Expire idle sessions (on demand and from a background sweeper)
//!
//! # Design Decisions
//! - Bounded: creation fails once `capacity` sessions are live
//! - The store owns sessions; callers only ever get cloned snapshots
//! - Time comes from a `Clock` so expiry can be tested without sleeping

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::security::csrf::generate_token;

/// Length of generated session identifiers.
pub const SESSION_ID_LEN: usize = 63;
/// Largest data payload kept per session, in bytes.
pub const SESSION_DATA_LIMIT: usize = 1024;
pub const DEFAULT_MAX_SESSIONS: usize = 1024;
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub user_id: Option<String>,
    pub created_at: SystemTime,
    pub last_access: SystemTime,
    pub data: String,
    pub authenticated: bool,
}

impl Session {
    fn idle_for(&self, now: SystemTime) -> Duration {
        now.duration_since(self.last_access).unwrap_or_default()
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> SystemTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Concurrent, expiring session table.
pub struct SessionStore {
    sessions: Mutex<Vec<Session>>,
    capacity: usize,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        Self::with_clock(capacity, timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            capacity,
            timeout,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Session>> {
        self.sessions.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Create a session and return its id.
    pub fn create(&self, user_id: Option<&str>) -> Result<String> {
        let now = self.clock.now();
        let mut sessions = self.lock();
        if sessions.len() >= self.capacity {
            tracing::warn!(capacity = self.capacity, "Session table full");
            return Err(Error::CapacityExceeded {
                resource: "session table",
                capacity: self.capacity,
            });
        }

        let id = loop {
            let candidate = generate_token(SESSION_ID_LEN);
            if !sessions.iter().any(|s| s.id == candidate) {
                break candidate;
            }
        };
        sessions.push(Session {
            id: id.clone(),
            user_id: user_id.map(str::to_string),
            created_at: now,
            last_access: now,
            data: String::new(),
            authenticated: user_id.is_some(),
        });
        tracing::debug!(user_id = ?user_id, live = sessions.len(), "Session created");
        Ok(id)
    }

    /// Snapshot of a live session. Refreshes its last-access time.
    ///
    /// A session idle past the timeout is reported as missing even before
    /// the sweeper removes it.
    pub fn get(&self, id: &str) -> Result<Session> {
        let now = self.clock.now();
        let mut sessions = self.lock();
        let session = self.live_mut(&mut sessions, id, now)?;
        session.last_access = now;
        Ok(session.clone())
    }

    /// Replace the session data, truncated to `SESSION_DATA_LIMIT` bytes.
    pub fn update(&self, id: &str, data: &str) -> Result<()> {
        let now = self.clock.now();
        let mut sessions = self.lock();
        let session = self.live_mut(&mut sessions, id, now)?;
        session.data = truncate_to_boundary(data, SESSION_DATA_LIMIT).to_string();
        session.last_access = now;
        Ok(())
    }

    pub fn destroy(&self, id: &str) -> Result<()> {
        let mut sessions = self.lock();
        let index = sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::NotFound("session".to_string()))?;
        sessions.remove(index);
        tracing::debug!(live = sessions.len(), "Session destroyed");
        Ok(())
    }

    /// Remove sessions idle longer than the timeout. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|s| s.idle_for(now) <= self.timeout);
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, live = sessions.len(), "Expired sessions removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn live_mut<'s>(
        &self,
        sessions: &'s mut [Session],
        id: &str,
        now: SystemTime,
    ) -> Result<&'s mut Session> {
        sessions
            .iter_mut()
            .find(|s| s.id == id && s.idle_for(now) <= self.timeout)
            .ok_or_else(|| Error::NotFound("session".to_string()))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TIMEOUT)
    }
}

/// Run `sweep` every `interval` until shutdown is signalled.
pub fn spawn_sweeper(
    store: Arc<SessionStore>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    store.sweep();
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Session sweeper stopping");
                    break;
                }
            }
        }
    })
}

fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
