//! Per-user search sessions.
//!
//! A [`Session`] holds everything needed to show and move through one
//! user's results: the active query and source, the last fetched page, the
//! buffered listings of that page, the cursor into them, and the chat
//! messages currently used to display the listing under the cursor.
//!
//! The [`SessionStore`] partitions sessions by [`UserId`]. Each session sits
//! behind its own async mutex, so intents for one user are serialized while
//! different users never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::channels::{MessageId, UserId};
use crate::error::NavigationError;
use crate::sources::{Listing, SourceId};

/// Where a session is in the search flow. Derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No query submitted.
    Idle,
    /// Query submitted, no source picked.
    AwaitingSource,
    /// Query and source set, nothing buffered to show.
    Ready,
    /// A listing is on display.
    Displaying,
}

/// One user's search state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Last submitted search text. Empty means no active search.
    pub query: String,
    pub selected_source: Option<SourceId>,
    /// Last page fetched for the active query and source. Starts at 1.
    pub page: u32,
    /// Results of the most recent fetch. Replaced on every fetch.
    pub listings: Vec<Listing>,
    pub cursor: usize,
    /// Messages showing fragment 1 of the current display.
    pub primary: Option<MessageId>,
    /// Messages showing fragments 2..N of the current display.
    pub overflow: Vec<MessageId>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            query: String::new(),
            selected_source: None,
            page: 1,
            listings: Vec::new(),
            cursor: 0,
            primary: None,
            overflow: Vec::new(),
        }
    }
}

impl Session {
    pub fn state(&self) -> SessionState {
        if self.query.is_empty() {
            SessionState::Idle
        } else if self.selected_source.is_none() {
            SessionState::AwaitingSource
        } else if self.cursor < self.listings.len() {
            SessionState::Displaying
        } else {
            SessionState::Ready
        }
    }

    /// Listing under the cursor, if the cursor is renderable.
    pub fn current(&self) -> Option<&Listing> {
        self.listings.get(self.cursor)
    }

    pub fn can_retreat(&self) -> bool {
        self.cursor > 0
    }

    /// True while anything is buffered: stepping past the last buffered
    /// listing fetches the next page instead of stopping.
    pub fn can_advance(&self) -> bool {
        self.cursor < self.listings.len()
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What to do with an intent that arrives while another intent for the
/// same user is still running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BusyPolicy {
    /// Fail fast with [`NavigationError::Busy`].
    #[default]
    Reject,
    /// Wait for the running intent to finish.
    Queue,
}

impl std::str::FromStr for BusyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "queue" | "wait" => Ok(Self::Queue),
            other => Err(format!("must be 'reject' or 'queue', got '{other}'")),
        }
    }
}

/// Sessions keyed by user.
pub struct SessionStore {
    sessions: RwLock<HashMap<UserId, Arc<Mutex<Session>>>>,
    policy: BusyPolicy,
}

impl SessionStore {
    pub fn new(policy: BusyPolicy) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            policy,
        }
    }

    pub fn policy(&self) -> BusyPolicy {
        self.policy
    }

    /// Session cell for `user`, created on first use.
    fn cell(&self, user: UserId) -> Arc<Mutex<Session>> {
        if let Some(cell) = self
            .sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&user)
        {
            return Arc::clone(cell);
        }

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(sessions.entry(user).or_insert_with(|| {
            tracing::debug!(%user, "Creating session");
            Arc::new(Mutex::new(Session::default()))
        }))
    }

    /// Take exclusive access to `user`'s session for the length of one intent.
    ///
    /// A session removed while this call waited is not handed out; the
    /// user's current session is locked instead.
    pub async fn acquire(&self, user: UserId) -> Result<OwnedMutexGuard<Session>, NavigationError> {
        loop {
            let cell = self.cell(user);
            let guard = match self.policy {
                BusyPolicy::Reject => Arc::clone(&cell).try_lock_owned().map_err(|_| {
                    tracing::debug!(%user, "Rejecting intent, session busy");
                    NavigationError::Busy
                })?,
                BusyPolicy::Queue => Arc::clone(&cell).lock_owned().await,
            };
            if self.is_current(user, &cell) {
                return Ok(guard);
            }
        }
    }

    fn is_current(&self, user: UserId, cell: &Arc<Mutex<Session>>) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&user)
            .is_some_and(|current| Arc::ptr_eq(current, cell))
    }

    /// Drop `user`'s session. The next intent starts from a fresh one.
    pub fn remove(&self, user: UserId) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&user)
            .is_some();
        if removed {
            tracing::debug!(%user, "Removed session");
        }
        removed
    }

    /// Copy of `user`'s session, waiting for any running intent to finish.
    pub async fn snapshot(&self, user: UserId) -> Option<Session> {
        let cell = self
            .sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&user)
            .cloned()?;
        let session = cell.lock().await;
        Some(session.clone())
    }

    /// Copy of `user`'s session without waiting. `Ok(None)` when the user
    /// has no session yet, [`NavigationError::Busy`] while an intent runs.
    pub fn peek(&self, user: UserId) -> Result<Option<Session>, NavigationError> {
        let Some(cell) = self
            .sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&user)
            .cloned()
        else {
            return Ok(None);
        };
        let session = cell.try_lock().map_err(|_| NavigationError::Busy)?;
        Ok(Some(session.clone()))
    }

    /// Number of users with a session.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(BusyPolicy::default())
    }
}
