//! Exclusive sections for balance mutation.
//!
//! Every charge and use runs inside [`UserLocks::run_exclusive`]. In
//! [`LockMode::PerUser`] each user gets its own mutex, created on first use
//! and kept for the lifetime of the process; in [`LockMode::Global`] all users
//! share one mutex.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use points_core::UserId;

/// Granularity of the balance-mutation lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// One lock per user. Different users mutate in parallel.
    #[default]
    PerUser,

    /// One lock for every user.
    Global,
}

impl FromStr for LockMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-user" | "per_user" | "peruser" => Ok(Self::PerUser),
            "global" => Ok(Self::Global),
            other => Err(format!("unknown lock mode: {other}")),
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerUser => f.write_str("per-user"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// Lock registry handing out exclusive sections keyed by user.
#[derive(Debug)]
pub struct UserLocks {
    mode: LockMode,
    global: Arc<Mutex<()>>,
    per_user: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Create a registry with the given granularity.
    #[must_use]
    pub fn new(mode: LockMode) -> Self {
        Self {
            mode,
            global: Arc::new(Mutex::new(())),
            per_user: Mutex::new(HashMap::new()),
        }
    }

    /// The configured granularity.
    #[must_use]
    pub const fn mode(&self) -> LockMode {
        self.mode
    }

    /// Number of users that have a dedicated lock.
    ///
    /// Always 0 in [`LockMode::Global`].
    #[must_use]
    pub fn tracked_users(&self) -> usize {
        self.per_user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run `f` while holding the exclusive section of `user_id`.
    ///
    /// The registry map is only locked long enough to fetch the user's mutex;
    /// it is released before that mutex is acquired. A poisoned mutex is
    /// entered anyway, since it guards no data.
    pub fn run_exclusive<R>(&self, user_id: UserId, f: impl FnOnce() -> R) -> R {
        let lock = self.handle(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    fn handle(&self, user_id: UserId) -> Arc<Mutex<()>> {
        match self.mode {
            LockMode::Global => Arc::clone(&self.global),
            LockMode::PerUser => {
                let mut map = self
                    .per_user
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                Arc::clone(map.entry(user_id).or_default())
            }
        }
    }
}

impl Default for UserLocks {
    fn default() -> Self {
        Self::new(LockMode::default())
    }
}
