use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::model::db::poll::{NewPoll, Poll};
use crate::model::db::user::{NewUser, User};
use crate::model::mongodb::Id;

use super::{PollStore, UserStore};

/// In-memory poll storage behind a plain mutex.
///
/// This is the explicit fallback backend for development and tests; data does
/// not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryPollStore {
    polls: Mutex<HashMap<Id, Poll>>,
}

impl MemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn polls(&self) -> MutexGuard<'_, HashMap<Id, Poll>> {
        // Only poisoned if a holder panicked, which nothing here does.
        self.polls.lock().unwrap()
    }
}

#[rocket::async_trait]
impl PollStore for MemoryPollStore {
    async fn load(&self, poll_id: Id) -> Result<Option<Poll>> {
        Ok(self.polls().get(&poll_id).cloned())
    }

    async fn insert(&self, poll: NewPoll) -> Result<Poll> {
        let poll = Poll {
            id: Id::new(),
            poll,
        };
        self.polls().insert(poll.id, poll.clone());
        Ok(poll)
    }

    async fn compare_and_save(&self, poll: &Poll, expected_version: u32) -> Result<Poll> {
        let mut polls = self.polls();
        let stored = polls
            .get_mut(&poll.id)
            .ok_or_else(|| Error::not_found(format!("Poll with ID '{}'", poll.id)))?;
        if stored.poll.version != expected_version {
            return Err(Error::conflict(format!(
                "Poll with ID '{}' is at version {}, expected {}",
                poll.id, stored.poll.version, expected_version
            )));
        }
        let mut saved = poll.clone();
        saved.poll.version = expected_version + 1;
        *stored = saved.clone();
        Ok(saved)
    }

    async fn remove(&self, poll_id: Id, expected_version: u32) -> Result<()> {
        let mut polls = self.polls();
        let stored = polls
            .get(&poll_id)
            .ok_or_else(|| Error::not_found(format!("Poll with ID '{}'", poll_id)))?;
        if stored.poll.version != expected_version {
            return Err(Error::conflict(format!(
                "Poll with ID '{}' is at version {}, expected {}",
                poll_id, stored.poll.version, expected_version
            )));
        }
        polls.remove(&poll_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Poll>> {
        Ok(self.polls().values().cloned().collect())
    }
}

/// In-memory user storage, mirroring [`MemoryPollStore`].
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Id, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> MutexGuard<'_, HashMap<Id, User>> {
        // Only poisoned if a holder panicked, which nothing here does.
        self.users.lock().unwrap()
    }
}

#[rocket::async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut users = self.users();
        if users.values().any(|existing| existing.user.email == user.email) {
            return Err(Error::email_taken(format!(
                "'{}' is already registered",
                user.email
            )));
        }
        let user = User {
            id: Id::new(),
            user,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users()
            .values()
            .find(|user| user.user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: Id) -> Result<Option<User>> {
        Ok(self.users().get(&user_id).cloned())
    }
}
