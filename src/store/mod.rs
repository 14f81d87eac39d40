//! Storage abstraction over polls and users.
//!
//! Routes and services only see the [`PollStore`] and [`UserStore`] traits;
//! the concrete backend is chosen at launch from the `storage` config value.

mod memory;
mod mongo;

pub use memory::{MemoryPollStore, MemoryUserStore};
pub use mongo::{MongoPollStore, MongoUserStore};

use crate::error::Result;
use crate::model::db::poll::{NewPoll, Poll};
use crate::model::db::user::{NewUser, User};
use crate::model::mongodb::Id;

/// Poll persistence with optimistic concurrency control.
///
/// Every poll carries a version number. Writers read a poll, modify a copy,
/// and submit it back along with the version they read; the store commits the
/// write only if nobody else got there first.
#[rocket::async_trait]
pub trait PollStore: Send + Sync {
    /// Load a poll snapshot, or `None` if it doesn't exist.
    async fn load(&self, poll_id: Id) -> Result<Option<Poll>>;

    /// Insert a new poll, returning it with its assigned ID.
    async fn insert(&self, poll: NewPoll) -> Result<Poll>;

    /// Commit `poll` if its stored version still equals `expected_version`.
    ///
    /// On success the stored version becomes `expected_version + 1` and the
    /// saved poll is returned. Fails with `Error::Conflict` if another writer
    /// committed in between, or `Error::NotFound` if the poll is gone.
    async fn compare_and_save(&self, poll: &Poll, expected_version: u32) -> Result<Poll>;

    /// Delete a poll if its stored version still equals `expected_version`.
    async fn remove(&self, poll_id: Id, expected_version: u32) -> Result<()>;

    /// All polls, in no particular order.
    async fn list(&self) -> Result<Vec<Poll>>;
}

/// User persistence.
#[rocket::async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user, returning it with its assigned ID.
    /// Fails with `Error::EmailTaken` if the email is already registered.
    async fn insert(&self, user: NewUser) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, user_id: Id) -> Result<Option<User>>;
}
