use std::future::Future;
use std::time::Duration;

use mongodb::{
    bson::doc,
    error::{Error as DbError, ErrorKind, WriteFailure},
    Database,
};
use rocket::futures::TryStreamExt;
use rocket::tokio::time::timeout;

use crate::error::{Error, Result};
use crate::model::db::poll::{NewPoll, Poll};
use crate::model::db::user::{NewUser, User};
use crate::model::mongodb::{Coll, Id};

use super::{PollStore, UserStore};

/// MongoDB-backed poll storage.
///
/// Optimistic concurrency rides on the `version` field: all writes filter on
/// `{_id, version}`, so a write whose version is stale matches nothing.
#[derive(Clone)]
pub struct MongoPollStore {
    polls: Coll<Poll>,
    new_polls: Coll<NewPoll>,
    op_timeout: Duration,
}

impl MongoPollStore {
    pub fn new(db: &Database, op_timeout: Duration) -> Self {
        Self {
            polls: Coll::from_db(db),
            new_polls: Coll::from_db(db),
            op_timeout,
        }
    }
}

#[rocket::async_trait]
impl PollStore for MongoPollStore {
    async fn load(&self, poll_id: Id) -> Result<Option<Poll>> {
        with_timeout(self.op_timeout, self.polls.find_one(poll_id.as_doc(), None)).await
    }

    async fn insert(&self, poll: NewPoll) -> Result<Poll> {
        let id = with_timeout(self.op_timeout, self.new_polls.insert_one(&poll, None))
            .await?
            .inserted_id
            .as_object_id()
            .unwrap(); // Valid because `inserted_id` came from DB
        Ok(Poll {
            id: id.into(),
            poll,
        })
    }

    async fn compare_and_save(&self, poll: &Poll, expected_version: u32) -> Result<Poll> {
        let mut saved = poll.clone();
        saved.poll.version = expected_version + 1;

        let filter = doc! { "_id": *poll.id, "version": expected_version };
        let result = with_timeout(
            self.op_timeout,
            self.polls.replace_one(filter, &saved, None),
        )
        .await?;
        if result.matched_count == 1 {
            return Ok(saved);
        }

        // Nothing matched: either the poll is gone or its version moved on.
        match self.load(poll.id).await? {
            Some(current) => Err(Error::conflict(format!(
                "Poll with ID '{}' is at version {}, expected {}",
                poll.id, current.poll.version, expected_version
            ))),
            None => Err(Error::not_found(format!("Poll with ID '{}'", poll.id))),
        }
    }

    async fn remove(&self, poll_id: Id, expected_version: u32) -> Result<()> {
        let filter = doc! { "_id": *poll_id, "version": expected_version };
        let result = with_timeout(self.op_timeout, self.polls.delete_one(filter, None)).await?;
        if result.deleted_count == 1 {
            return Ok(());
        }

        match self.load(poll_id).await? {
            Some(current) => Err(Error::conflict(format!(
                "Poll with ID '{}' is at version {}, expected {}",
                poll_id, current.poll.version, expected_version
            ))),
            None => Err(Error::not_found(format!("Poll with ID '{}'", poll_id))),
        }
    }

    async fn list(&self) -> Result<Vec<Poll>> {
        let polls = self.polls.clone();
        with_timeout(self.op_timeout, async move {
            polls.find(None, None).await?.try_collect().await
        })
        .await
    }
}

/// MongoDB-backed user storage. Email uniqueness is enforced by a unique
/// index, created at launch.
#[derive(Clone)]
pub struct MongoUserStore {
    users: Coll<User>,
    new_users: Coll<NewUser>,
    op_timeout: Duration,
}

impl MongoUserStore {
    pub fn new(db: &Database, op_timeout: Duration) -> Self {
        Self {
            users: Coll::from_db(db),
            new_users: Coll::from_db(db),
            op_timeout,
        }
    }
}

#[rocket::async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let inserted =
            match with_timeout(self.op_timeout, self.new_users.insert_one(&user, None)).await {
                Ok(inserted) => inserted,
                Err(Error::Db(err)) if is_duplicate_key(&err) => {
                    return Err(Error::email_taken(format!(
                        "'{}' is already registered",
                        user.email
                    )));
                }
                Err(err) => return Err(err),
            };
        let id = inserted.inserted_id.as_object_id().unwrap(); // Valid because `inserted_id` came from DB
        Ok(User {
            id: id.into(),
            user,
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        with_timeout(
            self.op_timeout,
            self.users.find_one(doc! { "email": email }, None),
        )
        .await
    }

    async fn find_by_id(&self, user_id: Id) -> Result<Option<User>> {
        with_timeout(self.op_timeout, self.users.find_one(user_id.as_doc(), None)).await
    }
}

/// Run a database operation with an upper bound on how long we'll wait.
async fn with_timeout<T>(
    op_timeout: Duration,
    operation: impl Future<Output = mongodb::error::Result<T>> + Send,
) -> Result<T> {
    timeout(op_timeout, operation)
        .await
        .map_err(|_| {
            Error::timeout(format!(
                "database did not respond within {}ms",
                op_timeout.as_millis()
            ))
        })?
        .map_err(Error::from)
}

// The mongodb crate doesn't provide error code constants.
const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &DbError) -> bool {
    if let ErrorKind::Write(WriteFailure::WriteError(ref e)) = *err.kind {
        e.code == DUPLICATE_KEY
    } else {
        false
    }
}
