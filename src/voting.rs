//! Poll lifecycle and vote casting on top of [`PollStore`].
//!
//! All writes go through an optimistic read-modify-write loop: load a
//! snapshot, validate, mutate a copy, and submit it conditional on the
//! version we read. A failed condition means somebody else committed first,
//! so we reload and try again, up to a small bound.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{Error, Result};
use crate::model::api::poll::PollSpec;
use crate::model::db::poll::{OptionId, Poll};
use crate::model::mongodb::Id;
use crate::store::PollStore;

/// How many write attempts before giving up with `Error::Busy`.
///
/// Each retry implies another writer actually committed, so under N
/// concurrent voters a vote needs at most N attempts.
const MAX_WRITE_ATTEMPTS: u32 = 5;

/// All poll operations, independent of the storage backend.
#[derive(Clone)]
pub struct VotingService {
    polls: Arc<dyn PollStore>,
}

impl VotingService {
    pub fn new(polls: Arc<dyn PollStore>) -> Self {
        Self { polls }
    }

    /// Create a poll from a validated spec.
    pub async fn create_poll(&self, spec: PollSpec, creator_id: Id) -> Result<Poll> {
        let poll = spec.into_poll(creator_id)?;
        // No retry here: inserts aren't idempotent, and fresh documents
        // can't lose a version race.
        self.polls.insert(poll).await
    }

    /// Get a single poll with its current tallies.
    pub async fn get_poll(&self, poll_id: Id) -> Result<Poll> {
        self.polls
            .load(poll_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Poll with ID '{}'", poll_id)))
    }

    /// All polls, newest first.
    pub async fn list_polls(&self) -> Result<Vec<Poll>> {
        let mut polls = self.polls.list().await?;
        polls.sort_by(|a, b| b.poll.created_at.cmp(&a.poll.created_at));
        Ok(polls)
    }

    /// Cast `voter_id`'s vote for `option_id` on the given poll.
    ///
    /// The checks run in a fixed order: the poll must exist, must not have
    /// expired, the voter must not have voted before, and the option must
    /// exist. Each voter gets exactly one vote per poll.
    pub async fn cast_vote(&self, poll_id: Id, voter_id: Id, option_id: OptionId) -> Result<Poll> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut poll = match self.polls.load(poll_id).await {
                Ok(Some(poll)) => poll,
                Ok(None) => {
                    return Err(Error::not_found(format!("Poll with ID '{}'", poll_id)));
                }
                Err(err) if err.is_transient() => continue,
                Err(err) => return Err(err),
            };

            if poll.has_expired(Utc::now()) {
                return Err(Error::poll_expired(format!(
                    "Poll with ID '{}' closed at {}",
                    poll_id, poll.poll.expires_at
                )));
            }
            if poll.poll.voters.contains(&voter_id) {
                return Err(Error::already_voted(format!(
                    "you have already voted on poll '{}'",
                    poll_id
                )));
            }

            let expected_version = poll.poll.version;
            poll.poll
                .option_mut(option_id)
                .ok_or_else(|| {
                    Error::invalid_option(format!(
                        "Poll with ID '{}' has no option {}",
                        poll_id, option_id
                    ))
                })?
                .votes += 1;
            poll.poll.voters.insert(voter_id);

            match self.polls.compare_and_save(&poll, expected_version).await {
                Ok(saved) => return Ok(saved),
                Err(err) if err.is_transient() => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::busy(format!(
            "Poll with ID '{}' is too contended; please retry",
            poll_id
        )))
    }

    /// Replace a poll's content with a new spec.
    ///
    /// Only the creator may do this, and only while nobody has voted.
    pub async fn update_poll(&self, poll_id: Id, spec: PollSpec, user_id: Id) -> Result<Poll> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let poll = match self.polls.load(poll_id).await {
                Ok(Some(poll)) => poll,
                Ok(None) => {
                    return Err(Error::not_found(format!("Poll with ID '{}'", poll_id)));
                }
                Err(err) if err.is_transient() => continue,
                Err(err) => return Err(err),
            };
            self.check_editable(&poll, user_id)?;

            let expected_version = poll.poll.version;
            let mut replacement = Poll {
                id: poll.id,
                poll: spec.clone().into_poll(poll.poll.creator_id)?,
            };
            replacement.poll.created_at = poll.poll.created_at;

            match self
                .polls
                .compare_and_save(&replacement, expected_version)
                .await
            {
                Ok(saved) => return Ok(saved),
                Err(err) if err.is_transient() => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::busy(format!(
            "Poll with ID '{}' is too contended; please retry",
            poll_id
        )))
    }

    /// Delete a poll. Same rules as updating: creator only, no votes yet.
    pub async fn delete_poll(&self, poll_id: Id, user_id: Id) -> Result<()> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let poll = match self.polls.load(poll_id).await {
                Ok(Some(poll)) => poll,
                Ok(None) => {
                    return Err(Error::not_found(format!("Poll with ID '{}'", poll_id)));
                }
                Err(err) if err.is_transient() => continue,
                Err(err) => return Err(err),
            };
            self.check_editable(&poll, user_id)?;

            match self.polls.remove(poll_id, poll.poll.version).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() => continue,
                Err(err) => return Err(err),
            }
        }
        Err(Error::busy(format!(
            "Poll with ID '{}' is too contended; please retry",
            poll_id
        )))
    }

    fn check_editable(&self, poll: &Poll, user_id: Id) -> Result<()> {
        if poll.poll.creator_id != user_id {
            return Err(Error::unauthorized(format!(
                "only the creator may modify poll '{}'",
                poll.id
            )));
        }
        if poll.has_votes() {
            return Err(Error::poll_locked(format!(
                "Poll with ID '{}' already has votes",
                poll.id
            )));
        }
        Ok(())
    }
}
