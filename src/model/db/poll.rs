use std::collections::HashSet;
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Unique (per-poll) ID of a poll option.
pub type OptionId = u32;

/// One selectable choice within a poll, carrying its own tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Option unique ID within this poll.
    pub id: OptionId,
    /// Option text.
    pub text: String,
    /// Number of votes cast for this option.
    pub votes: u32,
}

/// Core poll data, as stored in the database.
///
/// The voter set and the option tallies move together: a committed vote adds
/// one user ID and increments exactly one tally, so the total number of votes
/// always equals the number of voters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCore {
    /// Poll title.
    pub title: String,
    /// Poll description.
    pub description: String,
    /// The user who created this poll; only they may edit or delete it.
    pub creator_id: Id,
    /// Creation time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// End of the voting window.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
    /// The options open for voting, in creation order.
    pub options: Vec<PollOption>,
    /// IDs of users who have voted.
    pub voters: HashSet<Id>,
    /// Write version, incremented by every successful save.
    pub version: u32,
}

impl PollCore {
    /// Look up an option by its ID.
    pub fn option(&self, option_id: OptionId) -> Option<&PollOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// Look up an option by its ID, mutably.
    pub fn option_mut(&mut self, option_id: OptionId) -> Option<&mut PollOption> {
        self.options.iter_mut().find(|option| option.id == option_id)
    }

    /// Total votes across all options.
    pub fn total_votes(&self) -> u32 {
        self.options.iter().map(|option| option.votes).sum()
    }

    /// Has the voting window closed?
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Has anyone voted yet? Once true, the poll structure is frozen.
    pub fn has_votes(&self) -> bool {
        !self.voters.is_empty()
    }
}

/// A poll without an ID.
pub type NewPoll = PollCore;

/// A poll from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub poll: PollCore,
}

impl Deref for Poll {
    type Target = PollCore;

    fn deref(&self) -> &Self::Target {
        &self.poll
    }
}

impl DerefMut for Poll {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.poll
    }
}
