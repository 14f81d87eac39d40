use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::api::ApiId;
use crate::model::db::poll::{NewPoll, OptionId, Poll, PollOption};
use crate::model::mongodb::Id;

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MIN_OPTIONS: usize = 2;

/// How long a poll stays open when the creator doesn't say.
const DEFAULT_LIFETIME_DAYS: i64 = 7;

/// A poll specification, as submitted by a creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSpec {
    /// Poll title.
    pub title: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: String,
    /// Option texts, in display order.
    pub options: Vec<String>,
    /// Closing time; defaults to a week from creation.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PollSpec {
    /// Convert this spec into a storable poll owned by the given creator.
    /// This enforces all the content constraints and assigns option IDs.
    pub fn into_poll(self, creator_id: Id) -> Result<NewPoll, Error> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("title must not be empty"));
        }
        if self.title.chars().count() > MAX_TITLE_LENGTH {
            return Err(Error::validation(format!(
                "title must be at most {MAX_TITLE_LENGTH} characters"
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(Error::validation(format!(
                "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }
        if self.options.len() < MIN_OPTIONS {
            return Err(Error::validation(format!(
                "a poll needs at least {MIN_OPTIONS} options"
            )));
        }
        if self.options.iter().any(|text| text.trim().is_empty()) {
            return Err(Error::validation("option text must not be empty"));
        }
        let distinct = self.options.iter().collect::<HashSet<_>>();
        if distinct.len() != self.options.len() {
            return Err(Error::validation("option texts must be distinct"));
        }

        let created_at = Utc::now();
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| created_at + Duration::days(DEFAULT_LIFETIME_DAYS));
        if expires_at <= created_at {
            return Err(Error::validation("expiry must be in the future"));
        }

        Ok(NewPoll {
            title: self.title,
            description: self.description,
            creator_id,
            created_at,
            expires_at,
            options: self
                .options
                .into_iter()
                .enumerate()
                .map(|(index, text)| PollOption {
                    id: index as OptionId + 1,
                    text,
                    votes: 0,
                })
                .collect(),
            voters: HashSet::new(),
            version: 0,
        })
    }
}

/// An API-friendly description of a single poll option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDescription {
    /// Option ID, unique within the poll.
    pub id: OptionId,
    /// Display text.
    pub text: String,
    /// Current tally.
    pub votes: u32,
}

impl From<PollOption> for OptionDescription {
    fn from(option: PollOption) -> Self {
        Self {
            id: option.id,
            text: option.text,
            votes: option.votes,
        }
    }
}

/// An API-friendly description of a poll, tallies included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollDescription {
    /// Poll unique ID.
    pub id: ApiId,
    /// Poll title.
    pub title: String,
    /// Longer description; possibly empty.
    pub description: String,
    /// ID of the creating user.
    pub creator_id: ApiId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Closing time.
    pub expires_at: DateTime<Utc>,
    /// Options with their tallies.
    pub options: Vec<OptionDescription>,
    /// Users who have voted.
    pub voters: Vec<ApiId>,
    /// Sum of all option tallies.
    pub total_votes: u32,
}

impl From<Poll> for PollDescription {
    fn from(poll: Poll) -> Self {
        let total_votes = poll.total_votes();
        Self {
            id: poll.id.into(),
            title: poll.poll.title,
            description: poll.poll.description,
            creator_id: poll.poll.creator_id.into(),
            created_at: poll.poll.created_at,
            expires_at: poll.poll.expires_at,
            options: poll.poll.options.into_iter().map(Into::into).collect(),
            voters: poll.poll.voters.into_iter().map(Into::into).collect(),
            total_votes,
        }
    }
}

/// A single vote, cast against one option of a poll.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteRequest {
    pub option_id: OptionId,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_ids_are_assigned_in_order() {
        let poll = PollSpec::example().into_poll(Id::new()).unwrap();

        assert_eq!(
            poll.options
                .iter()
                .map(|option| option.id)
                .collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(poll.options.iter().all(|option| option.votes == 0));
        assert!(poll.voters.is_empty());
        assert_eq!(poll.version, 0);
    }

    #[test]
    fn expiry_defaults_to_a_week() {
        let poll = PollSpec::example2().into_poll(Id::new()).unwrap();
        assert_eq!(
            poll.expires_at,
            poll.created_at + Duration::days(DEFAULT_LIFETIME_DAYS)
        );
    }

    #[test]
    fn bad_specs_rejected() {
        let empty_title = PollSpec {
            title: "  ".into(),
            ..PollSpec::example()
        };
        assert!(empty_title.into_poll(Id::new()).is_err());

        let long_title = PollSpec {
            title: "x".repeat(MAX_TITLE_LENGTH + 1),
            ..PollSpec::example()
        };
        assert!(long_title.into_poll(Id::new()).is_err());

        let long_description = PollSpec {
            description: "x".repeat(MAX_DESCRIPTION_LENGTH + 1),
            ..PollSpec::example()
        };
        assert!(long_description.into_poll(Id::new()).is_err());

        let one_option = PollSpec {
            options: vec!["Rust".into()],
            ..PollSpec::example()
        };
        assert!(one_option.into_poll(Id::new()).is_err());

        let empty_option = PollSpec {
            options: vec!["Rust".into(), " ".into()],
            ..PollSpec::example()
        };
        assert!(empty_option.into_poll(Id::new()).is_err());

        let duplicate_options = PollSpec {
            options: vec!["Rust".into(), "Rust".into()],
            ..PollSpec::example()
        };
        assert!(duplicate_options.into_poll(Id::new()).is_err());

        let past_expiry = PollSpec {
            expires_at: Some(Utc::now() - Duration::days(1)),
            ..PollSpec::example()
        };
        assert!(past_expiry.into_poll(Id::new()).is_err());
    }
}
