//! Poll repository.

use broto_common::{AppError, AppResult};
use uuid::Uuid;

use crate::client::BackendClient;
use crate::entities::poll::{self, NewPoll, PollChanges};
use crate::entities::poll_option::{self, NewPollOption};
use crate::entities::poll_vote::{self, NewPollVote};
use crate::entities::{Poll, PollOption, PollVote};
use crate::query::Query;

/// Repository for polls, their options and votes.
#[derive(Clone)]
pub struct PollRepository {
    client: BackendClient,
}

impl PollRepository {
    /// Create a new poll repository.
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Find a poll by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Poll>> {
        self.client
            .select_first(&Query::table(poll::TABLE).eq("id", id))
            .await
    }

    /// Every poll, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<Poll>> {
        self.client
            .select(&Query::table(poll::TABLE).order_desc("created_at"))
            .await
    }

    /// Options of the given polls.
    pub async fn find_options(&self, poll_ids: &[Uuid]) -> AppResult<Vec<PollOption>> {
        if poll_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select(&Query::table(poll_option::TABLE).in_list("poll_id", poll_ids))
            .await
    }

    /// Votes cast on the given polls.
    pub async fn find_votes(&self, poll_ids: &[Uuid]) -> AppResult<Vec<PollVote>> {
        if poll_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select(&Query::table(poll_vote::TABLE).in_list("poll_id", poll_ids))
            .await
    }

    /// A user's vote on a poll, if any.
    pub async fn find_vote(&self, poll_id: Uuid, user_id: Uuid) -> AppResult<Option<PollVote>> {
        self.client
            .select_first(
                &Query::table(poll_vote::TABLE)
                    .eq("poll_id", poll_id)
                    .eq("user_id", user_id),
            )
            .await
    }

    /// Create a poll.
    pub async fn create(&self, new: &NewPoll) -> AppResult<Poll> {
        self.client.insert(poll::TABLE, new).await
    }

    /// Create options for a poll.
    pub async fn create_options(&self, options: &[NewPollOption]) -> AppResult<Vec<PollOption>> {
        self.client.insert_many(poll_option::TABLE, options).await
    }

    /// Record a vote.
    pub async fn create_vote(&self, vote: &NewPollVote) -> AppResult<PollVote> {
        self.client.insert(poll_vote::TABLE, vote).await
    }

    /// Apply admin toggles.
    pub async fn update(&self, id: Uuid, changes: &PollChanges) -> AppResult<Poll> {
        let rows: Vec<Poll> = self
            .client
            .update(&Query::table(poll::TABLE).eq("id", id), changes)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))
    }

    /// Delete a poll. Options and votes cascade.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.client
            .delete(&Query::table(poll::TABLE).eq("id", id))
            .await
    }
}
