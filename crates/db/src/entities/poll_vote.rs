//! Poll vote entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "poll_votes";

/// A user's vote on a poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_id: Uuid,
    pub user_id: Uuid,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewPollVote {
    pub poll_id: Uuid,
    pub option_id: Uuid,
    pub user_id: Uuid,
}
