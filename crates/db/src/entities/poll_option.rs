//! Poll option entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table name.
pub const TABLE: &str = "poll_options";

/// One choice of a poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_text: String,
}

/// Insert payload.
#[derive(Clone, Debug, Serialize)]
pub struct NewPollOption {
    pub poll_id: Uuid,
    pub option_text: String,
}
