//! Poll service.

use broto_common::{AppError, AppResult};
use broto_db::entities::poll::{NewPoll, PollChanges};
use broto_db::entities::poll_option::NewPollOption;
use broto_db::entities::poll_vote::NewPollVote;
use broto_db::entities::{Poll, PollOption, PollVote};
use broto_db::repositories::PollRepository;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::access::Viewer;

/// One option with its vote count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionTally {
    pub option: PollOption,
    pub count: usize,
    /// Share of all votes, 0 to 100. Zero when nobody voted.
    pub percentage: f64,
}

/// A poll as the viewer sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollView {
    pub poll: Poll,
    pub options: Vec<OptionTally>,
    pub total_votes: usize,
    pub has_voted: bool,
    pub is_expired: bool,
    pub show_results: bool,
}

impl PollView {
    /// Open for voting: active and not expired.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.poll.is_active && !self.is_expired
    }
}

/// Polls split into those open for voting and those closed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollBoard {
    pub active: Vec<PollView>,
    pub closed: Vec<PollView>,
}

/// Input for creating a poll.
#[derive(Debug, Clone, Default)]
pub struct CreatePollInput {
    pub title: String,
    pub description: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub show_results: bool,
    pub options: Vec<String>,
}

/// Tally one poll.
#[must_use]
pub fn tally_poll(
    poll: Poll,
    options: &[PollOption],
    votes: &[PollVote],
    viewer_id: Uuid,
    now: DateTime<Utc>,
) -> PollView {
    let votes: Vec<&PollVote> = votes.iter().filter(|v| v.poll_id == poll.id).collect();
    let total_votes = votes.len();

    let options = options
        .iter()
        .filter(|o| o.poll_id == poll.id)
        .map(|option| {
            let count = votes.iter().filter(|v| v.option_id == option.id).count();
            #[allow(clippy::cast_precision_loss)]
            let percentage = if total_votes > 0 {
                count as f64 / total_votes as f64 * 100.0
            } else {
                0.0
            };
            OptionTally {
                option: option.clone(),
                count,
                percentage,
            }
        })
        .collect();

    let has_voted = votes.iter().any(|v| v.user_id == viewer_id);
    let is_expired = poll.is_expired_at(now);
    let show_results = poll.show_results || has_voted || is_expired;

    PollView {
        poll,
        options,
        total_votes,
        has_voted,
        is_expired,
        show_results,
    }
}

/// Tally every poll and split the board.
#[must_use]
pub fn build_poll_board(
    polls: Vec<Poll>,
    options: &[PollOption],
    votes: &[PollVote],
    viewer_id: Uuid,
    now: DateTime<Utc>,
) -> PollBoard {
    let (active, closed) = polls
        .into_iter()
        .map(|poll| tally_poll(poll, options, votes, viewer_id, now))
        .partition(PollView::is_open);
    PollBoard { active, closed }
}

/// Poll service for business logic.
#[derive(Clone)]
pub struct PollService {
    poll_repo: PollRepository,
}

impl PollService {
    /// Create a new poll service.
    #[must_use]
    pub const fn new(poll_repo: PollRepository) -> Self {
        Self { poll_repo }
    }

    async fn load(&self) -> AppResult<(Vec<Poll>, Vec<PollOption>, Vec<PollVote>)> {
        let polls = self.poll_repo.find_all().await?;
        let ids: Vec<Uuid> = polls.iter().map(|p| p.id).collect();
        let options = self.poll_repo.find_options(&ids).await?;
        let votes = self.poll_repo.find_votes(&ids).await?;
        Ok((polls, options, votes))
    }

    /// The polls page: open and closed polls with tallies.
    pub async fn board(&self, viewer: &Viewer) -> AppResult<PollBoard> {
        let (polls, options, votes) = self.load().await?;
        Ok(build_poll_board(polls, &options, &votes, viewer.id, Utc::now()))
    }

    /// Cast the viewer's vote.
    pub async fn vote(
        &self,
        viewer: &Viewer,
        poll_id: Uuid,
        option_id: Option<Uuid>,
    ) -> AppResult<PollVote> {
        let option_id =
            option_id.ok_or_else(|| AppError::Validation("Please select an option".to_string()))?;

        let poll = self
            .poll_repo
            .find_by_id(poll_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))?;
        if !poll.is_active || poll.is_expired_at(Utc::now()) {
            return Err(AppError::BadRequest("This poll is closed".to_string()));
        }

        let options = self.poll_repo.find_options(&[poll_id]).await?;
        if !options.iter().any(|o| o.id == option_id) {
            return Err(AppError::BadRequest("Invalid option".to_string()));
        }

        if self.poll_repo.find_vote(poll_id, viewer.id).await?.is_some() {
            return Err(AppError::Conflict(
                "You have already voted on this poll".to_string(),
            ));
        }

        self.poll_repo
            .create_vote(&NewPollVote {
                poll_id,
                option_id,
                user_id: viewer.id,
            })
            .await
    }

    // === Admin ===

    /// Every poll with results, for the management page.
    pub async fn admin_list(&self, admin: &Viewer) -> AppResult<Vec<PollView>> {
        admin.ensure_admin()?;
        let (polls, options, votes) = self.load().await?;
        let now = Utc::now();
        Ok(polls
            .into_iter()
            .map(|poll| {
                let mut view = tally_poll(poll, &options, &votes, admin.id, now);
                view.show_results = true;
                view
            })
            .collect())
    }

    /// Create a poll and its options. Blank options are dropped.
    pub async fn create(&self, admin: &Viewer, input: CreatePollInput) -> AppResult<Poll> {
        admin.ensure_admin()?;
        let title = input.title.trim();
        let options: Vec<&str> = input
            .options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .collect();
        if title.is_empty() || options.len() < 2 {
            return Err(AppError::Validation(
                "Please provide a title and at least 2 options".to_string(),
            ));
        }

        let poll = self
            .poll_repo
            .create(&NewPoll {
                title: title.to_string(),
                description: trimmed_opt(input.description),
                expiry_date: input.expiry_date,
                is_active: true,
                show_results: input.show_results,
                created_by: admin.id,
            })
            .await?;

        let rows: Vec<NewPollOption> = options
            .into_iter()
            .map(|text| NewPollOption {
                poll_id: poll.id,
                option_text: text.to_string(),
            })
            .collect();
        self.poll_repo.create_options(&rows).await?;

        info!(poll_id = %poll.id, options = rows.len(), "Poll created");
        Ok(poll)
    }

    pub async fn set_active(&self, admin: &Viewer, id: Uuid, is_active: bool) -> AppResult<Poll> {
        admin.ensure_admin()?;
        self.poll_repo
            .update(
                id,
                &PollChanges {
                    is_active: Some(is_active),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn set_show_results(
        &self,
        admin: &Viewer,
        id: Uuid,
        show_results: bool,
    ) -> AppResult<Poll> {
        admin.ensure_admin()?;
        self.poll_repo
            .update(
                id,
                &PollChanges {
                    show_results: Some(show_results),
                    ..Default::default()
                },
            )
            .await
    }

    /// Delete a poll with its options and votes.
    pub async fn delete(&self, admin: &Viewer, id: Uuid) -> AppResult<()> {
        admin.ensure_admin()?;
        self.poll_repo.delete(id).await
    }
}

pub(crate) fn trimmed_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
