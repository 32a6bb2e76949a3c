//! Progress timeline shown on a complaint's detail page.

use broto_db::entities::{Complaint, ComplaintStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Progress of one timeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Completed,
    Active,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
    pub label: &'static str,
    pub state: StepState,
    pub date: Option<DateTime<Utc>>,
}

/// Build the five-step timeline for a complaint.
///
/// Only `created_at` and `updated_at` are stored, so every later step that
/// shows a date shows the last update time.
#[must_use]
pub fn build_timeline(
    complaint: &Complaint,
    admin_viewed: bool,
    admin_replied: bool,
) -> Vec<TimelineStep> {
    let status = complaint.status;
    let done = |flag: bool| if flag { StepState::Completed } else { StepState::Pending };

    vec![
        TimelineStep {
            label: "Complaint Submitted",
            state: StepState::Completed,
            date: Some(complaint.created_at),
        },
        TimelineStep {
            label: "Admin Viewed",
            state: done(admin_viewed),
            date: admin_viewed.then_some(complaint.updated_at),
        },
        TimelineStep {
            label: "Admin Replied",
            state: done(admin_replied),
            date: None,
        },
        TimelineStep {
            label: "In Progress",
            state: done(status != ComplaintStatus::Pending),
            date: (status != ComplaintStatus::Pending).then_some(complaint.updated_at),
        },
        TimelineStep {
            label: "Resolved",
            state: match status {
                ComplaintStatus::Resolved => StepState::Completed,
                ComplaintStatus::InProgress => StepState::Active,
                ComplaintStatus::Pending => StepState::Pending,
            },
            date: (status == ComplaintStatus::Resolved).then_some(complaint.updated_at),
        },
    ]
}
