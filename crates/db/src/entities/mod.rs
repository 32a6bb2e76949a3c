//! Row types mirrored from the hosted database.
//!
//! Each module holds the row `Model`, its insert payload and, where rows are
//! edited, a `*Changes` patch type.

pub mod admin_template;
pub mod announcement;
pub mod audit_log;
pub mod complaint;
pub mod complaint_attachment;
pub mod complaint_message;
pub mod complaint_reply;
pub mod feedback;
pub mod internal_note;
pub mod notification;
pub mod poll;
pub mod poll_option;
pub mod poll_vote;
pub mod profile;
pub mod survey;
pub mod survey_answer;
pub mod survey_question;
pub mod survey_response;
pub mod user_role;

pub use admin_template::Model as AdminTemplate;
pub use announcement::Model as Announcement;
pub use audit_log::Model as AuditLog;
pub use complaint::{
    ComplaintCategory, ComplaintPriority, ComplaintStatus, Model as Complaint,
};
pub use complaint_attachment::Model as ComplaintAttachment;
pub use complaint_message::Model as ComplaintMessage;
pub use complaint_reply::Model as ComplaintReply;
pub use feedback::{FeedbackCategory, FeedbackStatus, Model as Feedback};
pub use internal_note::Model as InternalNote;
pub use notification::Model as Notification;
pub use poll::Model as Poll;
pub use poll_option::Model as PollOption;
pub use poll_vote::Model as PollVote;
pub use profile::Model as Profile;
pub use survey::Model as Survey;
pub use survey_answer::Model as SurveyAnswer;
pub use survey_question::{Model as SurveyQuestion, QuestionType};
pub use survey_response::Model as SurveyResponse;
pub use user_role::{AppRole, Model as UserRole};
