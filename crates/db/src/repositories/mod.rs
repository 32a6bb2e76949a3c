//! Repositories over the hosted row store.

mod announcement;
mod attachment;
mod audit_log;
mod complaint;
mod conversation;
mod feedback;
mod notification;
mod poll;
mod profile;
mod survey;
mod template;

pub use announcement::AnnouncementRepository;
pub use attachment::AttachmentRepository;
pub use audit_log::AuditLogRepository;
pub use complaint::ComplaintRepository;
pub use conversation::{InternalNoteRepository, MessageRepository, ReplyRepository};
pub use feedback::FeedbackRepository;
pub use notification::NotificationRepository;
pub use poll::PollRepository;
pub use profile::{ProfileRepository, RoleRepository};
pub use survey::SurveyRepository;
pub use template::TemplateRepository;
