//! Business logic services.

#![allow(missing_docs)]

pub mod access;
pub mod account;
pub mod analytics;
pub mod announcement;
pub mod complaint;
pub mod conversation;
pub mod feedback;
pub mod live;
pub mod notification;
pub mod poll;
pub mod survey;
pub mod timeline;

use std::sync::Arc;

use broto_common::StorageBackend;
use broto_db::repositories::{
    AnnouncementRepository, AttachmentRepository, AuditLogRepository, ComplaintRepository,
    FeedbackRepository, InternalNoteRepository, MessageRepository, NotificationRepository,
    PollRepository, ProfileRepository, ReplyRepository, RoleRepository, SurveyRepository,
    TemplateRepository,
};
use broto_db::{AuthClient, BackendClient, BucketStorage, RealtimeClient};

pub use access::{AccessService, Viewer};
pub use account::{AccountService, ProfileOverview, UpdateProfileInput};
pub use analytics::{Analytics, AnalyticsService, DashboardStats, MonthCount, ProfileStats};
pub use announcement::{AnnouncementService, CreateAnnouncementInput};
pub use complaint::{
    AttachmentLink, ComplaintDetail, ComplaintListing, ComplaintService, ReplyView,
    StudentSummary,
};
pub use conversation::ConversationService;
pub use feedback::{FeedbackListing, FeedbackService};
pub use live::LiveFeed;
pub use notification::{NavigationTarget, NotificationService};
pub use poll::{CreatePollInput, OptionTally, PollBoard, PollService, PollView};
pub use survey::{
    AnswerTally, CreateSurveyInput, QuestionInput, QuestionResults, SurveyBoard, SurveyResults,
    SurveyService, SurveyView,
};
pub use timeline::{StepState, TimelineStep, build_timeline};

/// Shared attachment storage.
pub type StorageService = Arc<dyn StorageBackend>;

/// Every service, wired to one backend client.
#[derive(Clone)]
pub struct Services {
    pub access: AccessService,
    pub account: AccountService,
    pub analytics: AnalyticsService,
    pub announcements: AnnouncementService,
    pub complaints: ComplaintService,
    pub conversation: ConversationService,
    pub feedback: FeedbackService,
    pub notifications: NotificationService,
    pub polls: PollService,
    pub surveys: SurveyService,
    pub realtime: RealtimeClient,
}

impl Services {
    /// Build the services over `client`, storing attachments in the
    /// configured bucket.
    #[must_use]
    pub fn new(client: &BackendClient) -> Self {
        let storage: StorageService = Arc::new(BucketStorage::new(client.clone()));
        Self::with_storage(client, storage)
    }

    /// Build the services with a custom attachment store.
    #[must_use]
    pub fn with_storage(client: &BackendClient, storage: StorageService) -> Self {
        let auth = AuthClient::new(client.clone());
        let access = AccessService::new(auth.clone(), RoleRepository::new(client.clone()));
        let complaint_repo = ComplaintRepository::new(client.clone());
        let profile_repo = ProfileRepository::new(client.clone());
        let audit_repo = AuditLogRepository::new(client.clone());
        let reply_repo = ReplyRepository::new(client.clone());
        let message_repo = MessageRepository::new(client.clone());

        Self {
            account: AccountService::new(
                auth,
                access.clone(),
                profile_repo.clone(),
                complaint_repo.clone(),
                audit_repo.clone(),
            ),
            access,
            analytics: AnalyticsService::new(complaint_repo.clone()),
            announcements: AnnouncementService::new(AnnouncementRepository::new(client.clone())),
            complaints: ComplaintService::new(
                complaint_repo.clone(),
                AttachmentRepository::new(client.clone()),
                reply_repo.clone(),
                message_repo.clone(),
                profile_repo.clone(),
                audit_repo,
                storage,
            ),
            conversation: ConversationService::new(
                complaint_repo,
                message_repo,
                reply_repo,
                InternalNoteRepository::new(client.clone()),
                TemplateRepository::new(client.clone()),
            ),
            feedback: FeedbackService::new(FeedbackRepository::new(client.clone()), profile_repo),
            notifications: NotificationService::new(NotificationRepository::new(client.clone())),
            polls: PollService::new(PollRepository::new(client.clone())),
            surveys: SurveyService::new(SurveyRepository::new(client.clone())),
            realtime: RealtimeClient::new(client.clone()),
        }
    }
}
