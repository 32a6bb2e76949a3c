//! Form validation run before any remote call.
//!
//! Text fields are trimmed first, then checked. All failures of one form are
//! reported together, joined with `", "`.

use std::sync::LazyLock;

use broto_common::{AppError, AppResult, FileUpload};
use broto_db::entities::{ComplaintCategory, ComplaintPriority};
use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Largest accepted attachment, in bytes.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Most attachments per submission.
pub const MAX_FILES: usize = 5;

/// Attachment MIME types accepted for upload.
pub const ALLOWED_FILE_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/png",
    "image/jpg",
    "image/webp",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[allow(clippy::expect_used)]
static HAS_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]").expect("letter pattern compiles"));

#[allow(clippy::expect_used)]
static HAS_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]").expect("digit pattern compiles"));

/// A form that trims its text fields before validation.
pub trait FormInput: Validate + Sized {
    /// Return the form with surrounding whitespace removed from text fields.
    #[must_use]
    fn trimmed(self) -> Self;

    /// Trim, then validate.
    fn validated(self) -> AppResult<Self> {
        let form = self.trimmed();
        form.validate()?;
        Ok(form)
    }
}

fn message(text: &'static str) -> ValidationError {
    ValidationError::new("invalid").with_message(text.into())
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    match char_len(title) {
        n if n < 5 => Err(message("Title must be at least 5 characters")),
        n if n > 200 => Err(message("Title must be less than 200 characters")),
        _ => Ok(()),
    }
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    match char_len(description) {
        n if n < 20 => Err(message("Description must be at least 20 characters")),
        n if n > 2000 => Err(message("Description must be less than 2000 characters")),
        _ => Ok(()),
    }
}

fn validate_message_text(text: &str) -> Result<(), ValidationError> {
    match char_len(text) {
        0 => Err(message("Message cannot be empty")),
        n if n > 2000 => Err(message("Message must be less than 2000 characters")),
        _ => Ok(()),
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    match char_len(name) {
        n if n < 2 => Err(message("Name must be at least 2 characters")),
        n if n > 100 => Err(message("Name must be less than 100 characters")),
        _ => Ok(()),
    }
}

fn validate_email_length(email: &str) -> Result<(), ValidationError> {
    if char_len(email) > 255 {
        return Err(message("Email must be less than 255 characters"));
    }
    Ok(())
}

fn validate_new_password(password: &str) -> Result<(), ValidationError> {
    let len = char_len(password);
    if len < 8 {
        return Err(message("Password must be at least 8 characters"));
    }
    if len > 100 {
        return Err(message("Password must be less than 100 characters"));
    }
    if !HAS_LETTER.is_match(password) {
        return Err(message("Password must contain at least one letter"));
    }
    if !HAS_DIGIT.is_match(password) {
        return Err(message("Password must contain at least one number"));
    }
    Ok(())
}

fn validate_required_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(message("Password is required"));
    }
    Ok(())
}

fn validate_feedback(feedback: &str) -> Result<(), ValidationError> {
    if char_len(feedback) > 500 {
        return Err(message("Feedback must be less than 500 characters"));
    }
    Ok(())
}

/// New or edited complaint.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ComplaintForm {
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    #[validate(custom(function = "validate_description"))]
    pub description: String,
    pub category: ComplaintCategory,
    pub priority: ComplaintPriority,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl FormInput for ComplaintForm {
    fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self
    }
}

/// Conversation message.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MessageForm {
    #[validate(custom(function = "validate_message_text"))]
    pub message: String,
}

impl FormInput for MessageForm {
    fn trimmed(mut self) -> Self {
        self.message = self.message.trim().to_string();
        self
    }
}

/// Account registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpForm {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(
        email(message = "Invalid email address"),
        custom(function = "validate_email_length")
    )]
    pub email: String,
    #[validate(custom(function = "validate_new_password"))]
    pub password: String,
}

impl FormInput for SignUpForm {
    fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }
}

/// Password sign-in.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInForm {
    #[validate(
        email(message = "Invalid email address"),
        custom(function = "validate_email_length")
    )]
    pub email: String,
    #[validate(custom(function = "validate_required_password"))]
    pub password: String,
}

impl FormInput for SignInForm {
    fn trimmed(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self
    }
}

/// Resolution rating.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RatingForm {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(custom(function = "validate_feedback"))]
    pub feedback: Option<String>,
}

impl FormInput for RatingForm {
    fn trimmed(mut self) -> Self {
        self.feedback = self
            .feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        self
    }
}

/// Check attachment count, size and type. Stops at the first offending file.
pub fn validate_files(files: &[FileUpload]) -> AppResult<()> {
    if files.len() > MAX_FILES {
        return Err(AppError::Validation(format!(
            "Maximum {MAX_FILES} files allowed"
        )));
    }

    for file in files {
        if file.size() > MAX_FILE_SIZE {
            return Err(AppError::Validation(format!(
                "File \"{}\" exceeds 10MB limit",
                file.name
            )));
        }

        if !ALLOWED_FILE_TYPES.contains(&file.content_type.as_str()) {
            return Err(AppError::Validation(format!(
                "File type \"{}\" not allowed for \"{}\"",
                file.content_type, file.name
            )));
        }
    }

    Ok(())
}
