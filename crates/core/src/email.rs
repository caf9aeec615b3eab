//! Outbound email capability.
//!
//! The core constructs notification messages; delivery is delegated to an
//! [`EmailSender`] supplied by the events crate. A deployment without SMTP
//! configured uses a sender that fails with [`CoreError::NotImplemented`]
//! instead of silently dropping mail.

use async_trait::async_trait;

use crate::error::CoreError;

/// A single outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), CoreError>;
}
