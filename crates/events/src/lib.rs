//! Notification email delivery for the bug tracker.
//!
//! - [`delivery`]: [`EmailSender`](bugtracker_core::email::EmailSender)
//!   implementations, SMTP via `lettre` or an unconfigured stand-in.
//! - [`NotificationDispatcher`]: turns stored notifications into emails for
//!   one recipient, every holder of a role, or a project's members.

pub mod delivery;
pub mod dispatch;

pub use delivery::email::{EmailConfig, EmailError, SmtpEmailSender, UnconfiguredEmailSender};
pub use dispatch::NotificationDispatcher;
