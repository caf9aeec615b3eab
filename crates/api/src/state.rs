use std::sync::Arc;

use bugtracker_core::history::TicketHistory;
use bugtracker_events::NotificationDispatcher;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: bugtracker_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Notification email dispatch (SMTP or the unconfigured stand-in).
    pub dispatcher: NotificationDispatcher,
    /// Ticket change history. No backing store exists yet, so every call
    /// answers `NotImplemented`.
    pub history: Arc<dyn TicketHistory>,
}
