//! Ticket history capability.
//!
//! Recording and reading per-ticket change history is not supported yet.
//! The operations are declared here so callers handle the gap explicitly:
//! [`UnsupportedTicketHistory`] fails every call with
//! [`CoreError::NotImplemented`].

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// The tracked fields of a ticket at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSnapshot {
    pub ticket_id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub ticket_type_id: DbId,
    pub ticket_priority_id: DbId,
    pub ticket_status_id: DbId,
    pub developer_user_id: Option<DbId>,
}

/// One recorded change to a ticket property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketHistoryEntry {
    pub ticket_id: DbId,
    pub user_id: DbId,
    pub property: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub description: String,
    pub created_at: Timestamp,
}

#[async_trait]
pub trait TicketHistory: Send + Sync {
    /// Record what changed between `old` and `new`, attributed to `user_id`.
    async fn add_history(
        &self,
        old: &TicketSnapshot,
        new: &TicketSnapshot,
        user_id: DbId,
    ) -> Result<(), CoreError>;

    /// History of every ticket in the company, newest first.
    async fn company_histories(&self, company_id: DbId)
        -> Result<Vec<TicketHistoryEntry>, CoreError>;

    /// History of the tickets of one project in the company, newest first.
    async fn project_histories(
        &self,
        company_id: DbId,
        project_id: DbId,
    ) -> Result<Vec<TicketHistoryEntry>, CoreError>;
}

/// The only [`TicketHistory`] available today.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedTicketHistory;

const FEATURE: &str = "ticket history";

#[async_trait]
impl TicketHistory for UnsupportedTicketHistory {
    async fn add_history(
        &self,
        _old: &TicketSnapshot,
        _new: &TicketSnapshot,
        _user_id: DbId,
    ) -> Result<(), CoreError> {
        Err(CoreError::NotImplemented(FEATURE))
    }

    async fn company_histories(
        &self,
        _company_id: DbId,
    ) -> Result<Vec<TicketHistoryEntry>, CoreError> {
        Err(CoreError::NotImplemented(FEATURE))
    }

    async fn project_histories(
        &self,
        _company_id: DbId,
        _project_id: DbId,
    ) -> Result<Vec<TicketHistoryEntry>, CoreError> {
        Err(CoreError::NotImplemented(FEATURE))
    }
}
