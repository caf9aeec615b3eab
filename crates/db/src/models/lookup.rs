//! Read-only catalog entries (priorities, statuses, types).

use bugtracker_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from any of the lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct LookupEntry {
    pub id: DbId,
    pub name: String,
}

/// The lookup tables. Table names come only from this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTable {
    ProjectPriorities,
    TicketPriorities,
    TicketStatuses,
    TicketTypes,
}

impl LookupTable {
    pub fn table_name(self) -> &'static str {
        match self {
            LookupTable::ProjectPriorities => "project_priorities",
            LookupTable::TicketPriorities => "ticket_priorities",
            LookupTable::TicketStatuses => "ticket_statuses",
            LookupTable::TicketTypes => "ticket_types",
        }
    }

    /// Resolve the URL slug used by the lookup routes (`ticket-statuses`, ...).
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "project-priorities" => Some(LookupTable::ProjectPriorities),
            "ticket-priorities" => Some(LookupTable::TicketPriorities),
            "ticket-statuses" => Some(LookupTable::TicketStatuses),
            "ticket-types" => Some(LookupTable::TicketTypes),
            _ => None,
        }
    }
}
