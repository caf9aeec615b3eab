//! Company-wide aggregate reads for elevated roles.
//!
//! Each method issues a fixed number of queries regardless of how many
//! projects, tickets or members the company has: one per aggregate level,
//! batched with `= ANY($1)`, stitched together in memory.

use std::collections::HashMap;

use bugtracker_core::types::DbId;
use sqlx::{FromRow, PgPool};

use crate::error::RepoResult;
use crate::models::company::Company;
use crate::models::lookup::{LookupEntry, LookupTable};
use crate::models::project::{Project, ProjectOverview};
use crate::models::ticket::{TicketComment, TicketDetail, TicketWithLookups};
use crate::models::user::{User, UserWithRoles};
use crate::repositories::company_repo::CompanyRepo;
use crate::repositories::lookup_repo::LookupRepo;
use crate::repositories::project_repo::COLUMNS as PROJECT_COLUMNS;
use crate::repositories::role_repo::RoleRepo;
use crate::repositories::ticket_repo::TicketRepo;
use crate::repositories::user_repo::{UserRepo, U_COLUMNS};

/// A project membership row joined with the member.
#[derive(Debug, FromRow)]
struct MemberRow {
    project_id: DbId,
    is_manager: bool,
    #[sqlx(flatten)]
    user: User,
}

/// Provides the eager-loaded company views.
pub struct CompanyInfoRepo;

impl CompanyInfoRepo {
    /// The company itself.
    pub async fn find_by_id(
        pool: &PgPool,
        company_id: DbId,
    ) -> Result<Option<Company>, sqlx::Error> {
        CompanyRepo::find_by_id(pool, company_id).await
    }

    /// Every user of the company with their roles. Two queries.
    pub async fn all_members(pool: &PgPool, company_id: DbId) -> RepoResult<Vec<UserWithRoles>> {
        let users = UserRepo::list_by_company(pool, company_id).await?;
        let ids: Vec<DbId> = users.iter().map(|u| u.id).collect();
        let mut roles = RoleRepo::roles_for_users(pool, &ids).await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let roles = roles.remove(&user.id).unwrap_or_default();
                UserWithRoles { user, roles }
            })
            .collect())
    }

    /// Every project of the company, archived ones included, with priority,
    /// manager, members and tickets (with lookups and comments). Five queries.
    pub async fn all_projects(
        pool: &PgPool,
        company_id: DbId,
    ) -> Result<Vec<ProjectOverview>, sqlx::Error> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE company_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        let projects = sqlx::query_as::<_, Project>(&query)
            .bind(company_id)
            .fetch_all(pool)
            .await?;
        if projects.is_empty() {
            return Ok(Vec::new());
        }
        let project_ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();

        let priorities: HashMap<DbId, LookupEntry> =
            LookupRepo::list(pool, LookupTable::ProjectPriorities)
                .await?
                .into_iter()
                .map(|entry| (entry.id, entry))
                .collect();

        let query = format!(
            "SELECT pm.project_id, pm.is_manager, {U_COLUMNS}
             FROM project_members pm
             JOIN users u ON u.id = pm.user_id
             WHERE pm.project_id = ANY($1)
             ORDER BY u.last_name, u.first_name, u.id"
        );
        let member_rows = sqlx::query_as::<_, MemberRow>(&query)
            .bind(&project_ids)
            .fetch_all(pool)
            .await?;

        let mut managers: HashMap<DbId, DbId> = HashMap::new();
        let mut members: HashMap<DbId, Vec<User>> = HashMap::new();
        for row in member_rows {
            if row.is_manager {
                managers.insert(row.project_id, row.user.id);
            }
            members.entry(row.project_id).or_default().push(row.user);
        }

        let tickets = TicketRepo::list_by_projects(pool, company_id, &project_ids).await?;
        let mut tickets_by_project = Self::attach_comments(pool, tickets).await?;

        Ok(projects
            .into_iter()
            .map(|project| {
                let id = project.id;
                ProjectOverview {
                    priority: project
                        .project_priority_id
                        .and_then(|pid| priorities.get(&pid).cloned()),
                    manager_id: managers.get(&id).copied(),
                    members: members.remove(&id).unwrap_or_default(),
                    tickets: tickets_by_project.remove(&id).unwrap_or_default(),
                    project,
                }
            })
            .collect())
    }

    /// Every ticket of the company with status, priority and type names.
    /// One query.
    pub async fn all_tickets(
        pool: &PgPool,
        company_id: DbId,
    ) -> Result<Vec<TicketWithLookups>, sqlx::Error> {
        TicketRepo::list_by_company(pool, company_id).await
    }

    /// Load the comments for `tickets` in one query and group the result by
    /// project, keeping ticket order.
    async fn attach_comments(
        pool: &PgPool,
        tickets: Vec<TicketWithLookups>,
    ) -> Result<HashMap<DbId, Vec<TicketDetail>>, sqlx::Error> {
        let ticket_ids: Vec<DbId> = tickets.iter().map(|t| t.ticket.id).collect();
        let mut comments: HashMap<DbId, Vec<TicketComment>> = HashMap::new();
        if !ticket_ids.is_empty() {
            for comment in TicketRepo::comments_for_tickets(pool, &ticket_ids).await? {
                comments.entry(comment.ticket_id).or_default().push(comment);
            }
        }

        let mut by_project: HashMap<DbId, Vec<TicketDetail>> = HashMap::new();
        for ticket in tickets {
            let comments = comments.remove(&ticket.ticket.id).unwrap_or_default();
            by_project
                .entry(ticket.ticket.project_id)
                .or_default()
                .push(TicketDetail { ticket, comments });
        }
        Ok(by_project)
    }
}
