//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Tenant-owned data is always
//! filtered by the caller's company id.

pub mod company_info_repo;
pub mod company_repo;
pub mod lookup_repo;
pub mod notification_repo;
pub mod project_repo;
pub mod role_repo;
pub mod ticket_repo;
pub mod user_repo;

pub use company_info_repo::CompanyInfoRepo;
pub use company_repo::CompanyRepo;
pub use lookup_repo::LookupRepo;
pub use notification_repo::NotificationRepo;
pub use project_repo::ProjectRepo;
pub use role_repo::RoleRepo;
pub use ticket_repo::TicketRepo;
pub use user_repo::UserRepo;
