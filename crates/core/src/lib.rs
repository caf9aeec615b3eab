//! Domain logic for the bug tracker.
//!
//! Everything here is pure: no database, no HTTP. The persistence and API
//! crates call into these modules to enforce tenant scoping, role checks and
//! project membership rules.

pub mod email;
pub mod error;
pub mod history;
pub mod membership;
pub mod roles;
pub mod tenant;
pub mod types;
pub mod upload;
