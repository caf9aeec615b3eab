//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts and updates
//! - Read-side aggregates assembled by the repositories

pub mod company;
pub mod lookup;
pub mod notification;
pub mod project;
pub mod ticket;
pub mod user;
