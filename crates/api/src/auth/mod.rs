//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token generation and validation, and the claims
//!   reader that yields the company id.

pub mod jwt;
