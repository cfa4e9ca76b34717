//! Data models for user accounts and roles.

pub mod user;

pub use user::*;
