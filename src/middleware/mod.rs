//! Request stages that guard the auth handlers.

pub mod verify_signup;

pub use verify_signup::{CheckDuplicateUsernameOrEmail, CheckRolesExisted};
