//! HTTP plumbing shared by the route table.

pub mod http;

pub use http::*;
