//! Database layer: the user store seam plus PostgreSQL and in-memory backends.

mod memory;
mod postgres;
mod store;

pub use memory::MemoryUserStore;
pub use postgres::{create_pool, DbPool, PgUserStore};
pub use store::UserStore;
