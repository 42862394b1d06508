//! SQLite persistence.
//!
//! A single key-value table; higher layers store whole JSON documents
//! under fixed keys.

pub mod init;
pub mod operations;


pub use init::{init_db_at, migrate, open_at};
pub use operations::{kv_get, kv_set};
