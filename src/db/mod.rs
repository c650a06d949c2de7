//! SQLite persistence for the cross-reference index.

mod connection;
mod queries;

pub use connection::Database;
pub use queries::FileRow;
