//! Statement-level operations over a borrowed SQLite connection

pub mod query;
pub mod spans;
