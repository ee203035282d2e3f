//! SQL statements as sent to the database.

pub mod format;
pub mod string;
