pub mod connection;
pub mod history;
pub mod records;

pub use connection::{init_db, Database};
pub use history::SqliteHistory;
pub use records::{count_records, recent_records, SqliteSink};
