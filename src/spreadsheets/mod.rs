pub mod export_xlsx;

pub use export_xlsx::{export_records_xlsx, write_records_xlsx};
