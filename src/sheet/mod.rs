pub mod columns;
pub mod csv;
pub mod raw_table;
pub mod sanitize;

pub use columns::{locate, ColumnKind, ColumnMap};
pub use csv::parse_csv;
pub use raw_table::RawTable;
pub use sanitize::clean_text;
