//! Reading the delimited ERP export into raw rows.

mod loader;
mod row;

pub use loader::CsvLoader;
pub use row::RawRow;
