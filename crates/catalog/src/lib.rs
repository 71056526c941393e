//! Product sheet handling: reading uploaded CSV files, computing shop prices and
//! writing the enriched sheet back out.

pub mod columns;
pub mod export;
pub mod import;
pub mod pricing;

pub use export::{download_name, output_columns, preview, render_row, view, write_csv};
pub use import::parse_dataset;
pub use pricing::{format_price, selling_price};
