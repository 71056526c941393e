//! Control plane for GTIN Sync: keeps imported datasets, runs scrape and
//! upload jobs against them and records every upload attempt.

pub mod ledger;
pub mod migrations;
pub mod service;
pub mod store;

mod scrape;
mod upload;

pub use ledger::UploadLedger;
pub use migrations::run_migrations;
pub use service::{CsvExport, SyncService, DEFAULT_UPLOAD_LIMIT, MAX_UPLOAD_LIMIT};
pub use store::DatasetStore;
