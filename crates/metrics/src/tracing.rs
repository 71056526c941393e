use gtin_sync_models::{DatasetStage, UploadRecord};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub struct TracingService;

impl TracingService {
    /// Installs the global subscriber. `RUST_LOG` overrides the default
    /// `info` filter.
    pub fn init(json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339());

        if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        }
    }

    pub fn log_dataset_imported(dataset_id: &str, file_name: &str, rows: usize) {
        info!(
            dataset_id = %dataset_id,
            file_name = %file_name,
            rows = rows,
            "Dataset imported"
        );
    }

    pub fn log_stage_changed(dataset_id: &str, stage: &DatasetStage) {
        info!(
            dataset_id = %dataset_id,
            stage = %stage,
            "Dataset stage changed"
        );
    }

    pub fn log_scrape_warning(dataset_id: &str, gtin: &str, warning: &str) {
        warn!(
            dataset_id = %dataset_id,
            gtin = %gtin,
            warning = %warning,
            "Lookup finished with a warning"
        );
    }

    /// One line per upload attempt under the `upload` target, so the upload
    /// history can be filtered out of the main log.
    pub fn log_upload(record: &UploadRecord) {
        match &record.error {
            None => info!(
                target: "upload",
                dataset_id = %record.dataset_id,
                gtin = %record.gtin,
                name = %record.name,
                product_id = record.product_id.unwrap_or(0),
                status = %record.status,
                "Product uploaded"
            ),
            Some(reason) => error!(
                target: "upload",
                dataset_id = %record.dataset_id,
                gtin = %record.gtin,
                name = %record.name,
                product_id = record.product_id.unwrap_or(0),
                status = %record.status,
                error = %reason,
                "Product upload failed"
            ),
        }
    }
}
