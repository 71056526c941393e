use gtin_sync_models::{ScrapeResult, SyncError};
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Registry, TextEncoder};
use tracing::{debug, instrument};

pub struct MetricsService {
    registry: Registry,
    datasets_imported_total: Counter,
    rows_scraped_total: Counter,
    scrape_misses_total: Counter,
    scrape_warnings_total: Counter,
    products_uploaded_total: Counter,
    upload_failures_total: Counter,
    lookup_duration_ms: Histogram,
}

fn internal(e: prometheus::Error) -> SyncError {
    SyncError::InternalError {
        reason: e.to_string(),
    }
}

impl MetricsService {
    pub fn new() -> Result<Self, SyncError> {
        let registry = Registry::new();

        let datasets_imported_total = Counter::new(
            "gtin_sync_datasets_imported_total",
            "Total number of CSV sheets imported",
        )
        .map_err(internal)?;

        let rows_scraped_total = Counter::new(
            "gtin_sync_rows_scraped_total",
            "Total number of GTIN lookups performed",
        )
        .map_err(internal)?;

        let scrape_misses_total = Counter::new(
            "gtin_sync_scrape_misses_total",
            "Total number of GTINs with no product on the source site",
        )
        .map_err(internal)?;

        let scrape_warnings_total = Counter::new(
            "gtin_sync_scrape_warnings_total",
            "Total number of lookups that ended with a warning",
        )
        .map_err(internal)?;

        let products_uploaded_total = Counter::new(
            "gtin_sync_products_uploaded_total",
            "Total number of products created in the shop",
        )
        .map_err(internal)?;

        let upload_failures_total = Counter::new(
            "gtin_sync_upload_failures_total",
            "Total number of product uploads that failed",
        )
        .map_err(internal)?;

        let lookup_duration_ms = Histogram::with_opts(
            HistogramOpts::new(
                "gtin_sync_lookup_duration_ms",
                "Duration of a single GTIN lookup in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
            ]),
        )
        .map_err(internal)?;

        registry
            .register(Box::new(datasets_imported_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(rows_scraped_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(scrape_misses_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(scrape_warnings_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(products_uploaded_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(upload_failures_total.clone()))
            .map_err(internal)?;
        registry
            .register(Box::new(lookup_duration_ms.clone()))
            .map_err(internal)?;

        Ok(Self {
            registry,
            datasets_imported_total,
            rows_scraped_total,
            scrape_misses_total,
            scrape_warnings_total,
            products_uploaded_total,
            upload_failures_total,
            lookup_duration_ms,
        })
    }

    #[instrument(skip(self))]
    pub fn record_import(&self, file_name: &str, rows: usize) {
        self.datasets_imported_total.inc();
        debug!("Recorded import of {} ({} rows)", file_name, rows);
    }

    /// Counts one finished lookup. A lookup that found nothing and one that
    /// carries a warning are tracked separately.
    pub fn record_lookup(&self, result: &ScrapeResult, duration_ms: f64) {
        self.rows_scraped_total.inc();
        self.lookup_duration_ms.observe(duration_ms);
        if result.warning.is_some() {
            self.scrape_warnings_total.inc();
        } else if !result.is_hit() {
            self.scrape_misses_total.inc();
        }
    }

    pub fn record_upload_success(&self) {
        self.products_uploaded_total.inc();
    }

    pub fn record_upload_failure(&self) {
        self.upload_failures_total.inc();
    }

    #[instrument(skip(self))]
    pub fn get_prometheus_metrics(&self) -> Result<String, SyncError> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(internal)?;

        String::from_utf8(buffer).map_err(|e| SyncError::InternalError {
            reason: e.to_string(),
        })
    }
}
