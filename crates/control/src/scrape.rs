use crate::service::SyncService;
use gtin_sync_catalog::{selling_price, view};
use gtin_sync_metrics::TracingService;
use gtin_sync_models::{DatasetStage, DatasetView, ScrapeResult, SyncError};
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use uuid::Uuid;

impl SyncService {
    /// Looks up every row in sheet order. Progress is published after each
    /// row; the configured delay is slept between lookups.
    #[instrument(skip(self))]
    pub(crate) async fn run_scrape(&self, id: Uuid) -> Result<DatasetView, SyncError> {
        let rows: Vec<(usize, String)> = self
            .store
            .get(id)?
            .rows
            .iter()
            .map(|row| (row.line, row.gtin.clone()))
            .collect();
        let total = rows.len();
        let delay = Duration::from_millis(self.config.scraper.request_delay_ms);
        let multiplier = self.config.pricing.multiplier;
        info!(dataset_id = %id, rows = total, "scrape started");

        for (index, (line, gtin)) in rows.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let started = Instant::now();
            let result = if gtin.is_empty() {
                ScrapeResult {
                    warning: Some(format!("No GTIN on line {line}, lookup skipped")),
                    ..Default::default()
                }
            } else {
                self.source.lookup(gtin).await
            };
            self.metrics
                .record_lookup(&result, started.elapsed().as_secs_f64() * 1000.0);
            if let Some(warning) = &result.warning {
                TracingService::log_scrape_warning(&id.to_string(), gtin, warning);
            }

            self.store.update(id, |dataset| {
                if let Some(row) = dataset.rows.get_mut(index) {
                    row.selling_price = row
                        .price_inc_shipping
                        .map(|price| selling_price(price, multiplier));
                    row.scrape = Some(result);
                }
                dataset.set_stage(DatasetStage::Scraping {
                    completed: index + 1,
                    total,
                });
            })?;
        }

        self.store.set_stage(id, DatasetStage::Scraped)?;
        TracingService::log_stage_changed(&id.to_string(), &DatasetStage::Scraped);
        Ok(view(&self.store.get(id)?))
    }
}
