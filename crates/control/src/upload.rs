use crate::service::SyncService;
use chrono::Utc;
use gtin_sync_catalog::view;
use gtin_sync_metrics::TracingService;
use gtin_sync_models::{
    DatasetStage, DatasetView, ShopifyCredentials, SyncError, UploadRecord, UploadStatus,
};
use gtin_sync_shopify::{new_product_for, publish_listing, Storefront};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Outcome of one row's upload attempt.
struct Attempt {
    product_id: Option<u64>,
    error: Option<String>,
}

impl SyncService {
    #[instrument(skip(self, credentials))]
    pub(crate) async fn run_upload(
        &self,
        id: Uuid,
        credentials: &ShopifyCredentials,
    ) -> Result<DatasetView, SyncError> {
        let store = match self.connector.connect(credentials) {
            Ok(store) => store,
            Err(e) => {
                self.store.set_stage(id, DatasetStage::Scraped)?;
                return Err(e);
            }
        };

        let dataset = self.store.get(id)?;
        let pending: Vec<usize> = dataset
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_active())
            .map(|(index, _)| index)
            .collect();
        let total = pending.len();

        self.store.update(id, |dataset| {
            for &index in &pending {
                dataset.rows[index].upload_status = Some(UploadStatus::Pending);
            }
        })?;

        // One location serves the whole batch. Without one no product is
        // created, so a shop without locations never collects orphans.
        let location = match store.locations().await {
            Ok(locations) => locations
                .first()
                .map(|location| location.id)
                .ok_or_else(|| SyncError::NoLocations.to_string()),
            Err(e) => Err(e.to_string()),
        };
        info!(dataset_id = %id, rows = total, "upload started");

        for (done, &index) in pending.iter().enumerate() {
            let row = &dataset.rows[index];
            let attempt = match &location {
                Ok(location_id) => self.publish(store.as_ref(), row, *location_id).await,
                Err(reason) => Attempt {
                    product_id: None,
                    error: Some(reason.clone()),
                },
            };

            let status = match &attempt.error {
                None => UploadStatus::Active,
                Some(reason) => UploadStatus::Failed(reason.clone()),
            };
            self.store.update(id, |dataset| {
                let target = &mut dataset.rows[index];
                target.product_id = attempt.product_id.or(target.product_id);
                target.upload_status = Some(status);
                dataset.set_stage(DatasetStage::Uploading {
                    completed: done + 1,
                    total,
                });
            })?;

            let record = UploadRecord {
                id: Uuid::new_v4(),
                dataset_id: id,
                gtin: row.gtin.clone(),
                name: row.name.clone(),
                product_id: attempt.product_id,
                status: if attempt.error.is_none() {
                    "Active".to_string()
                } else {
                    "Failed".to_string()
                },
                error: attempt.error,
                created_at: Utc::now(),
            };
            TracingService::log_upload(&record);
            if record.error.is_none() {
                self.metrics.record_upload_success();
            } else {
                self.metrics.record_upload_failure();
            }
            if let Err(e) = self.ledger.record(&record).await {
                warn!(dataset_id = %id, gtin = %record.gtin, error = %e, "upload ledger write failed");
            }
        }

        self.store.set_stage(id, DatasetStage::Uploaded)?;
        TracingService::log_stage_changed(&id.to_string(), &DatasetStage::Uploaded);
        Ok(view(&self.store.get(id)?))
    }

    async fn publish(
        &self,
        store: &dyn Storefront,
        row: &gtin_sync_models::ProductRow,
        location_id: u64,
    ) -> Attempt {
        let listing = new_product_for(row, &self.config.pricing.title_prefix);
        match publish_listing(store, &listing, location_id, row.inventory).await {
            Ok(product_id) => Attempt {
                product_id: Some(product_id),
                error: None,
            },
            Err(SyncError::InventoryNotSet { product_id, reason }) => Attempt {
                product_id: Some(product_id),
                error: Some(format!("Inventory not set: {reason}")),
            },
            Err(e) => Attempt {
                product_id: None,
                error: Some(e.to_string()),
            },
        }
    }
}
