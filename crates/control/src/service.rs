use crate::ledger::UploadLedger;
use crate::migrations::run_migrations;
use crate::store::DatasetStore;
use gtin_sync_catalog::{download_name, parse_dataset, view, write_csv};
use gtin_sync_metrics::{MetricsService, TracingService};
use gtin_sync_models::{
    Config, CredentialsOverride, DatasetView, ListDatasetsResponse, ListUploadsResponse,
    MessageResponse, ProductStatus, ShopifyCredentials, SyncError,
};
use gtin_sync_scraper::ProductSource;
use gtin_sync_shopify::{Storefront, StorefrontConnector};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

pub const DEFAULT_UPLOAD_LIMIT: i64 = 100;
pub const MAX_UPLOAD_LIMIT: i64 = 1000;

/// An enriched sheet ready for download.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub file_name: &'static str,
    pub body: Vec<u8>,
}

pub struct SyncService {
    pub(crate) store: DatasetStore,
    pub(crate) ledger: UploadLedger,
    pub(crate) source: Arc<dyn ProductSource>,
    pub(crate) connector: Arc<dyn StorefrontConnector>,
    pub(crate) metrics: Arc<MetricsService>,
    pub(crate) config: Arc<Config>,
}

impl SyncService {
    pub async fn new(
        pool: SqlitePool,
        source: Arc<dyn ProductSource>,
        connector: Arc<dyn StorefrontConnector>,
        metrics: Arc<MetricsService>,
        config: Arc<Config>,
    ) -> Result<Self, SyncError> {
        run_migrations(&pool).await.map_err(SyncError::SqlxError)?;
        Ok(Self {
            store: DatasetStore::new(),
            ledger: UploadLedger::new(pool),
            source,
            connector,
            metrics,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsService {
        &self.metrics
    }

    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn import_csv(
        &self,
        bytes: &[u8],
        file_name: Option<String>,
    ) -> Result<DatasetView, SyncError> {
        let dataset = parse_dataset(bytes, file_name, self.config.pricing.multiplier)?;
        let name = dataset.file_name.clone().unwrap_or_default();
        self.metrics.record_import(&name, dataset.rows.len());
        TracingService::log_dataset_imported(&dataset.id.to_string(), &name, dataset.rows.len());

        let view = view(&dataset);
        self.store.insert(dataset);
        Ok(view)
    }

    pub fn get_dataset(&self, id: Uuid) -> Result<DatasetView, SyncError> {
        Ok(view(&self.store.get(id)?))
    }

    pub fn list_datasets(&self) -> ListDatasetsResponse {
        ListDatasetsResponse {
            datasets: self.store.list().iter().map(view).collect(),
        }
    }

    pub fn delete_dataset(&self, id: Uuid) -> Result<(), SyncError> {
        self.store.remove(id)?;
        info!(dataset_id = %id, "dataset deleted");
        Ok(())
    }

    pub fn export_csv(&self, id: Uuid) -> Result<CsvExport, SyncError> {
        let dataset = self.store.get(id)?;
        Ok(CsvExport {
            file_name: download_name(&dataset),
            body: write_csv(&dataset)?,
        })
    }

    /// Scrapes every row and waits for the job to finish.
    pub async fn scrape_dataset(&self, id: Uuid) -> Result<DatasetView, SyncError> {
        self.store.begin_scrape(id)?;
        self.run_scrape(id).await
    }

    /// Starts a scrape on a background task and returns right away with the
    /// dataset in its `scraping` stage.
    pub fn spawn_scrape(self: &Arc<Self>, id: Uuid) -> Result<DatasetView, SyncError> {
        let dataset = self.store.begin_scrape(id)?;
        let service = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = service.run_scrape(id).await {
                error!(dataset_id = %id, error = %e, "scrape job failed");
            }
        });
        Ok(view(&dataset))
    }

    /// Uploads every row not already active and waits for the job to finish.
    pub async fn upload_dataset(
        &self,
        id: Uuid,
        overrides: Option<&CredentialsOverride>,
    ) -> Result<DatasetView, SyncError> {
        let credentials = self.credentials(overrides)?;
        self.store.begin_upload(id)?;
        self.run_upload(id, &credentials).await
    }

    pub fn spawn_upload(
        self: &Arc<Self>,
        id: Uuid,
        overrides: Option<&CredentialsOverride>,
    ) -> Result<DatasetView, SyncError> {
        let credentials = self.credentials(overrides)?;
        let dataset = self.store.begin_upload(id)?;
        let service = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = service.run_upload(id, &credentials).await {
                error!(dataset_id = %id, error = %e, "upload job failed");
            }
        });
        Ok(view(&dataset))
    }

    pub async fn update_product_price(
        &self,
        product_id: u64,
        price: f64,
        overrides: Option<&CredentialsOverride>,
    ) -> Result<MessageResponse, SyncError> {
        let store = self.storefront(overrides)?;
        let message = gtin_sync_shopify::update_product_price(store.as_ref(), product_id, price).await?;
        Ok(MessageResponse { message })
    }

    /// Status defaults to `draft`.
    pub async fn deactivate_product(
        &self,
        product_id: u64,
        status: Option<ProductStatus>,
        overrides: Option<&CredentialsOverride>,
    ) -> Result<MessageResponse, SyncError> {
        let store = self.storefront(overrides)?;
        let message = gtin_sync_shopify::deactivate_product(
            store.as_ref(),
            product_id,
            status.unwrap_or(ProductStatus::Draft),
        )
        .await?;
        Ok(MessageResponse { message })
    }

    pub async fn list_uploads(
        &self,
        dataset_id: Option<Uuid>,
        limit: Option<i64>,
    ) -> Result<ListUploadsResponse, SyncError> {
        let limit = limit
            .unwrap_or(DEFAULT_UPLOAD_LIMIT)
            .clamp(1, MAX_UPLOAD_LIMIT);
        Ok(ListUploadsResponse {
            uploads: self.ledger.list(dataset_id, limit).await?,
        })
    }

    fn credentials(
        &self,
        overrides: Option<&CredentialsOverride>,
    ) -> Result<ShopifyCredentials, SyncError> {
        let credentials = self.config.credentials().with_overrides(overrides);
        credentials.ensure_complete()?;
        Ok(credentials)
    }

    fn storefront(
        &self,
        overrides: Option<&CredentialsOverride>,
    ) -> Result<Arc<dyn Storefront>, SyncError> {
        let credentials = self.credentials(overrides)?;
        self.connector.connect(&credentials)
    }
}
