use anyhow::Result;
use gtin_sync_models::{
    DatasetStage, DatasetView, ErrorShape, ListDatasetsResponse, ListUploadsResponse,
    MessageResponse, UpdatePriceRequest, UpdateStatusRequest, UploadRequest,
};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use uuid::Uuid;

/// Thin client for the GTIN Sync HTTP API used by end-to-end tests.
pub struct SyncClient {
    client: Client,
    base_url: String,
}

impl SyncClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub async fn health(&self) -> Result<StatusCode> {
        let response = self
            .client
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await?;
        Ok(response.status())
    }

    pub async fn import_csv(&self, file_name: &str, csv: &str) -> Result<DatasetView> {
        let response = self
            .client
            .post(format!("{}/api/datasets", self.base_url))
            .query(&[("file_name", file_name)])
            .header("content-type", "text/csv")
            .body(csv.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Import failed: {}", error_text);
        }

        Ok(response.json().await?)
    }

    /// Same as [`Self::import_csv`] but returns the error body of a rejected import.
    pub async fn import_csv_expect_error(&self, csv: &str) -> Result<(StatusCode, ErrorShape)> {
        let response = self
            .client
            .post(format!("{}/api/datasets", self.base_url))
            .body(csv.to_string())
            .send()
            .await?;
        let status = response.status();
        Ok((status, response.json().await?))
    }

    pub async fn list_datasets(&self) -> Result<ListDatasetsResponse> {
        let response = self
            .client
            .get(format!("{}/api/datasets", self.base_url))
            .send()
            .await?;
        Ok(response.error_for_status()?.json().await?)
    }

    pub async fn get_dataset(&self, id: Uuid) -> Result<DatasetView> {
        let response = self
            .client
            .get(format!("{}/api/datasets/{}", self.base_url, id))
            .send()
            .await?;
        Ok(response.error_for_status()?.json().await?)
    }

    pub async fn start_scrape(&self, id: Uuid) -> Result<DatasetView> {
        let response = self
            .client
            .post(format!("{}/api/datasets/{}/scrape", self.base_url, id))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Scrape failed to start: {}", error_text);
        }

        Ok(response.json().await?)
    }

    pub async fn start_upload(&self, id: Uuid, request: &UploadRequest) -> Result<DatasetView> {
        let response = self
            .client
            .post(format!("{}/api/datasets/{}/upload", self.base_url, id))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Upload failed to start: {}", error_text);
        }

        Ok(response.json().await?)
    }

    /// Polls the dataset until `done` accepts its stage.
    pub async fn wait_for(
        &self,
        id: Uuid,
        done: impl Fn(&DatasetStage) -> bool,
    ) -> Result<DatasetView> {
        for _ in 0..200 {
            let view = self.get_dataset(id).await?;
            if done(&view.stage) {
                return Ok(view);
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        anyhow::bail!("dataset {} did not reach the expected stage", id)
    }

    pub async fn download_csv(&self, id: Uuid) -> Result<(Option<String>, String)> {
        let response = self
            .client
            .get(format!("{}/api/datasets/{}/csv", self.base_url, id))
            .send()
            .await?
            .error_for_status()?;
        let disposition = response
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok((disposition, response.text().await?))
    }

    pub async fn update_price(
        &self,
        product_id: u64,
        request: &UpdatePriceRequest,
    ) -> Result<(StatusCode, serde_json::Value)> {
        let response = self
            .client
            .put(format!("{}/api/products/{}/price", self.base_url, product_id))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        Ok((status, response.json().await?))
    }

    pub async fn set_status(
        &self,
        product_id: u64,
        request: &UpdateStatusRequest,
    ) -> Result<MessageResponse> {
        let response = self
            .client
            .put(format!("{}/api/products/{}/status", self.base_url, product_id))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Status update failed: {}", error_text);
        }

        Ok(response.json().await?)
    }

    pub async fn list_uploads(&self, dataset_id: Option<Uuid>) -> Result<ListUploadsResponse> {
        let mut request = self.client.get(format!("{}/api/uploads", self.base_url));
        if let Some(id) = dataset_id {
            request = request.query(&[("dataset_id", id.to_string())]);
        }
        Ok(request.send().await?.error_for_status()?.json().await?)
    }
}
