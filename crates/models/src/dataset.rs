use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of rows shown in dataset previews.
pub const PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DatasetStage {
    Imported,
    Scraping { completed: usize, total: usize },
    Scraped,
    Uploading { completed: usize, total: usize },
    Uploaded,
}

impl DatasetStage {
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            DatasetStage::Scraping { .. } | DatasetStage::Uploading { .. }
        )
    }
}

impl fmt::Display for DatasetStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetStage::Imported => write!(f, "imported"),
            DatasetStage::Scraping { completed, total } => {
                write!(f, "scraping ({completed}/{total})")
            }
            DatasetStage::Scraped => write!(f, "scraped"),
            DatasetStage::Uploading { completed, total } => {
                write!(f, "uploading ({completed}/{total})")
            }
            DatasetStage::Uploaded => write!(f, "uploaded"),
        }
    }
}

/// What a lookup on the product site produced for one GTIN.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScrapeResult {
    pub link: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub warning: Option<String>,
}

impl ScrapeResult {
    pub fn is_hit(&self) -> bool {
        self.link.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", content = "reason")]
pub enum UploadStatus {
    Pending,
    Active,
    Failed(String),
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Pending => write!(f, "Pending"),
            UploadStatus::Active => write!(f, "Active"),
            UploadStatus::Failed(reason) => write!(f, "Failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRow {
    /// 1-based line in the source file, header included.
    pub line: usize,
    /// Source cells in header order, written back untouched.
    pub cells: Vec<String>,
    pub gtin: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price_inc_shipping: Option<f64>,
    pub inventory: i64,
    pub scrape: Option<ScrapeResult>,
    pub selling_price: Option<f64>,
    pub product_id: Option<u64>,
    pub upload_status: Option<UploadStatus>,
}

impl ProductRow {
    pub fn description(&self) -> &str {
        self.scrape
            .as_ref()
            .and_then(|s| s.description.as_deref())
            .unwrap_or("")
    }

    pub fn image_url(&self) -> Option<&str> {
        self.scrape
            .as_ref()
            .and_then(|s| s.image_url.as_deref())
            .filter(|url| !url.is_empty())
    }

    pub fn is_active(&self) -> bool {
        matches!(self.upload_status, Some(UploadStatus::Active))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    pub file_name: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<ProductRow>,
    pub stage: DatasetStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(file_name: Option<String>, headers: Vec<String>, rows: Vec<ProductRow>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            file_name,
            headers,
            rows,
            stage: DatasetStage::Imported,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_scrape_data(&self) -> bool {
        self.rows.iter().any(|row| row.scrape.is_some())
    }

    pub fn has_upload_data(&self) -> bool {
        self.rows.iter().any(|row| row.upload_status.is_some())
    }

    pub fn warnings(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.scrape.as_ref().and_then(|s| s.warning.clone()))
            .collect()
    }

    pub fn set_stage(&mut self, stage: DatasetStage) {
        self.stage = stage;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetView {
    pub id: Uuid,
    pub file_name: Option<String>,
    pub stage: DatasetStage,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub preview: Vec<Vec<String>>,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDatasetsResponse {
    pub datasets: Vec<DatasetView>,
}
