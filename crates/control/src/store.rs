use dashmap::DashMap;
use gtin_sync_models::{Dataset, DatasetStage, SyncError};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// In-memory datasets keyed by id. Stage transitions that start a job are
/// checked and applied under the entry lock, so two jobs can never run on
/// the same dataset.
#[derive(Clone, Default)]
pub struct DatasetStore {
    datasets: Arc<DashMap<Uuid, Dataset>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, dataset: Dataset) -> Uuid {
        let id = dataset.id;
        self.datasets.insert(id, dataset);
        debug!(dataset_id = %id, "dataset stored");
        id
    }

    pub fn get(&self, id: Uuid) -> Result<Dataset, SyncError> {
        self.datasets
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(SyncError::DatasetNotFound { id })
    }

    /// Oldest first.
    pub fn list(&self) -> Vec<Dataset> {
        let mut datasets: Vec<Dataset> = self
            .datasets
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        datasets.sort_by_key(|d| d.created_at);
        datasets
    }

    /// Refuses to drop a dataset while a job is working on it.
    pub fn remove(&self, id: Uuid) -> Result<Dataset, SyncError> {
        let removed = self
            .datasets
            .remove_if(&id, |_, dataset| !dataset.stage.is_running());
        match removed {
            Some((_, dataset)) => Ok(dataset),
            None => {
                let dataset = self.get(id)?;
                Err(SyncError::DatasetBusy {
                    id,
                    stage: dataset.stage.to_string(),
                })
            }
        }
    }

    pub fn begin_scrape(&self, id: Uuid) -> Result<Dataset, SyncError> {
        let mut entry = self
            .datasets
            .get_mut(&id)
            .ok_or(SyncError::DatasetNotFound { id })?;
        let dataset = entry.value_mut();
        ensure_idle(dataset)?;
        let total = dataset.rows.len();
        dataset.set_stage(DatasetStage::Scraping {
            completed: 0,
            total,
        });
        Ok(dataset.clone())
    }

    /// `total` is the number of rows the upload job will attempt.
    pub fn begin_upload(&self, id: Uuid) -> Result<Dataset, SyncError> {
        let mut entry = self
            .datasets
            .get_mut(&id)
            .ok_or(SyncError::DatasetNotFound { id })?;
        let dataset = entry.value_mut();
        ensure_idle(dataset)?;
        if dataset.stage == DatasetStage::Imported {
            return Err(SyncError::NotScraped { id });
        }
        let total = dataset.rows.iter().filter(|row| !row.is_active()).count();
        dataset.set_stage(DatasetStage::Uploading {
            completed: 0,
            total,
        });
        Ok(dataset.clone())
    }

    pub fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut Dataset) -> R) -> Result<R, SyncError> {
        let mut entry = self
            .datasets
            .get_mut(&id)
            .ok_or(SyncError::DatasetNotFound { id })?;
        Ok(f(entry.value_mut()))
    }

    pub fn set_stage(&self, id: Uuid, stage: DatasetStage) -> Result<(), SyncError> {
        self.update(id, |dataset| dataset.set_stage(stage))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

fn ensure_idle(dataset: &Dataset) -> Result<(), SyncError> {
    if dataset.stage.is_running() {
        return Err(SyncError::DatasetBusy {
            id: dataset.id,
            stage: dataset.stage.to_string(),
        });
    }
    Ok(())
}
