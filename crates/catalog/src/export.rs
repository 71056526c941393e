use crate::columns;
use crate::pricing::format_price;
use gtin_sync_models::{Dataset, DatasetView, ProductRow, SyncError, PREVIEW_ROWS};

/// Columns derived from scraping and uploading that this dataset carries.
fn derived_columns(dataset: &Dataset) -> Vec<&'static str> {
    let mut derived = Vec::new();
    if dataset.has_scrape_data() {
        derived.extend(columns::SCRAPED);
    }
    if dataset.has_upload_data() {
        derived.extend(columns::UPLOADED);
    }
    derived
}

/// Source headers followed by derived columns not already present in them.
pub fn output_columns(dataset: &Dataset) -> Vec<String> {
    let mut out = dataset.headers.clone();
    for name in derived_columns(dataset) {
        if !dataset.headers.iter().any(|h| h == name) {
            out.push(name.to_string());
        }
    }
    out
}

fn derived_value(row: &ProductRow, column: &str) -> String {
    let scrape = row.scrape.as_ref();
    match column {
        columns::LINK => scrape.and_then(|s| s.link.clone()).unwrap_or_default(),
        columns::DESCRIPTION => scrape
            .and_then(|s| s.description.clone())
            .unwrap_or_default(),
        columns::IMAGE_URL => scrape.and_then(|s| s.image_url.clone()).unwrap_or_default(),
        columns::SELLING_PRICE => row.selling_price.map(format_price).unwrap_or_default(),
        columns::PRODUCT_ID => row.product_id.map(|id| id.to_string()).unwrap_or_default(),
        columns::UPLOAD_STATUS => row
            .upload_status
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Renders `row` in `output_columns` order.
pub fn render_row(dataset: &Dataset, row: &ProductRow) -> Vec<String> {
    let derived = derived_columns(dataset);
    let mut out: Vec<String> = dataset
        .headers
        .iter()
        .zip(row.cells.iter())
        .map(|(header, cell)| {
            if derived.contains(&header.as_str()) {
                derived_value(row, header)
            } else {
                cell.clone()
            }
        })
        .collect();
    for name in derived {
        if !dataset.headers.iter().any(|h| h == name) {
            out.push(derived_value(row, name));
        }
    }
    out
}

pub fn preview(dataset: &Dataset, limit: usize) -> Vec<Vec<String>> {
    dataset
        .rows
        .iter()
        .take(limit)
        .map(|row| render_row(dataset, row))
        .collect()
}

pub fn write_csv(dataset: &Dataset) -> Result<Vec<u8>, SyncError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(output_columns(dataset))
        .map_err(internal)?;
    for row in &dataset.rows {
        writer
            .write_record(render_row(dataset, row))
            .map_err(internal)?;
    }
    writer.into_inner().map_err(|e| SyncError::InternalError {
        reason: e.to_string(),
    })
}

pub fn download_name(dataset: &Dataset) -> &'static str {
    if dataset.has_upload_data() {
        "uploaded_data.csv"
    } else if dataset.has_scrape_data() {
        "scraped_data.csv"
    } else {
        "products.csv"
    }
}

pub fn view(dataset: &Dataset) -> DatasetView {
    DatasetView {
        id: dataset.id,
        file_name: dataset.file_name.clone(),
        stage: dataset.stage.clone(),
        row_count: dataset.rows.len(),
        columns: output_columns(dataset),
        preview: preview(dataset, PREVIEW_ROWS),
        warnings: dataset.warnings(),
        created_at: dataset.created_at,
        updated_at: dataset.updated_at,
    }
}

fn internal(err: csv::Error) -> SyncError {
    SyncError::InternalError {
        reason: err.to_string(),
    }
}
