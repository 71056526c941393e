use crate::columns;
use crate::pricing::{parse_inventory, parse_price, selling_price};
use gtin_sync_models::{Dataset, DatasetStage, ProductRow, ScrapeResult, SyncError, UploadStatus};
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Positions of the known columns within the header row.
struct ColumnIndex {
    gtin: usize,
    name: usize,
    brand: usize,
    category: usize,
    price: usize,
    inventory: usize,
    link: Option<usize>,
    description: Option<usize>,
    image_url: Option<usize>,
    selling_price: Option<usize>,
    product_id: Option<usize>,
    upload_status: Option<usize>,
}

impl ColumnIndex {
    fn locate(headers: &[String]) -> Result<Self, SyncError> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<String> = columns::REQUIRED
            .iter()
            .filter(|name| find(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::MissingColumns { columns: missing });
        }

        let required = |name: &str| {
            find(name).ok_or_else(|| SyncError::MissingColumns {
                columns: vec![name.to_string()],
            })
        };
        Ok(Self {
            gtin: required(columns::GTIN)?,
            name: required(columns::NAME)?,
            brand: required(columns::BRAND)?,
            category: required(columns::CATEGORY)?,
            price: required(columns::PRICE_INC_SHIPPING)?,
            inventory: required(columns::INVENTORY)?,
            link: find(columns::LINK),
            description: find(columns::DESCRIPTION),
            image_url: find(columns::IMAGE_URL),
            selling_price: find(columns::SELLING_PRICE),
            product_id: find(columns::PRODUCT_ID),
            upload_status: find(columns::UPLOAD_STATUS),
        })
    }

    /// A sheet previously exported after scraping carries its lookup results.
    fn has_scrape_columns(&self) -> bool {
        self.link.is_some() && self.description.is_some() && self.image_url.is_some()
    }
}

/// Reads a product sheet. Files exported by an earlier run are picked up where
/// they left off: scrape results and upload outcomes found in the derived
/// columns are restored.
pub fn parse_dataset(
    bytes: &[u8],
    file_name: Option<String>,
    multiplier: f64,
) -> Result<Dataset, SyncError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(invalid_csv)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(SyncError::EmptyCsv);
    }
    let index = ColumnIndex::locate(&headers)?;
    let restore_scrape = index.has_scrape_columns();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(invalid_csv)?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(i + 2);
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            debug!(line, "skipping blank row");
            continue;
        }
        if cells.len() > headers.len() {
            // An unquoted decimal comma shifts every later cell one column right.
            if cells[headers.len()..].iter().any(|c| !c.trim().is_empty()) {
                return Err(SyncError::InvalidCsv {
                    reason: format!(
                        "line {line}: expected {} fields, saw {}",
                        headers.len(),
                        cells.len()
                    ),
                });
            }
            debug!(line, "dropping trailing empty cells");
        }
        cells.resize(headers.len(), String::new());

        rows.push(parse_row(line, cells, &headers, &index, restore_scrape, multiplier)?);
    }

    if rows.is_empty() {
        return Err(SyncError::EmptyCsv);
    }

    let mut dataset = Dataset::new(file_name, headers, rows);
    if dataset.has_upload_data() {
        dataset.set_stage(DatasetStage::Uploaded);
    } else if dataset.has_scrape_data() {
        dataset.set_stage(DatasetStage::Scraped);
    }
    Ok(dataset)
}

fn parse_row(
    line: usize,
    cells: Vec<String>,
    headers: &[String],
    index: &ColumnIndex,
    restore_scrape: bool,
    multiplier: f64,
) -> Result<ProductRow, SyncError> {
    let cell = |i: usize| cells[i].trim().to_string();
    let invalid = |i: usize| SyncError::InvalidRow {
        line,
        column: headers[i].clone(),
        value: cells[i].clone(),
    };
    let optional = |i: Option<usize>| {
        i.map(|i| cells[i].trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let gtin = cell(index.gtin);
    if gtin.is_empty() {
        warn!(line, "row has no GTIN, it will not be looked up");
    }
    let price_inc_shipping = parse_price(&cells[index.price]).map_err(|_| invalid(index.price))?;
    let inventory = parse_inventory(&cells[index.inventory]).map_err(|_| invalid(index.inventory))?;

    let scrape = restore_scrape.then(|| ScrapeResult {
        link: optional(index.link),
        description: optional(index.description),
        image_url: optional(index.image_url),
        warning: None,
    });
    let selling_price = if scrape.is_some() {
        let recorded = match index.selling_price {
            Some(i) => parse_price(&cells[i]).map_err(|_| invalid(i))?,
            None => None,
        };
        recorded.or_else(|| price_inc_shipping.map(|p| selling_price(p, multiplier)))
    } else {
        None
    };

    let product_id = match index.product_id.map(|i| (i, cells[i].trim())) {
        Some((_, "")) | None => None,
        Some((i, raw)) => Some(parse_product_id(raw).ok_or_else(|| invalid(i))?),
    };
    let upload_status = optional(index.upload_status).map(|raw| parse_upload_status(&raw));

    Ok(ProductRow {
        line,
        gtin,
        name: cell(index.name),
        brand: cell(index.brand),
        category: cell(index.category),
        price_inc_shipping,
        inventory,
        scrape,
        selling_price,
        product_id,
        upload_status,
        cells,
    })
}

fn parse_product_id(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as u64)
    })
}

fn parse_upload_status(raw: &str) -> UploadStatus {
    match raw {
        "Active" => UploadStatus::Active,
        "Pending" => UploadStatus::Pending,
        other => UploadStatus::Failed(
            other
                .strip_prefix("Failed:")
                .map(str::trim)
                .unwrap_or(other)
                .to_string(),
        ),
    }
}

fn invalid_csv(err: csv::Error) -> SyncError {
    SyncError::InvalidCsv {
        reason: err.to_string(),
    }
}
