pub mod config;
pub mod dataset;
pub mod error;
pub mod shopify;
pub mod upload;

pub use config::*;
pub use dataset::*;
pub use error::*;
pub use shopify::*;
pub use upload::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> ProductRow {
        ProductRow {
            line: 2,
            cells: vec!["7310865004703".to_string(), "Widget".to_string()],
            gtin: "7310865004703".to_string(),
            name: "Widget".to_string(),
            brand: "Acme".to_string(),
            category: "Tools".to_string(),
            price_inc_shipping: Some(10.0),
            inventory: 3,
            scrape: None,
            selling_price: None,
            product_id: None,
            upload_status: None,
        }
    }

    #[test]
    fn test_upload_status_display() {
        assert_eq!(UploadStatus::Pending.to_string(), "Pending");
        assert_eq!(UploadStatus::Active.to_string(), "Active");
        assert_eq!(
            UploadStatus::Failed("title can't be blank".into()).to_string(),
            "Failed: title can't be blank"
        );
    }

    #[test]
    fn test_stage_serde_is_tagged() {
        let stage = DatasetStage::Scraping {
            completed: 2,
            total: 5,
        };
        let json = serde_json::to_value(&stage).unwrap();
        assert_eq!(json["state"], "scraping");
        assert_eq!(json["completed"], 2);
        assert!(stage.is_running());
        assert!(!DatasetStage::Scraped.is_running());
    }

    #[test]
    fn test_row_accessors_ignore_empty_image() {
        let mut row = sample_row();
        assert_eq!(row.description(), "");
        assert_eq!(row.image_url(), None);

        row.scrape = Some(ScrapeResult {
            link: Some("https://www.deloox.se/p/1".into()),
            description: Some("Nice".into()),
            image_url: Some("".into()),
            warning: None,
        });
        assert_eq!(row.description(), "Nice");
        assert_eq!(row.image_url(), None);
    }

    #[test]
    fn test_dataset_collects_scrape_warnings() {
        let mut row = sample_row();
        row.scrape = Some(ScrapeResult {
            warning: Some("Error fetching data for GTIN 1: timeout".into()),
            ..Default::default()
        });
        let dataset = Dataset::new(None, vec!["GTIN".into()], vec![row, sample_row()]);
        assert!(dataset.has_scrape_data());
        assert!(!dataset.has_upload_data());
        assert_eq!(dataset.warnings().len(), 1);
        assert_eq!(dataset.stage, DatasetStage::Imported);
    }

    #[test]
    fn test_credentials_overrides_skip_blank_values() {
        let base = ShopifyCredentials {
            shop_url: "base.myshopify.com".into(),
            api_version: "2024-01".into(),
            api_token: "token".into(),
        };
        let overrides = CredentialsOverride {
            shop_url: Some("other.myshopify.com".into()),
            api_version: Some("  ".into()),
            api_token: None,
        };
        let merged = base.with_overrides(Some(&overrides));
        assert_eq!(merged.shop_url, "other.myshopify.com");
        assert_eq!(merged.api_version, "2024-01");
        assert_eq!(merged.api_token, "token");
        assert!(merged.ensure_complete().is_ok());
    }

    #[test]
    fn test_missing_credentials_are_listed() {
        let creds = ShopifyCredentials {
            shop_url: "".into(),
            api_version: "2024-01".into(),
            api_token: "".into(),
        };
        match creds.ensure_complete() {
            Err(SyncError::MissingCredentials { fields }) => {
                assert_eq!(fields, vec!["shop_url", "api_token"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_product_status_parse() {
        assert_eq!("draft".parse::<ProductStatus>().unwrap(), ProductStatus::Draft);
        assert_eq!("Archived".parse::<ProductStatus>().unwrap(), ProductStatus::Archived);
        assert!("deleted".parse::<ProductStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&ProductStatus::Active).unwrap(),
            "\"active\""
        );
    }

    #[test]
    fn test_update_status_request_deny_unknown_fields() {
        let json = r#"{"status": "draft", "unknown": true}"#;
        let result: Result<UpdateStatusRequest, _> = serde_json::from_str(json);
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }

    #[test]
    fn test_error_shape_and_status() {
        let err = SyncError::MissingColumns {
            columns: vec!["Brand".into()],
        };
        let shape = err.to_error_shape();
        assert_eq!(shape.error_message, "Missing columns: [\"Brand\"]");
        assert_eq!(shape.error_type, "InvalidCsvException");
        assert_eq!(err.http_status(), 400);
        assert_eq!(
            SyncError::ProductNotFound { product_id: 7 }.to_string(),
            "Product with ID 7 not found."
        );
    }
}
