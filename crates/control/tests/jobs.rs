mod common;

use common::{service, service_from, service_with, RecordingSource, UnreachableShop};
use gtin_sync_models::{CredentialsOverride, DatasetStage, SyncError};
use gtin_sync_shopify::ShopifyConnector;
use gtin_sync_testsupport::{sample_csv, test_config, DelooxMock, ShopifyMock};
use std::sync::Arc;
use std::time::Duration;

fn two_rows() -> String {
    sample_csv(&[
        ("7310865004703", "Backpack", "14.00", "7"),
        ("0000000000017", "Lamp", "10", "2"),
    ])
}

#[tokio::test]
async fn scrape_fills_descriptions_and_prices() {
    let deloox = DelooxMock::new().with_product(
        "7310865004703",
        "Slitstark ryggsäck",
        Some("https://img.example/bag.jpg"),
    );
    let deloox_server = deloox.start().await.unwrap();
    let service = service(test_config(&deloox_server.base_url, "http://127.0.0.1:9")).await;

    let imported = service
        .import_csv(two_rows().as_bytes(), Some("products.csv".into()))
        .unwrap();
    assert_eq!(imported.stage, DatasetStage::Imported);
    assert_eq!(imported.row_count, 2);

    let scraped = service.scrape_dataset(imported.id).await.unwrap();
    assert_eq!(scraped.stage, DatasetStage::Scraped);
    assert!(scraped.columns.iter().any(|c| c == "Description"));
    assert_eq!(
        deloox.searches(),
        vec!["7310865004703".to_string(), "0000000000017".to_string()]
    );

    let export = service.export_csv(imported.id).unwrap();
    assert_eq!(export.file_name, "scraped_data.csv");
    let body = String::from_utf8(export.body).unwrap();
    assert!(body.contains("Slitstark ryggsäck"));
    assert!(body.contains("19.60"));
    assert!(body.contains("14.00"));
}

#[tokio::test]
async fn upload_requires_a_scraped_dataset() {
    let service = service(test_config("http://127.0.0.1:9", "http://127.0.0.1:9")).await;
    let imported = service.import_csv(two_rows().as_bytes(), None).unwrap();

    assert!(matches!(
        service.upload_dataset(imported.id, None).await,
        Err(SyncError::NotScraped { .. })
    ));
    assert!(matches!(
        service.scrape_dataset(uuid::Uuid::new_v4()).await,
        Err(SyncError::DatasetNotFound { .. })
    ));
}

#[tokio::test]
async fn upload_publishes_rows_and_records_the_ledger() {
    let deloox = DelooxMock::new().with_product("7310865004703", "Slitstark", None);
    let deloox_server = deloox.start().await.unwrap();
    let shop = ShopifyMock::new();
    let shop_server = shop.start().await.unwrap();
    let service = service(test_config(&deloox_server.base_url, &shop_server.base_url)).await;

    let id = service.import_csv(two_rows().as_bytes(), None).unwrap().id;
    service.scrape_dataset(id).await.unwrap();
    let uploaded = service.upload_dataset(id, None).await.unwrap();
    assert_eq!(uploaded.stage, DatasetStage::Uploaded);

    let products = shop.products();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["title"], "Test Backpack");
    assert_eq!(products[0]["variants"][0]["price"], "19.60");
    assert_eq!(shop.inventory_sets().len(), 2);

    let ledger = service.list_uploads(Some(id), None).await.unwrap().uploads;
    assert_eq!(ledger.len(), 2);
    assert!(ledger.iter().all(|r| r.status == "Active" && r.error.is_none()));
    // newest first
    assert_eq!(ledger[0].gtin, "0000000000017");

    let export = service.export_csv(id).unwrap();
    assert_eq!(export.file_name, "uploaded_data.csv");
    let body = String::from_utf8(export.body).unwrap();
    assert!(body.contains("Active"));

    // Active rows are not uploaded twice.
    service.upload_dataset(id, None).await.unwrap();
    assert_eq!(shop.products().len(), 2);
    assert_eq!(service.list_uploads(None, None).await.unwrap().uploads.len(), 2);
}

#[tokio::test]
async fn rejected_rows_fail_without_stopping_the_batch() {
    let deloox_server = DelooxMock::new().start().await.unwrap();
    let shop = ShopifyMock::new().rejecting_title("Test Backpack");
    let shop_server = shop.start().await.unwrap();
    let service = service(test_config(&deloox_server.base_url, &shop_server.base_url)).await;

    let id = service.import_csv(two_rows().as_bytes(), None).unwrap().id;
    service.scrape_dataset(id).await.unwrap();
    service.upload_dataset(id, None).await.unwrap();

    assert_eq!(shop.products().len(), 1);
    let ledger = service.list_uploads(Some(id), Some(10)).await.unwrap().uploads;
    let failed = ledger.iter().find(|r| r.gtin == "7310865004703").unwrap();
    assert_eq!(failed.status, "Failed");
    assert!(failed.error.as_deref().unwrap().contains("title is reserved"));

    let body = String::from_utf8(service.export_csv(id).unwrap().body).unwrap();
    assert!(body.contains("Failed: "));
}

#[tokio::test]
async fn inventory_failure_keeps_the_created_product() {
    let deloox_server = DelooxMock::new().start().await.unwrap();
    let shop = ShopifyMock::new().rejecting_inventory();
    let shop_server = shop.start().await.unwrap();
    let service = service(test_config(&deloox_server.base_url, &shop_server.base_url)).await;

    let id = service.import_csv(two_rows().as_bytes(), None).unwrap().id;
    service.scrape_dataset(id).await.unwrap();
    service.upload_dataset(id, None).await.unwrap();

    let products = shop.products();
    assert_eq!(products.len(), 2);
    assert!(shop.inventory_sets().is_empty());

    let ledger = service.list_uploads(Some(id), None).await.unwrap().uploads;
    assert_eq!(ledger.len(), 2);
    for record in &ledger {
        assert_eq!(record.status, "Failed");
        assert!(record.product_id.is_some());
        assert!(record
            .error
            .as_deref()
            .unwrap()
            .starts_with("Inventory not set: "));
    }

    let first_id = products[0]["id"].as_u64().unwrap();
    let body = String::from_utf8(service.export_csv(id).unwrap().body).unwrap();
    let first_row = body.lines().nth(1).unwrap();
    assert!(first_row.contains(&first_id.to_string()));
    assert!(first_row.contains("Failed: Inventory not set: "));
}

#[tokio::test]
async fn scrape_waits_between_rows_but_not_after_the_last() {
    let mut config = test_config("http://127.0.0.1:9", "http://127.0.0.1:9");
    config.scraper.request_delay_ms = 1_000;
    let source = Arc::new(RecordingSource::default());
    let connector = Arc::new(ShopifyConnector::new(Duration::from_secs(2)));
    let service = service_from(config, source.clone(), connector).await;

    let sheet = sample_csv(&[
        ("1", "First", "1", "1"),
        ("2", "Second", "1", "1"),
        ("3", "Third", "1", "1"),
    ]);
    let id = service.import_csv(sheet.as_bytes(), None).unwrap().id;

    tokio::time::pause();
    let started = tokio::time::Instant::now();
    service.scrape_dataset(id).await.unwrap();
    let elapsed = started.elapsed();

    let calls = source.calls();
    let gtins: Vec<&str> = calls.iter().map(|(gtin, _)| gtin.as_str()).collect();
    assert_eq!(gtins, vec!["1", "2", "3"]);
    assert_eq!(calls[0].1 - started, Duration::ZERO);
    assert_eq!(calls[1].1 - calls[0].1, Duration::from_secs(1));
    assert_eq!(calls[2].1 - calls[1].1, Duration::from_secs(1));
    assert_eq!(elapsed, Duration::from_secs(2));
}

#[tokio::test]
async fn rows_without_gtin_are_not_looked_up() {
    let config = test_config("http://127.0.0.1:9", "http://127.0.0.1:9");
    let source = Arc::new(RecordingSource::default());
    let connector = Arc::new(ShopifyConnector::new(Duration::from_secs(2)));
    let service = service_from(config, source.clone(), connector).await;

    let sheet = sample_csv(&[("1", "Labelled", "1", "1"), ("", "Unlabelled", "2", "1")]);
    let id = service.import_csv(sheet.as_bytes(), None).unwrap().id;
    let scraped = service.scrape_dataset(id).await.unwrap();

    let gtins: Vec<String> = source.calls().into_iter().map(|(gtin, _)| gtin).collect();
    assert_eq!(gtins, vec!["1".to_string()]);
    assert_eq!(scraped.warnings, vec!["No GTIN on line 3, lookup skipped".to_string()]);
    assert_eq!(scraped.stage, DatasetStage::Scraped);
}

#[tokio::test]
async fn shop_without_locations_creates_nothing() {
    let deloox_server = DelooxMock::new().start().await.unwrap();
    let shop = ShopifyMock::new().without_locations();
    let shop_server = shop.start().await.unwrap();
    let service = service(test_config(&deloox_server.base_url, &shop_server.base_url)).await;

    let id = service.import_csv(two_rows().as_bytes(), None).unwrap().id;
    service.scrape_dataset(id).await.unwrap();
    service.upload_dataset(id, None).await.unwrap();

    assert!(shop.products().is_empty());
    let ledger = service.list_uploads(Some(id), None).await.unwrap().uploads;
    assert_eq!(ledger.len(), 2);
    assert!(ledger
        .iter()
        .all(|r| r.error.as_deref() == Some("No locations found for inventory.")));
}

#[tokio::test]
async fn missing_token_is_reported_before_the_job_starts() {
    let deloox_server = DelooxMock::new().start().await.unwrap();
    let mut config = test_config(&deloox_server.base_url, "demo.myshopify.com");
    config.shopify.api_token = String::new();
    let service = service(config).await;

    let id = service.import_csv(two_rows().as_bytes(), None).unwrap().id;
    service.scrape_dataset(id).await.unwrap();

    match service.upload_dataset(id, None).await.unwrap_err() {
        SyncError::MissingCredentials { fields } => assert_eq!(fields, vec!["api_token"]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(service.get_dataset(id).unwrap().stage, DatasetStage::Scraped);

    let blank = CredentialsOverride {
        api_token: Some("  ".into()),
        ..Default::default()
    };
    assert!(matches!(
        service.upload_dataset(id, Some(&blank)).await,
        Err(SyncError::MissingCredentials { .. })
    ));
}

#[tokio::test]
async fn unreachable_shop_returns_dataset_to_scraped() {
    let deloox_server = DelooxMock::new().start().await.unwrap();
    let config = test_config(&deloox_server.base_url, "demo.myshopify.com");
    let service = service_with(config, Arc::new(UnreachableShop)).await;

    let id = service.import_csv(two_rows().as_bytes(), None).unwrap().id;
    service.scrape_dataset(id).await.unwrap();

    assert!(matches!(
        service.upload_dataset(id, None).await,
        Err(SyncError::ShopifyTransport { .. })
    ));
    assert_eq!(service.get_dataset(id).unwrap().stage, DatasetStage::Scraped);
    assert!(matches!(
        service.update_product_price(1, 5.0, None).await,
        Err(SyncError::ShopifyTransport { .. })
    ));
}

#[tokio::test]
async fn background_scrape_reports_progress_and_blocks_a_second_job() {
    let deloox_server = DelooxMock::new().start().await.unwrap();
    let mut config = test_config(&deloox_server.base_url, "http://127.0.0.1:9");
    config.scraper.request_delay_ms = 50;
    let service = service(config).await;

    let id = service.import_csv(two_rows().as_bytes(), None).unwrap().id;
    let started = service.spawn_scrape(id).unwrap();
    assert!(matches!(started.stage, DatasetStage::Scraping { total: 2, .. }));

    assert!(matches!(
        service.spawn_scrape(id),
        Err(SyncError::DatasetBusy { .. })
    ));
    assert!(matches!(
        service.delete_dataset(id),
        Err(SyncError::DatasetBusy { .. })
    ));

    let mut stage = started.stage;
    for _ in 0..200 {
        stage = service.get_dataset(id).unwrap().stage;
        if stage == DatasetStage::Scraped {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(stage, DatasetStage::Scraped);

    service.delete_dataset(id).unwrap();
    assert!(service.list_datasets().datasets.is_empty());
}

#[tokio::test]
async fn product_price_and_status_go_through_the_shop() {
    let shop = ShopifyMock::new();
    let shop_server = shop.start().await.unwrap();
    let service = service(test_config("http://127.0.0.1:9", &shop_server.base_url)).await;
    let id = shop.insert_product("Test Lamp", &["10.00"]);

    let updated = service.update_product_price(id, 12.0, None).await.unwrap();
    assert_eq!(
        updated.message,
        format!("Price updated successfully to 12.00 for product ID {id}.")
    );

    let deactivated = service.deactivate_product(id, None, None).await.unwrap();
    assert_eq!(
        deactivated.message,
        format!("Product ID {id} has been set to status 'draft'.")
    );
    assert_eq!(shop.product(id).unwrap()["status"], "draft");
}
