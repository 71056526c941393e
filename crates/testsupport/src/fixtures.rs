use gtin_sync_models::Config;

pub const SAMPLE_HEADER: &str = "GTIN,Name,Brand,Category,€ Price inc. shipping,Inventory";

/// A product sheet with one row per `(gtin, name, price, inventory)`.
/// Cells containing a comma (such as a `20,50` price) are quoted.
pub fn sample_csv(rows: &[(&str, &str, &str, &str)]) -> String {
    let mut csv = format!("{SAMPLE_HEADER}\n");
    for (gtin, name, price, inventory) in rows {
        let cells = [*gtin, *name, "Acme", "Tools", *price, *inventory].map(quoted);
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    csv
}

fn quoted(cell: &str) -> String {
    if cell.contains([',', '"']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Configuration pointing at mock servers, with no delay between lookups.
pub fn test_config(deloox_url: &str, shopify_url: &str) -> Config {
    let mut config = Config::default();
    config.server.bind = "127.0.0.1".to_string();
    config.server.port = 0;
    config.scraper.base_url = deloox_url.to_string();
    config.scraper.request_delay_ms = 0;
    config.scraper.timeout_ms = 2_000;
    config.shopify.shop_url = shopify_url.to_string();
    config.shopify.api_token = "shpat_test".to_string();
    config.shopify.timeout_ms = 2_000;
    config.data.db_url = "sqlite::memory:".to_string();
    config
}
