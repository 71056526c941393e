use clap::{Parser, Subcommand};
use gtin_sync_models::{
    CredentialsOverride, DatasetStage, DatasetView, ErrorShape, ListDatasetsResponse,
    ListUploadsResponse, MessageResponse, ProductStatus, UpdatePriceRequest, UpdateStatusRequest,
    UploadRequest,
};
use reqwest::{Client, Response};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "gtin-sync")]
#[command(about = "CLI tool for GTIN Sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "GTIN_SYNC_ENDPOINT", default_value = "http://localhost:8501")]
    endpoint: String,
}

/// Shop settings that override the server's for one request.
#[derive(clap::Args, Debug, Default)]
struct ShopArgs {
    #[arg(long)]
    shop_url: Option<String>,
    #[arg(long)]
    api_version: Option<String>,
    #[arg(long, env = "GTIN_SYNC_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,
}

impl ShopArgs {
    fn into_override(self) -> Option<CredentialsOverride> {
        if self.shop_url.is_none() && self.api_version.is_none() && self.api_token.is_none() {
            return None;
        }
        Some(CredentialsOverride {
            shop_url: self.shop_url,
            api_version: self.api_version,
            api_token: self.api_token,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Import a product sheet
    Import {
        /// CSV file path
        file: PathBuf,
    },
    /// List imported datasets
    List,
    /// Show a dataset with its preview rows
    Show { id: Uuid },
    /// Look up every GTIN of a dataset
    Scrape {
        id: Uuid,
        /// Wait until the scrape has finished
        #[arg(long)]
        wait: bool,
    },
    /// Create a Shopify product for every scraped row
    Upload {
        id: Uuid,
        #[arg(long)]
        wait: bool,
        #[command(flatten)]
        shop: ShopArgs,
    },
    /// Download the enriched sheet
    Download {
        id: Uuid,
        /// Output path, defaults to the name the server suggests
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Set the price of every variant of a product
    Price {
        product_id: u64,
        price: f64,
        #[command(flatten)]
        shop: ShopArgs,
    },
    /// Take a product off the storefront
    Deactivate {
        product_id: u64,
        #[arg(long, default_value = "draft")]
        status: ProductStatus,
        #[command(flatten)]
        shop: ShopArgs,
    },
    /// Show the upload history
    Uploads {
        #[arg(long)]
        dataset: Option<Uuid>,
        #[arg(long, default_value = "50")]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> CliResult {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = Client::new();
    let endpoint = cli.endpoint.trim_end_matches('/').to_string();

    match cli.command {
        Commands::Import { file } => import(&client, &endpoint, file).await?,
        Commands::List => list(&client, &endpoint).await?,
        Commands::Show { id } => {
            let view = get_dataset(&client, &endpoint, id).await?;
            print_dataset(&view, true);
        }
        Commands::Scrape { id, wait } => {
            let view: DatasetView =
                check(client.post(format!("{endpoint}/api/datasets/{id}/scrape")).send().await?)
                    .await?
                    .json()
                    .await?;
            println!("🔎 Scrape started: {}", view.stage);
            if wait {
                let view = wait_until_idle(&client, &endpoint, id).await?;
                print_dataset(&view, false);
            }
        }
        Commands::Upload { id, wait, shop } => {
            let request = UploadRequest {
                credentials: shop.into_override(),
            };
            let view: DatasetView = check(
                client
                    .post(format!("{endpoint}/api/datasets/{id}/upload"))
                    .json(&request)
                    .send()
                    .await?,
            )
            .await?
            .json()
            .await?;
            println!("🛒 Upload started: {}", view.stage);
            if wait {
                let view = wait_until_idle(&client, &endpoint, id).await?;
                print_dataset(&view, false);
            }
        }
        Commands::Download { id, output } => download(&client, &endpoint, id, output).await?,
        Commands::Price {
            product_id,
            price,
            shop,
        } => {
            let request = UpdatePriceRequest {
                price,
                credentials: shop.into_override(),
            };
            let response = client
                .put(format!("{endpoint}/api/products/{product_id}/price"))
                .json(&request)
                .send()
                .await?;
            let message: MessageResponse = check(response).await?.json().await?;
            println!("✅ {}", message.message);
        }
        Commands::Deactivate {
            product_id,
            status,
            shop,
        } => {
            let request = UpdateStatusRequest {
                status: Some(status),
                credentials: shop.into_override(),
            };
            let response = client
                .put(format!("{endpoint}/api/products/{product_id}/status"))
                .json(&request)
                .send()
                .await?;
            let message: MessageResponse = check(response).await?.json().await?;
            println!("✅ {}", message.message);
        }
        Commands::Uploads { dataset, limit } => uploads(&client, &endpoint, dataset, limit).await?,
    }

    Ok(())
}

/// Turns an error response into its `error_message`.
async fn check(response: Response) -> CliResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await?;
    let message = serde_json::from_str::<ErrorShape>(&error_text)
        .map(|shape| shape.error_message)
        .unwrap_or(error_text);
    error!("Request failed with {}: {}", status, message);
    Err(message.into())
}

async fn import(client: &Client, endpoint: &str, file: PathBuf) -> CliResult {
    info!("Importing {}", file.display());
    let body = std::fs::read(&file)?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let response = client
        .post(format!("{endpoint}/api/datasets"))
        .query(&[("file_name", file_name)])
        .header(reqwest::header::CONTENT_TYPE, "text/csv")
        .body(body)
        .send()
        .await?;
    let view: DatasetView = check(response).await?.json().await?;
    println!("✅ Dataset imported successfully:");
    print_dataset(&view, true);
    Ok(())
}

async fn list(client: &Client, endpoint: &str) -> CliResult {
    let response = client.get(format!("{endpoint}/api/datasets")).send().await?;
    let list: ListDatasetsResponse = check(response).await?.json().await?;
    println!("📋 Datasets:");
    for view in list.datasets {
        println!(
            "   • {} {} - {} rows, {}",
            view.id,
            view.file_name.as_deref().unwrap_or("(unnamed)"),
            view.row_count,
            view.stage
        );
    }
    Ok(())
}

async fn get_dataset(client: &Client, endpoint: &str, id: Uuid) -> CliResult<DatasetView> {
    let response = client
        .get(format!("{endpoint}/api/datasets/{id}"))
        .send()
        .await?;
    Ok(check(response).await?.json().await?)
}

async fn wait_until_idle(client: &Client, endpoint: &str, id: Uuid) -> CliResult<DatasetView> {
    let mut last = String::new();
    loop {
        let view = get_dataset(client, endpoint, id).await?;
        if !view.stage.is_running() {
            return Ok(view);
        }
        let progress = view.stage.to_string();
        if progress != last {
            eprintln!("   {progress}");
            last = progress;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

async fn download(
    client: &Client,
    endpoint: &str,
    id: Uuid,
    output: Option<PathBuf>,
) -> CliResult {
    let response = check(
        client
            .get(format!("{endpoint}/api/datasets/{id}/csv"))
            .send()
            .await?,
    )
    .await?;
    let suggested = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split("filename=").nth(1))
        .map(|name| name.trim_matches('"').to_string())
        .unwrap_or_else(|| "products.csv".to_string());
    let path = output.unwrap_or_else(|| PathBuf::from(suggested));
    let bytes = response.bytes().await?;
    std::fs::write(&path, &bytes)?;
    println!("💾 Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

async fn uploads(
    client: &Client,
    endpoint: &str,
    dataset: Option<Uuid>,
    limit: i64,
) -> CliResult {
    let mut request = client
        .get(format!("{endpoint}/api/uploads"))
        .query(&[("limit", limit.to_string())]);
    if let Some(dataset) = dataset {
        request = request.query(&[("dataset_id", dataset.to_string())]);
    }
    let list: ListUploadsResponse = check(request.send().await?).await?.json().await?;
    println!("📋 Uploads:");
    for record in list.uploads {
        let product = record
            .product_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   • {} {} ({}) product {} - {}{}",
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.gtin,
            record.name,
            product,
            record.status,
            record
                .error
                .map(|e| format!(": {e}"))
                .unwrap_or_default()
        );
    }
    Ok(())
}

fn print_dataset(view: &DatasetView, with_preview: bool) {
    println!("   Id: {}", view.id);
    if let Some(name) = &view.file_name {
        println!("   File: {name}");
    }
    println!("   Rows: {}", view.row_count);
    println!("   Stage: {}", view.stage);
    if view.stage == DatasetStage::Uploaded || view.stage == DatasetStage::Scraped {
        println!("   Columns: {}", view.columns.join(", "));
    }
    if with_preview {
        for row in &view.preview {
            println!("   | {}", row.join(" | "));
        }
    }
    for warning in &view.warnings {
        println!("   ⚠️  {warning}");
    }
}
