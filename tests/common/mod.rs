#![allow(dead_code)]

use gtin_sync_models::Config;
use gtin_sync_testsupport::SyncClient;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server running in-process on an ephemeral port.
pub struct TestApp {
    pub base_url: String,
    pub client: SyncClient,
    handle: JoinHandle<()>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_app(config: Config) -> anyhow::Result<TestApp> {
    let state = gtin_sync::build_state(config).await?;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    let handle = tokio::spawn(async move {
        let _ = gtin_sync_api::serve(listener, state).await;
    });
    Ok(TestApp {
        client: SyncClient::new(base_url.clone()),
        base_url,
        handle,
    })
}
