//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ipconf::config::{ServiceConfig, StoreConfig};
use ipconf::lifecycle::Shutdown;
use ipconf::{ConfigDocument, ConfigStore, HttpServer};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Store settings tuned for fast tests.
pub fn store_settings(root: &Path) -> StoreConfig {
    StoreConfig {
        content_root: root.to_path_buf(),
        reload_delay_ms: 50,
        settle_delay_ms: 200,
        retry_base_delay_ms: 20,
        retry_max_delay_ms: 100,
        ..StoreConfig::default()
    }
}

pub async fn open_store(root: &TempDir) -> ConfigStore {
    ConfigStore::open(&store_settings(root.path())).await.unwrap()
}

/// Poll `check` until it returns true or `deadline` passes.
pub async fn eventually<F, Fut>(deadline: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    loop {
        if check().await {
            return true;
        }
        if start.elapsed() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// Wait until the store serves `expected`.
pub async fn wait_for_document(store: &ConfigStore, expected: &ConfigDocument) -> bool {
    eventually(Duration::from_secs(10), move || async move { store.get() == *expected }).await
}

/// A running service bound to an ephemeral port.
pub struct TestService {
    pub addr: SocketAddr,
    pub store: Arc<ConfigStore>,
    pub shutdown: Shutdown,
    pub root: TempDir,
}

impl TestService {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(customize: impl FnOnce(&mut ServiceConfig)) -> Self {
        let root = TempDir::new().unwrap();
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "127.0.0.1:0".into();
        config.store = store_settings(root.path());
        customize(&mut config);

        let store = Arc::new(ConfigStore::open(&config.store).await.unwrap());
        let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server = HttpServer::new(&config, Arc::clone(&store));
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        Self {
            addr,
            store,
            shutdown,
            root,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.store.close().await;
    }
}
