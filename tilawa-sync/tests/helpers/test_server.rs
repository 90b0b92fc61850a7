//! In-process API server for integration tests
//!
//! Real engine task over the simulated device, demo library as content.

use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tilawa_common::config::SyncConfig;
use tilawa_common::events::EventBus;
use tilawa_sync::api::{build_router, AppContext};
use tilawa_sync::content::InMemoryContent;
use tilawa_sync::engine::{EngineHandle, SyncEngine};
use tilawa_sync::media::simulated::SimulatedDevice;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub struct TestServer {
    router: Router,
    pub engine: EngineHandle,
}

impl TestServer {
    /// Must run inside a Tokio runtime (spawns the engine and slot drivers)
    pub fn start() -> Self {
        let config = SyncConfig::default();
        let (media_tx, media_rx) = mpsc::unbounded_channel();
        let device = SimulatedDevice::new(config.simulation.clone(), media_tx);
        let engine = SyncEngine::new(&config, device.slot_pair(), EventBus::new(1000));
        let (handle, _task) = engine.spawn(media_rx);

        let ctx = AppContext {
            engine: handle.clone(),
            content: Arc::new(InMemoryContent::demo().unwrap()),
            config: Arc::new(config),
        };

        Self {
            router: build_router(ctx),
            engine: handle,
        }
    }

    /// Send one request; the body is parsed as JSON when non-empty
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Option<Value>) {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };
        (status, json)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Option<Value>) {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Option<Value>) {
        self.request(Method::POST, path, Some(body)).await
    }
}
