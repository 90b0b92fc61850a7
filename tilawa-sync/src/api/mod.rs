//! HTTP API
//!
//! Thin axum layer over [`EngineHandle`](crate::engine::EngineHandle) and
//! the content provider. Handlers never touch transport or scroll state
//! directly; they send commands and read snapshots.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{build_router, run, AppContext};
