//! # Brand Color Engine
//!
//! The engine drives a brand color field extension: it reads the stored field
//! value and instance parameters from the editor host, loads the palette
//! content item, and keeps the selection and the host frame height in sync.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use brand_color_api::DeliveryClientFactory;
//! use brand_color_engine::{Coordinator, MemoryHost, ReadyConnector};
//!
//! # async fn run() {
//! let host = Arc::new(MemoryHost::new(serde_json::json!({ "contentID": "palette-1" })));
//! let coordinator = Coordinator::new(
//!     Arc::new(ReadyConnector::new(host.clone())),
//!     Arc::new(DeliveryClientFactory::default()),
//!     host.clone(),
//! );
//! coordinator.initialize().await;
//! println!("{}", coordinator.state().palette.name);
//! coordinator.shutdown().await;
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`host`**: traits for the editor host (field, parameters, frame)
//! - **`coordinator`**: initialization, reconciliation and selection
//! - **`state`**: the observable state handed to views
//! - **`height`**: frame height polling
//! - **`memory`**: an in-process host for previews and tests

pub mod coordinator;
pub mod height;
pub mod host;
pub mod memory;
pub mod state;

pub use coordinator::{Coordinator, InitializationError, InitializeOutcome, SelectionError};
pub use height::{DEFAULT_FRAME_INTERVAL, HeightMonitor, HeightSyncTask};
pub use host::{BridgeError, HostBridge, HostConnector, ReadyConnector, RenderSurface};
pub use memory::MemoryHost;
pub use state::ExtensionState;
