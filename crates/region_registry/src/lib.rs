//! # Region Registry
//!
//! Runtime collection of hosted region instances for the Zenith world
//! server. The registry tracks membership, routes operator commands to the
//! focused region or to all of them, consumes restart notifications from
//! individual regions, and re-emits them upward for a supervisor to act on.
//!
//! ## Features
//!
//! - **Focus routing**: commands target one region or all of them through a
//!   single primitive, never ad hoc loops
//! - **Restart hand-off**: a restarting region is untracked and announced
//!   upward exactly once; duplicates are harmless
//! - **Name, id, and handle lookup**: names match case-insensitively, ids
//!   and spatial handles exactly
//! - **Registry-wide presence queries**: find an avatar and its owning
//!   region anywhere in the collection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use region_registry::create_registry;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = create_registry();
//!     let mut restarts = registry.subscribe_restarts();
//!
//!     // Hand instances to `registry.add(...)`, then drive them:
//!     registry.broadcast_alert("the grid is going down in five minutes").await;
//!
//!     if let Ok(event) = restarts.recv().await {
//!         println!("relaunch {}", event.descriptor.region_name);
//!     }
//! }
//! ```

pub use error::RegistryError;
pub use registry::{Focus, RegionRegistry, RegionState};
pub use utils::{create_registry, create_registry_with_capacity};

pub mod error;
pub mod registry;
pub mod utils;
