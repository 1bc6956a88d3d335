//! Utility functions for creating and configuring region registries.

use crate::registry::RegionRegistry;
use std::sync::Arc;

/// Creates a region registry with default settings.
///
/// # Examples
///
/// ```
/// use region_registry::create_registry;
///
/// #[tokio::main]
/// async fn main() {
///     let registry = create_registry();
///     assert_eq!(registry.region_count().await, 0);
/// }
/// ```
pub fn create_registry() -> Arc<RegionRegistry> {
    RegionRegistry::new()
}

/// Creates a region registry with a custom outward restart channel
/// capacity.
///
/// Useful for supervisors that expect bursts of simultaneous restarts and
/// do not want slow consumers to miss notifications.
pub fn create_registry_with_capacity(restart_capacity: usize) -> Arc<RegionRegistry> {
    RegionRegistry::with_capacity(restart_capacity)
}
