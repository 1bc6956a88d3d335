//! Error types for registry operations.
//!
//! Lookups that simply find nothing return `Option::None` rather than an
//! error; only genuine rule violations surface here.

use thiserror::Error;
use world_core::RegionId;

/// Errors that can occur while mutating the registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A region with the same id is already tracked.
    #[error("region '{name}' ({id}) is already registered")]
    DuplicateRegion { name: String, id: RegionId },
}
