//! # World Core
//!
//! Shared kernel for the Zenith world server: region identity, the
//! configuration-driven region descriptor, estate policy, and the contract
//! every hosted region instance exposes to the registry runtime.
//!
//! ## Key Types
//!
//! - [`RegionDescriptor`] - durable identity, placement, and addressing for one region
//! - [`RegionHandle`] - packed 64-bit spatial key derived from grid coordinates
//! - [`RegionInstance`] - the collaborator surface the registry drives
//! - [`RestartRequestedEvent`] - restart notifications flowing up to the supervisor
//! - [`ConfigOption`] / [`OptionSource`] - the declarative option table descriptors are built from
//!
//! ## Design Principles
//!
//! - **Type Safety**: dedicated id newtypes keep region and avatar ids apart
//! - **Read-Time Resolution**: external hostnames resolve on every read, never at assignment
//! - **Narrow Seams**: configuration backends implement one small trait and
//!   never see the full option list
//!
//! ## Example
//!
//! ```
//! use world_core::{GridPosition, RegionDescriptor};
//!
//! let descriptor = RegionDescriptor::new(
//!     "Sandbox",
//!     GridPosition::new(1000, 1000),
//!     "0.0.0.0:9000".parse().unwrap(),
//!     "127.0.0.1",
//! );
//! assert!(descriptor.region_handle().is_ok());
//! ```

pub use descriptor::{
    hash_master_password, DescriptorError, RegionDescriptor, RegionDescriptorBuilder,
    SimpleRegionDescriptor,
};
pub use estate::EstateSettings;
pub use events::{restart_channel, RestartRequestedEvent, RESTART_CHANNEL_CAPACITY};
pub use instance::{Avatar, RegionEntity, RegionInstance};
pub use options::{
    region_options, ChainedSource, ConfigOption, OptionKind, OptionSource, OptionValue,
    PromptPolicy, SYSTEM_IP_SENTINEL,
};
pub use types::{AvatarId, GridPosition, RegionHandle, RegionId, REGION_EDGE_METERS};
pub use utils::{current_timestamp, system_ip};

pub mod descriptor;
pub mod estate;
pub mod events;
pub mod instance;
pub mod options;
pub mod types;
pub mod utils;
