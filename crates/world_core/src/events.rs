//! Lifecycle notifications exchanged between instances, the registry, and
//! the supervising process.

use crate::descriptor::RegionDescriptor;
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Capacity of restart notification channels. Restarts are rare, so a small
/// buffer is plenty; a lagging subscriber only loses notifications it was
/// too slow to observe.
pub const RESTART_CHANNEL_CAPACITY: usize = 16;

/// Raised when a region wants to be restarted.
///
/// Flows in two hops: an instance raises it on its own channel, the registry
/// consumes it, untracks the region, and re-emits one consolidated event on
/// its outward channel for the supervisor to act on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartRequestedEvent {
    /// Descriptor of the region asking to restart. The supervisor relaunches
    /// from exactly this descriptor.
    pub descriptor: RegionDescriptor,
    /// Unix timestamp when the event was created.
    pub timestamp: u64,
}

impl RestartRequestedEvent {
    pub fn new(descriptor: RegionDescriptor) -> Self {
        Self {
            descriptor,
            timestamp: current_timestamp(),
        }
    }
}

/// Creates a restart notification channel with the standard capacity.
pub fn restart_channel() -> (
    broadcast::Sender<RestartRequestedEvent>,
    broadcast::Receiver<RestartRequestedEvent>,
) {
    broadcast::channel(RESTART_CHANNEL_CAPACITY)
}
