//! The contract every hosted region instance exposes to the registry.
//!
//! The registry never reaches into a region's internals. It routes commands
//! through [`RegionInstance`] and observes the region through the entity and
//! avatar queries defined here. Implementations live with whoever hosts the
//! region: the server binary's hosted region in production, lightweight
//! mocks in tests.

use crate::descriptor::{RegionDescriptor, SimpleRegionDescriptor};
use crate::events::RestartRequestedEvent;
use crate::types::AvatarId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::broadcast;
use uuid::Uuid;

/// An avatar present in a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    pub id: AvatarId,
    pub first_name: String,
    pub last_name: String,
    /// Child agents are partial presences mirrored from a neighboring
    /// region. Registry-wide avatar listings exclude them.
    pub is_child_agent: bool,
}

impl Avatar {
    /// Creates a root (non-child) avatar with a fresh random id.
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            id: AvatarId::new(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            is_child_agent: false,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Anything tracked inside a region's world state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegionEntity {
    Avatar(Avatar),
    Object { id: Uuid, name: String },
}

/// Surface the registry drives on every tracked region.
///
/// All methods are synchronous; implementations keep their own interior
/// state behind locks or atomics. Instances are shared as
/// `Arc<dyn RegionInstance>` between the registry, its background tasks,
/// and the supervisor.
pub trait RegionInstance: Send + Sync {
    /// The descriptor this instance was launched from.
    fn descriptor(&self) -> &RegionDescriptor;

    /// Subscribes to restart requests raised by this instance.
    fn restart_requests(&self) -> broadcast::Receiver<RestartRequestedEvent>;

    /// Stops the instance. Called when the region is removed from the
    /// registry or the whole registry shuts down.
    fn shutdown(&self);

    /// Begins an immediate restart of the instance.
    fn restart_now(&self);

    /// Persists the instance's world state through its own backup path.
    fn backup(&self);

    /// Runs a terrain command, returning whether it succeeded plus any
    /// output the command produced.
    fn run_terrain_command(&self, args: &[String]) -> (bool, String);

    /// Forwards a generic console command to the instance's script and
    /// plugin layer.
    fn dispatch_command(&self, args: &[String]);

    fn set_permission_bypass(&self, bypass: bool);

    fn set_debug_level(&self, level: i32);

    /// Adjusts the day cycle phase.
    fn set_time_phase(&self, phase: i32);

    /// Forces a full state refresh out to connected clients.
    fn force_client_update(&self);

    /// Handles a structured alert command (targeted or broadcast).
    fn handle_alert(&self, args: &[String]);

    /// Shows a general alert message to everyone in the region.
    fn send_general_alert(&self, message: &str);

    /// Handles a world edit command (object and parcel manipulation).
    fn handle_edit_command(&self, args: &[String]);

    /// Every entity currently tracked by the instance.
    fn entities(&self) -> Vec<RegionEntity>;

    /// Looks up an avatar by id.
    fn avatar(&self, id: AvatarId) -> Option<Avatar>;

    /// Looks up an avatar by full name, case-insensitively.
    fn avatar_by_name(&self, name: &str) -> Option<Avatar>;

    /// Notifies this instance that a neighboring region came online.
    fn region_up(&self, other: SimpleRegionDescriptor);

    /// Saves the instance's world state to `path`. The file format is the
    /// instance's own concern.
    fn save_world(&self, path: &Path) -> Result<(), String>;

    /// Loads world state from `path`, optionally assigning fresh ids to
    /// every restored entity.
    fn load_world(&self, path: &Path, generate_new_ids: bool) -> Result<(), String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_full_name() {
        let avatar = Avatar::new("Maria", "Kim");
        assert_eq!(avatar.full_name(), "Maria Kim");
        assert!(!avatar.is_child_agent);
    }

    #[test]
    fn test_region_entity_serializes() {
        let entity = RegionEntity::Avatar(Avatar::new("Ana", "Lopez"));
        let json = serde_json::to_string(&entity).unwrap();
        let decoded: RegionEntity = serde_json::from_str(&json).unwrap();
        match decoded {
            RegionEntity::Avatar(avatar) => assert_eq!(avatar.full_name(), "Ana Lopez"),
            RegionEntity::Object { .. } => panic!("expected an avatar entity"),
        }
    }
}
