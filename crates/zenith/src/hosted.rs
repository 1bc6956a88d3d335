//! In-process region hosting.
//!
//! [`HostedRegion`] is the server's own [`RegionInstance`]: a lightweight
//! world holder that tracks entities in memory, keeps its tunables in
//! atomics, and raises restart requests over a broadcast channel the
//! registry subscribes to. World state persists as pretty-printed JSON so
//! saved files stay hand-editable.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;
use world_core::{
    restart_channel, Avatar, AvatarId, RegionDescriptor, RegionEntity, RegionInstance,
    RestartRequestedEvent, SimpleRegionDescriptor,
};

/// A region simulated inside the server process.
pub struct HostedRegion {
    descriptor: RegionDescriptor,
    restart_tx: broadcast::Sender<RestartRequestedEvent>,
    permission_bypass: AtomicBool,
    debug_level: AtomicI32,
    time_phase: AtomicI32,
    running: AtomicBool,
    entities: Mutex<Vec<RegionEntity>>,
}

impl HostedRegion {
    /// Brings a region online from its descriptor.
    pub fn new(descriptor: RegionDescriptor) -> Arc<Self> {
        let (restart_tx, _idle_rx) = restart_channel();
        info!(
            "🏝️ Hosting region '{}' ({})",
            descriptor.region_name, descriptor.region_id
        );
        Arc::new(Self {
            descriptor,
            restart_tx,
            permission_bypass: AtomicBool::new(false),
            debug_level: AtomicI32::new(0),
            time_phase: AtomicI32::new(0),
            running: AtomicBool::new(true),
            entities: Mutex::new(Vec::new()),
        })
    }

    fn entities_lock(&self) -> MutexGuard<'_, Vec<RegionEntity>> {
        self.entities
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Raises a restart request toward whoever is supervising this region.
    pub fn request_restart(&self) {
        info!(
            "⏰ Region '{}' requested a restart",
            self.descriptor.region_name
        );
        let event = RestartRequestedEvent::new(self.descriptor.clone());
        if self.restart_tx.send(event).is_err() {
            warn!(
                "⚠️ Restart request from '{}' had no listener",
                self.descriptor.region_name
            );
        }
    }

    /// Places a new root avatar in the region and returns its id.
    pub fn spawn_avatar(&self, first_name: &str, last_name: &str) -> AvatarId {
        let avatar = Avatar::new(first_name, last_name);
        let id = avatar.id;
        self.entities_lock().push(RegionEntity::Avatar(avatar));
        id
    }

    /// Places a named object in the region and returns its id.
    pub fn add_object(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.entities_lock().push(RegionEntity::Object {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn permission_bypass(&self) -> bool {
        self.permission_bypass.load(Ordering::SeqCst)
    }

    pub fn debug_level(&self) -> i32 {
        self.debug_level.load(Ordering::SeqCst)
    }

    pub fn time_phase(&self) -> i32 {
        self.time_phase.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl RegionInstance for HostedRegion {
    fn descriptor(&self) -> &RegionDescriptor {
        &self.descriptor
    }

    fn restart_requests(&self) -> broadcast::Receiver<RestartRequestedEvent> {
        self.restart_tx.subscribe()
    }

    fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("🛑 Region '{}' shut down", self.descriptor.region_name);
        }
    }

    fn restart_now(&self) {
        info!(
            "🔄 Restarting region '{}' now",
            self.descriptor.region_name
        );
        self.request_restart();
    }

    fn backup(&self) {
        let entity_count = self.entities_lock().len();
        info!(
            "💾 Backup for region '{}' captured {} entities",
            self.descriptor.region_name, entity_count
        );
    }

    fn run_terrain_command(&self, args: &[String]) -> (bool, String) {
        if args.is_empty() {
            return (
                false,
                format!("{}: no terrain command given", self.descriptor.region_name),
            );
        }
        let command = args.join(" ");
        info!(
            "🔧 Region '{}' terrain command: {}",
            self.descriptor.region_name, command
        );
        (
            true,
            format!("{}: terrain {} applied", self.descriptor.region_name, command),
        )
    }

    fn dispatch_command(&self, args: &[String]) {
        info!(
            "🔧 Region '{}' command: {}",
            self.descriptor.region_name,
            args.join(" ")
        );
    }

    fn set_permission_bypass(&self, bypass: bool) {
        self.permission_bypass.store(bypass, Ordering::SeqCst);
        info!(
            "🔧 Permission bypass {} for region '{}'",
            if bypass { "enabled" } else { "disabled" },
            self.descriptor.region_name
        );
    }

    fn set_debug_level(&self, level: i32) {
        self.debug_level.store(level, Ordering::SeqCst);
        info!(
            "📦 Region '{}' packet debug level set to {}",
            self.descriptor.region_name, level
        );
    }

    fn set_time_phase(&self, phase: i32) {
        self.time_phase.store(phase, Ordering::SeqCst);
        info!(
            "⏰ Region '{}' time phase set to {}",
            self.descriptor.region_name, phase
        );
    }

    fn force_client_update(&self) {
        info!(
            "📡 Region '{}' forcing a client update",
            self.descriptor.region_name
        );
    }

    fn handle_alert(&self, args: &[String]) {
        info!(
            "📢 Region '{}' alert: {}",
            self.descriptor.region_name,
            args.join(" ")
        );
    }

    fn send_general_alert(&self, message: &str) {
        info!(
            "📢 Region '{}' general alert: {}",
            self.descriptor.region_name, message
        );
    }

    fn handle_edit_command(&self, args: &[String]) {
        info!(
            "🔧 Region '{}' edit command: {}",
            self.descriptor.region_name,
            args.join(" ")
        );
    }

    fn entities(&self) -> Vec<RegionEntity> {
        self.entities_lock().clone()
    }

    fn avatar(&self, id: AvatarId) -> Option<Avatar> {
        self.entities_lock().iter().find_map(|entity| match entity {
            RegionEntity::Avatar(avatar) if avatar.id == id => Some(avatar.clone()),
            _ => None,
        })
    }

    fn avatar_by_name(&self, name: &str) -> Option<Avatar> {
        self.entities_lock().iter().find_map(|entity| match entity {
            RegionEntity::Avatar(avatar) if avatar.full_name().eq_ignore_ascii_case(name) => {
                Some(avatar.clone())
            }
            _ => None,
        })
    }

    fn region_up(&self, other: SimpleRegionDescriptor) {
        info!(
            "🌐 Region '{}' sees neighbor '{}' online",
            self.descriptor.region_name, other.region_id
        );
    }

    fn save_world(&self, path: &Path) -> Result<(), String> {
        let entities = self.entities_lock().clone();
        let json = serde_json::to_string_pretty(&entities).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())?;
        info!(
            "💾 Region '{}' saved {} entities to {}",
            self.descriptor.region_name,
            entities.len(),
            path.display()
        );
        Ok(())
    }

    fn load_world(&self, path: &Path, generate_new_ids: bool) -> Result<(), String> {
        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let mut entities: Vec<RegionEntity> =
            serde_json::from_str(&content).map_err(|e| e.to_string())?;
        if generate_new_ids {
            for entity in &mut entities {
                match entity {
                    RegionEntity::Avatar(avatar) => avatar.id = AvatarId::new(),
                    RegionEntity::Object { id, .. } => *id = Uuid::new_v4(),
                }
            }
        }
        let entity_count = entities.len();
        *self.entities_lock() = entities;
        info!(
            "🌍 Region '{}' loaded {} entities from {}",
            self.descriptor.region_name, entity_count,
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use world_core::GridPosition;

    fn descriptor(name: &str) -> RegionDescriptor {
        RegionDescriptor::new(
            name,
            GridPosition::new(1000, 1000),
            "0.0.0.0:9000".parse().unwrap(),
            "127.0.0.1",
        )
    }

    #[test]
    fn test_restart_request_reaches_subscriber() {
        let region = HostedRegion::new(descriptor("Harbor"));
        let mut restarts = region.restart_requests();

        region.request_restart();

        let event = restarts.try_recv().unwrap();
        assert_eq!(event.descriptor.region_name, "Harbor");
        assert_eq!(event.descriptor.region_id, region.descriptor().region_id);
    }

    #[test]
    fn test_restart_now_raises_a_request() {
        let region = HostedRegion::new(descriptor("Harbor"));
        let mut restarts = region.restart_requests();

        region.restart_now();

        assert!(restarts.try_recv().is_ok());
    }

    #[test]
    fn test_state_commands_update_tunables() {
        let region = HostedRegion::new(descriptor("Harbor"));
        assert!(region.is_running());
        assert!(!region.permission_bypass());

        region.set_permission_bypass(true);
        region.set_debug_level(2);
        region.set_time_phase(6);

        assert!(region.permission_bypass());
        assert_eq!(region.debug_level(), 2);
        assert_eq!(region.time_phase(), 6);

        region.shutdown();
        region.shutdown();
        assert!(!region.is_running());
    }

    #[test]
    fn test_avatar_lookup_by_id_and_name() {
        let region = HostedRegion::new(descriptor("Harbor"));
        let id = region.spawn_avatar("Maria", "Kim");
        region.add_object("lighthouse");

        assert_eq!(region.avatar(id).unwrap().full_name(), "Maria Kim");
        assert_eq!(region.avatar_by_name("mARIA kIM").unwrap().id, id);
        assert!(region.avatar_by_name("Nobody Here").is_none());
        assert_eq!(region.entities().len(), 2);
    }

    #[test]
    fn test_world_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");

        let source = HostedRegion::new(descriptor("Harbor"));
        let avatar_id = source.spawn_avatar("Maria", "Kim");
        let object_id = source.add_object("lighthouse");
        source.save_world(&path).unwrap();

        let same_ids = HostedRegion::new(descriptor("Harbor"));
        same_ids.load_world(&path, false).unwrap();
        assert_eq!(same_ids.avatar(avatar_id).unwrap().full_name(), "Maria Kim");
        let kept_object = same_ids.entities().iter().any(|entity| {
            matches!(entity, RegionEntity::Object { id, .. } if *id == object_id)
        });
        assert!(kept_object);

        let fresh_ids = HostedRegion::new(descriptor("Harbor"));
        fresh_ids.load_world(&path, true).unwrap();
        assert!(fresh_ids.avatar(avatar_id).is_none());
        assert_eq!(fresh_ids.avatar_by_name("Maria Kim").unwrap().full_name(), "Maria Kim");
        assert_eq!(fresh_ids.entities().len(), 2);
    }

    #[test]
    fn test_terrain_command_reports_output() {
        let region = HostedRegion::new(descriptor("Harbor"));

        let (ok, output) = region.run_terrain_command(&["fill".to_string(), "20".to_string()]);
        assert!(ok);
        assert!(output.contains("Harbor"));
        assert!(output.contains("fill 20"));

        let (ok, output) = region.run_terrain_command(&[]);
        assert!(!ok);
        assert!(output.contains("no terrain command"));
    }
}
