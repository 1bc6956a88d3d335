//! Central registry for hosted region instances.
//!
//! The registry is the single place the rest of the server goes to find a
//! region, broadcast an operator command, or learn that a region wants to be
//! restarted. It owns no simulation state of its own; every delegated
//! operation flows through the [`RegionInstance`] contract.

use crate::error::RegistryError;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};
use world_core::{
    Avatar, AvatarId, RegionDescriptor, RegionEntity, RegionHandle, RegionId, RegionInstance,
    RestartRequestedEvent, SimpleRegionDescriptor, RESTART_CHANNEL_CAPACITY,
};

/// Which regions operator commands are routed to.
///
/// Focus is either the whole collection or exactly one member; there is no
/// multi-region subset. Removing the focused region resets focus to
/// [`Focus::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Commands apply to every tracked region.
    #[default]
    All,
    /// Commands apply to the single named region.
    Region(RegionId),
}

/// Lifecycle state of a tracked region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    /// Tracked and serviced normally.
    Active,
    /// A restart notification arrived and the entry is about to be handed
    /// off to the supervisor.
    RestartPending,
}

struct RegionEntry {
    instance: Arc<dyn RegionInstance>,
    state: RegionState,
}

/// Entries and focus live under one lock so a focus change and the
/// membership it refers to can never be observed out of sync.
struct RegistryState {
    entries: Vec<RegionEntry>,
    focus: Focus,
}

/// Tracks every hosted region and routes operator commands to them.
///
/// # Architecture
///
/// - Membership and focus share a single `RwLock`; command broadcasts
///   snapshot their targets under a read lock and invoke instance
///   operations only after the lock is released, so a delegated operation
///   can safely call back into the registry.
/// - Each added instance gets a forwarding task that turns the instance's
///   restart notifications into [`RegionRegistry::handle_restart_request`]
///   calls. The task holds only a weak reference and exits when the
///   registry is dropped.
/// - Restart notifications the registry accepts are re-emitted exactly once
///   on the outward channel returned by
///   [`RegionRegistry::subscribe_restarts`], where a supervisor picks them
///   up to relaunch the region.
pub struct RegionRegistry {
    state: RwLock<RegistryState>,
    restart_tx: broadcast::Sender<RestartRequestedEvent>,
    weak_self: Weak<RegionRegistry>,
}

impl RegionRegistry {
    /// Creates an empty registry with the standard restart channel capacity.
    pub fn new() -> Arc<Self> {
        Self::with_capacity(RESTART_CHANNEL_CAPACITY)
    }

    /// Creates an empty registry with a custom outward restart channel
    /// capacity, for supervisors that expect restart bursts.
    pub fn with_capacity(restart_capacity: usize) -> Arc<Self> {
        let (restart_tx, _) = broadcast::channel(restart_capacity);
        Arc::new_cyclic(|weak_self| Self {
            state: RwLock::new(RegistryState {
                entries: Vec::new(),
                focus: Focus::All,
            }),
            restart_tx,
            weak_self: weak_self.clone(),
        })
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Adds a region instance to the registry and starts forwarding its
    /// restart notifications.
    ///
    /// Fails with [`RegistryError::DuplicateRegion`] when an instance with
    /// the same region id is already tracked; the registry is unchanged in
    /// that case.
    pub async fn add(&self, instance: Arc<dyn RegionInstance>) -> Result<(), RegistryError> {
        let id = instance.descriptor().region_id;
        let name = instance.descriptor().region_name.clone();

        // Subscribe before appending so a restart raised immediately after
        // registration cannot slip past the forwarder.
        let restart_rx = instance.restart_requests();

        let total = {
            let mut state = self.state.write().await;
            if state
                .entries
                .iter()
                .any(|entry| entry.instance.descriptor().region_id == id)
            {
                warn!("❌ Rejecting duplicate region '{}' ({})", name, id);
                return Err(RegistryError::DuplicateRegion { name, id });
            }
            state.entries.push(RegionEntry {
                instance: Arc::clone(&instance),
                state: RegionState::Active,
            });
            state.entries.len()
        };

        self.spawn_restart_forwarder(name.clone(), restart_rx);
        info!("🌍 Region '{}' registered ({} total)", name, total);
        Ok(())
    }

    fn spawn_restart_forwarder(
        &self,
        region_name: String,
        mut restart_rx: broadcast::Receiver<RestartRequestedEvent>,
    ) {
        let registry = self.weak_self.clone();
        tokio::spawn(async move {
            loop {
                match restart_rx.recv().await {
                    Ok(event) => {
                        let Some(registry) = registry.upgrade() else {
                            break;
                        };
                        registry.handle_restart_request(event.descriptor).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            "⏰ Restart listener for region '{}' lagged, skipped {} notifications",
                            region_name, skipped
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Removes a region and shuts its instance down.
    ///
    /// Returns `false` when no region with the given id is tracked. Removing
    /// the focused region resets focus to [`Focus::All`].
    pub async fn remove(&self, id: RegionId) -> bool {
        let entry = {
            let mut state = self.state.write().await;
            let Some(index) = state
                .entries
                .iter()
                .position(|entry| entry.instance.descriptor().region_id == id)
            else {
                return false;
            };
            let entry = state.entries.remove(index);
            if state.focus == Focus::Region(id) {
                state.focus = Focus::All;
            }
            entry
        };

        entry.instance.shutdown();
        info!(
            "❌ Region '{}' removed from registry",
            entry.instance.descriptor().region_name
        );
        true
    }

    /// Shuts down and removes every tracked region, resetting focus.
    pub async fn close_all(&self) {
        let drained: Vec<RegionEntry> = {
            let mut state = self.state.write().await;
            state.focus = Focus::All;
            state.entries.drain(..).collect()
        };

        for entry in &drained {
            entry.instance.shutdown();
        }
        info!("🛑 Closed {} regions", drained.len());
    }

    // ========================================================================
    // Focus and Lookup
    // ========================================================================

    /// Points subsequent commands at one region by name, case-insensitively.
    ///
    /// The reserved names `root` and `..` clear focus back to all regions
    /// and always succeed. Returns `false` when no region matches, leaving
    /// the previous focus untouched.
    pub async fn set_focus(&self, name: &str) -> bool {
        let mut state = self.state.write().await;
        if name == "root" || name == ".." {
            state.focus = Focus::All;
            return true;
        }

        debug!("🔍 Searching for region '{}'", name);
        let found = state.entries.iter().find_map(|entry| {
            let descriptor = entry.instance.descriptor();
            descriptor
                .region_name
                .eq_ignore_ascii_case(name)
                .then_some(descriptor.region_id)
        });
        match found {
            Some(id) => {
                state.focus = Focus::Region(id);
                true
            }
            None => false,
        }
    }

    /// Finds a region by name, case-insensitively.
    pub async fn lookup_by_name(&self, name: &str) -> Option<Arc<dyn RegionInstance>> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .find(|entry| entry.instance.descriptor().region_name.eq_ignore_ascii_case(name))
            .map(|entry| Arc::clone(&entry.instance))
    }

    /// Finds a region by exact id.
    pub async fn lookup_by_id(&self, id: RegionId) -> Option<Arc<dyn RegionInstance>> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .find(|entry| entry.instance.descriptor().region_id == id)
            .map(|entry| Arc::clone(&entry.instance))
    }

    /// Finds a region's descriptor by its packed spatial handle. Regions
    /// without assigned coordinates never match.
    pub async fn lookup_by_handle(&self, handle: RegionHandle) -> Option<RegionDescriptor> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .find(|entry| {
                entry
                    .instance
                    .descriptor()
                    .region_handle()
                    .is_ok_and(|h| h == handle)
            })
            .map(|entry| entry.instance.descriptor().clone())
    }

    // ========================================================================
    // Command Routing
    // ========================================================================

    /// Applies `op` to every region the current focus selects, in insertion
    /// order.
    ///
    /// Targets are snapshotted under the read lock and `op` runs after the
    /// lock is released, so the operation may call back into the registry
    /// without deadlocking. Regions added or removed mid-broadcast are
    /// unaffected; the snapshot wins.
    pub async fn for_each_target<F>(&self, mut op: F)
    where
        F: FnMut(&Arc<dyn RegionInstance>),
    {
        for instance in self.targets().await {
            op(&instance);
        }
    }

    async fn targets(&self) -> Vec<Arc<dyn RegionInstance>> {
        let state = self.state.read().await;
        match state.focus {
            Focus::All => state
                .entries
                .iter()
                .map(|entry| Arc::clone(&entry.instance))
                .collect(),
            Focus::Region(id) => state
                .entries
                .iter()
                .filter(|entry| entry.instance.descriptor().region_id == id)
                .map(|entry| Arc::clone(&entry.instance))
                .collect(),
        }
    }

    async fn all_instances(&self) -> Vec<Arc<dyn RegionInstance>> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .map(|entry| Arc::clone(&entry.instance))
            .collect()
    }

    /// Forwards a console command to the script layer of each target region.
    pub async fn dispatch_command(&self, args: &[String]) {
        self.for_each_target(|region| region.dispatch_command(args)).await;
    }

    /// Toggles permission bypass on each target region.
    pub async fn set_permission_bypass(&self, bypass: bool) {
        self.for_each_target(|region| region.set_permission_bypass(bypass))
            .await;
    }

    /// Triggers a backup on each target region.
    pub async fn backup_targets(&self) {
        self.for_each_target(|region| region.backup()).await;
    }

    /// Asks each target region to restart immediately.
    pub async fn restart_targets(&self) {
        self.for_each_target(|region| region.restart_now()).await;
    }

    /// Forces a full client state refresh on each target region.
    pub async fn force_client_update(&self) {
        self.for_each_target(|region| region.force_client_update()).await;
    }

    /// Sets the packet debug level on each target region, logging every
    /// root avatar the change applies to.
    pub async fn set_debug_level(&self, level: i32) {
        self.for_each_target(|region| {
            for entity in region.entities() {
                if let RegionEntity::Avatar(avatar) = entity {
                    if !avatar.is_child_agent {
                        info!("📦 Packet debug for {} set to {}", avatar.full_name(), level);
                    }
                }
            }
            region.set_debug_level(level);
        })
        .await;
    }

    /// Adjusts the day cycle phase on each target region.
    pub async fn set_time_phase(&self, phase: i32) {
        self.for_each_target(|region| region.set_time_phase(phase)).await;
    }

    /// Forwards a world edit command to each target region.
    pub async fn handle_edit_command(&self, args: &[String]) {
        self.for_each_target(|region| region.handle_edit_command(args))
            .await;
    }

    /// Forwards a structured alert command to each target region.
    pub async fn handle_alert(&self, args: &[String]) {
        self.for_each_target(|region| region.handle_alert(args)).await;
    }

    /// Shows a general alert message in each target region.
    pub async fn broadcast_alert(&self, message: &str) {
        self.for_each_target(|region| region.send_general_alert(message))
            .await;
    }

    /// Runs a terrain command on each target region, aggregating the
    /// result: success only when every target succeeded, with per-region
    /// output joined line by line.
    pub async fn run_terrain_command(&self, args: &[String]) -> (bool, String) {
        let mut success = true;
        let mut output = String::new();
        self.for_each_target(|region| {
            let (ok, message) = region.run_terrain_command(args);
            if !ok {
                success = false;
            }
            if !message.is_empty() {
                if !output.is_empty() {
                    output.push('\n');
                }
                output.push_str(&message);
            }
        })
        .await;
        (success, output)
    }

    // ========================================================================
    // Restart Flow
    // ========================================================================

    /// Consumes a restart notification for the named region.
    ///
    /// The first matching entry is marked restart-pending, untracked (fixing
    /// up focus if it pointed there), and re-emitted exactly once on the
    /// outward restart channel. A notification for a region that is no
    /// longer tracked is a silent no-op, so duplicate or late notifications
    /// are harmless. The instance is not shut down here; restarting is its
    /// own affair.
    pub async fn handle_restart_request(&self, descriptor: RegionDescriptor) {
        warn!(
            "🔄 Restart requested for region '{}', handing off to supervisor",
            descriptor.region_name
        );

        let removed = {
            let mut state = self.state.write().await;
            match state
                .entries
                .iter()
                .position(|entry| entry.instance.descriptor().region_name == descriptor.region_name)
            {
                Some(index) => {
                    state.entries[index].state = RegionState::RestartPending;
                    let entry = state.entries.remove(index);
                    let id = entry.instance.descriptor().region_id;
                    if state.focus == Focus::Region(id) {
                        state.focus = Focus::All;
                    }
                    true
                }
                None => false,
            }
        };

        if !removed {
            debug!(
                "🔄 Restart notification for '{}' matched no tracked region, ignoring",
                descriptor.region_name
            );
            return;
        }

        if self.restart_tx.send(RestartRequestedEvent::new(descriptor)).is_err() {
            warn!("⚠️ Restart notification dropped: no supervisor is subscribed");
        }
    }

    /// Subscribes to the consolidated restart notifications the registry
    /// re-emits after untracking a region.
    pub fn subscribe_restarts(&self) -> broadcast::Receiver<RestartRequestedEvent> {
        self.restart_tx.subscribe()
    }

    // ========================================================================
    // Presence and Neighbors
    // ========================================================================

    /// Announces that the region with the given handle is online, delivering
    /// its wire descriptor to every other tracked region.
    pub async fn announce_online(&self, handle: RegionHandle) {
        let Some(descriptor) = self.lookup_by_handle(handle).await else {
            error!(
                "🌐 Unable to announce region online: no tracked region with handle {}",
                handle
            );
            return;
        };

        let simple = SimpleRegionDescriptor::from(&descriptor);
        let mut notified = 0usize;
        for instance in self.all_instances().await {
            let is_self = instance
                .descriptor()
                .region_handle()
                .is_ok_and(|h| h == handle);
            if !is_self {
                instance.region_up(simple.clone());
                notified += 1;
            }
        }
        info!(
            "🌐 Region '{}' announced online to {} neighbors",
            descriptor.region_name, notified
        );
    }

    /// Finds an avatar anywhere in the registry, returning the owning
    /// region and the avatar. Scans in insertion order; the first region
    /// claiming the id wins.
    pub async fn find_avatar(&self, id: AvatarId) -> Option<(Arc<dyn RegionInstance>, Avatar)> {
        for instance in self.all_instances().await {
            if let Some(avatar) = instance.avatar(id) {
                return Some((instance, avatar));
            }
        }
        None
    }

    /// Finds an avatar anywhere in the registry by full name.
    pub async fn find_avatar_by_name(&self, name: &str) -> Option<Avatar> {
        for instance in self.all_instances().await {
            if let Some(avatar) = instance.avatar_by_name(name) {
                return Some(avatar);
            }
        }
        None
    }

    /// Finds the region currently hosting the given avatar.
    pub async fn find_owning_region(&self, id: AvatarId) -> Option<Arc<dyn RegionInstance>> {
        self.find_avatar(id).await.map(|(instance, _)| instance)
    }

    /// Collects every root avatar in the focused regions, in insertion
    /// order. Child agents are excluded.
    pub async fn avatars(&self) -> Vec<Avatar> {
        let mut avatars = Vec::new();
        self.for_each_target(|region| {
            for entity in region.entities() {
                if let RegionEntity::Avatar(avatar) = entity {
                    if !avatar.is_child_agent {
                        avatars.push(avatar);
                    }
                }
            }
        })
        .await;
        avatars
    }

    // ========================================================================
    // World Persistence
    // ========================================================================

    /// The focused region, or the first tracked region when focus is on the
    /// whole collection. `None` when the registry is empty.
    pub async fn focused_or_first(&self) -> Option<Arc<dyn RegionInstance>> {
        let state = self.state.read().await;
        match state.focus {
            Focus::Region(id) => state
                .entries
                .iter()
                .find(|entry| entry.instance.descriptor().region_id == id)
                .map(|entry| Arc::clone(&entry.instance)),
            Focus::All => state
                .entries
                .first()
                .map(|entry| Arc::clone(&entry.instance)),
        }
    }

    /// Saves world state through the focused-or-first region.
    pub async fn save_world(&self, path: &std::path::Path) -> Result<(), String> {
        match self.focused_or_first().await {
            Some(instance) => instance.save_world(path),
            None => Err("no regions are currently tracked".to_string()),
        }
    }

    /// Loads world state through the focused-or-first region.
    pub async fn load_world(
        &self,
        path: &std::path::Path,
        generate_new_ids: bool,
    ) -> Result<(), String> {
        match self.focused_or_first().await {
            Some(instance) => instance.load_world(path, generate_new_ids),
            None => Err("no regions are currently tracked".to_string()),
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of tracked regions.
    pub async fn region_count(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Names of all tracked regions, in insertion order.
    pub async fn region_names(&self) -> Vec<String> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .map(|entry| entry.instance.descriptor().region_name.clone())
            .collect()
    }

    /// The current command focus.
    pub async fn focused(&self) -> Focus {
        self.state.read().await.focus
    }

    /// Lifecycle state of one tracked region, or `None` when untracked.
    pub async fn region_state(&self, id: RegionId) -> Option<RegionState> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .find(|entry| entry.instance.descriptor().region_id == id)
            .map(|entry| entry.state)
    }
}
