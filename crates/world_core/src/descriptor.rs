//! Region descriptors: durable identity, placement, and addressing.
//!
//! A [`RegionDescriptor`] is built once from a configuration source and then
//! treated as read-only by the runtime, with one deliberate exception: the
//! external endpoint is resolved from the configured hostname on every read
//! so DNS changes take effect without a restart. [`SimpleRegionDescriptor`]
//! is the wire-friendly subset exchanged between neighboring regions.

use crate::estate::EstateSettings;
use crate::options::{region_options, OptionSource, OptionValue, PromptPolicy, SYSTEM_IP_SENTINEL};
use crate::types::{AvatarId, GridPosition, RegionHandle, RegionId};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::debug;
use uuid::Uuid;

/// Errors raised while building or querying a region descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// The configured external hostname did not resolve to any address.
    #[error("external hostname {host:?} did not resolve to any address")]
    HostnameUnresolvable { host: String },

    /// Grid coordinates were never assigned, so no spatial handle exists.
    #[error("region grid coordinates have not been assigned")]
    CoordinatesUnassigned,

    /// A configuration source produced a value the option cannot accept.
    #[error("invalid value {value:?} for region option '{key}'")]
    InvalidOptionValue { key: String, value: String },
}

/// Digests a master avatar password for storage.
///
/// The plaintext is hashed, the hex digest is rehashed together with a salt
/// separator, and only the final hex digest is kept. Plaintext passwords
/// never land in a descriptor.
pub fn hash_master_password(password: &str) -> String {
    let inner = sha256_hex(password.as_bytes());
    sha256_hex(format!("{inner}:").as_bytes())
}

fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Full Descriptor
// ============================================================================

/// Everything the runtime knows about one region: identity, grid placement,
/// bind and reachability addressing, master avatar assignment, and lazily
/// attached estate policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionDescriptor {
    /// Stable identity, assigned once at creation.
    pub region_id: RegionId,
    /// Human-facing name used for console focus and restart matching.
    pub region_name: String,
    grid_position: Option<GridPosition>,
    /// Address and port the region binds locally.
    pub internal_endpoint: SocketAddr,
    /// Hostname or IP literal clients reach the region through. Resolved on
    /// every [`RegionDescriptor::external_endpoint`] call, never cached.
    pub external_hostname: String,
    /// Port advertised for inter-region remoting.
    pub remoting_port: u16,
    /// Whether the hosting process may fall back to alternate ports when the
    /// configured internal port is already taken.
    pub allow_alternate_ports: bool,
    /// Address advertised for inter-region remoting.
    pub remoting_address: String,
    /// Master avatar for the region, if one has been assigned.
    pub master_avatar_id: Option<AvatarId>,
    pub master_avatar_first_name: String,
    pub master_avatar_last_name: String,
    /// Digest of the master avatar password; see [`hash_master_password`].
    pub master_avatar_password_hash: String,
    /// Estate covenant document, if any.
    pub covenant_id: Option<Uuid>,
    #[serde(skip)]
    estate: OnceCell<EstateSettings>,
}

impl RegionDescriptor {
    /// Creates a descriptor with a fresh random id and the given placement
    /// and addressing. Master avatar fields start unassigned.
    pub fn new(
        region_name: &str,
        grid_position: GridPosition,
        internal_endpoint: SocketAddr,
        external_hostname: &str,
    ) -> Self {
        Self {
            region_id: RegionId::new(),
            region_name: region_name.to_string(),
            grid_position: Some(grid_position),
            internal_endpoint,
            external_hostname: external_hostname.to_string(),
            remoting_port: 0,
            allow_alternate_ports: false,
            remoting_address: String::new(),
            master_avatar_id: None,
            master_avatar_first_name: String::new(),
            master_avatar_last_name: String::new(),
            master_avatar_password_hash: String::new(),
            covenant_id: None,
            estate: OnceCell::new(),
        }
    }

    /// Grid placement, if coordinates have been assigned.
    pub fn grid_position(&self) -> Option<GridPosition> {
        self.grid_position
    }

    /// Packed spatial key for this region.
    ///
    /// Fails with [`DescriptorError::CoordinatesUnassigned`] when the
    /// descriptor has no grid placement yet.
    pub fn region_handle(&self) -> Result<RegionHandle, DescriptorError> {
        self.grid_position
            .map(RegionHandle::from_grid)
            .ok_or(DescriptorError::CoordinatesUnassigned)
    }

    /// Resolves the externally reachable endpoint for this region.
    ///
    /// An IP literal in `external_hostname` is used directly without a DNS
    /// round trip. Hostnames are resolved fresh on every call, preferring
    /// the first IPv4 address and falling back to the first address of any
    /// family. The port is always the internal endpoint's port.
    pub async fn external_endpoint(&self) -> Result<SocketAddr, DescriptorError> {
        let port = self.internal_endpoint.port();
        if let Ok(ip) = self.external_hostname.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, port));
        }

        debug!("🔎 Resolving external hostname '{}'", self.external_hostname);
        let addrs = tokio::net::lookup_host((self.external_hostname.as_str(), port))
            .await
            .map_err(|_| DescriptorError::HostnameUnresolvable {
                host: self.external_hostname.clone(),
            })?;

        let mut fallback = None;
        for addr in addrs {
            if addr.is_ipv4() {
                return Ok(addr);
            }
            if fallback.is_none() {
                fallback = Some(addr);
            }
        }
        fallback.ok_or_else(|| DescriptorError::HostnameUnresolvable {
            host: self.external_hostname.clone(),
        })
    }

    /// Estate policy for this region, initialized with defaults on first
    /// access and pinned afterwards.
    pub fn estate_settings(&self) -> &EstateSettings {
        self.estate.get_or_init(EstateSettings::default)
    }

    /// Whether a master avatar has been assigned to this region.
    pub fn master_avatar_assigned(&self) -> bool {
        self.master_avatar_id.is_some()
    }
}

// ============================================================================
// Wire Subset
// ============================================================================

/// The subset of a region descriptor exchanged between neighboring regions
/// when one of them comes online.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleRegionDescriptor {
    pub region_id: RegionId,
    pub grid_position: Option<GridPosition>,
    pub internal_endpoint: SocketAddr,
    pub external_hostname: String,
    pub remoting_port: u16,
    pub allow_alternate_ports: bool,
    pub remoting_address: String,
}

impl SimpleRegionDescriptor {
    /// Packed spatial key for this region, if coordinates are assigned.
    pub fn region_handle(&self) -> Result<RegionHandle, DescriptorError> {
        self.grid_position
            .map(RegionHandle::from_grid)
            .ok_or(DescriptorError::CoordinatesUnassigned)
    }
}

impl From<&RegionDescriptor> for SimpleRegionDescriptor {
    fn from(descriptor: &RegionDescriptor) -> Self {
        Self {
            region_id: descriptor.region_id,
            grid_position: descriptor.grid_position,
            internal_endpoint: descriptor.internal_endpoint,
            external_hostname: descriptor.external_hostname.clone(),
            remoting_port: descriptor.remoting_port,
            allow_alternate_ports: descriptor.allow_alternate_ports,
            remoting_address: descriptor.remoting_address.clone(),
        }
    }
}

impl From<SimpleRegionDescriptor> for RegionDescriptor {
    fn from(simple: SimpleRegionDescriptor) -> Self {
        Self {
            region_id: simple.region_id,
            region_name: String::new(),
            grid_position: simple.grid_position,
            internal_endpoint: simple.internal_endpoint,
            external_hostname: simple.external_hostname,
            remoting_port: simple.remoting_port,
            allow_alternate_ports: simple.allow_alternate_ports,
            remoting_address: simple.remoting_address,
            master_avatar_id: None,
            master_avatar_first_name: String::new(),
            master_avatar_last_name: String::new(),
            master_avatar_password_hash: String::new(),
            covenant_id: None,
            estate: OnceCell::new(),
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds a [`RegionDescriptor`] by walking the option table against a
/// configuration source.
///
/// For each option the source is consulted first; when it yields nothing the
/// option's default applies. Resolved values pass through one typed
/// application step keyed by option name, which is also where the SYSTEMIP
/// hostname sentinel and master password digesting happen.
#[derive(Debug)]
pub struct RegionDescriptorBuilder {
    region_id: RegionId,
    region_name: String,
    location_x: Option<u32>,
    location_y: Option<u32>,
    internal_address: IpAddr,
    internal_port: u16,
    allow_alternate_ports: bool,
    external_hostname: String,
    master_avatar_id: Option<AvatarId>,
    master_avatar_first_name: String,
    master_avatar_last_name: String,
    master_avatar_password_hash: String,
    covenant_id: Option<Uuid>,
}

impl RegionDescriptorBuilder {
    pub fn new() -> Self {
        Self {
            region_id: RegionId::new(),
            region_name: String::new(),
            location_x: None,
            location_y: None,
            internal_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            internal_port: 0,
            allow_alternate_ports: false,
            external_hostname: String::new(),
            master_avatar_id: None,
            master_avatar_first_name: String::new(),
            master_avatar_last_name: String::new(),
            master_avatar_password_hash: String::new(),
            covenant_id: None,
        }
    }

    /// Resolves every option in the table through `source` and applies the
    /// results, falling back to documented defaults for anything the source
    /// does not supply.
    pub fn load(mut self, source: &mut dyn OptionSource) -> Result<Self, DescriptorError> {
        for option in region_options() {
            let should_prompt = match option.prompt {
                PromptPolicy::WhenMissing => true,
                PromptPolicy::Never => false,
                PromptPolicy::WhenMasterUnassigned => self.master_avatar_id.is_none(),
            };
            let value = match source.resolve(&option, should_prompt)? {
                Some(value) => value,
                None => (option.default)(),
            };
            self.apply(option.key, value)?;
        }
        Ok(self)
    }

    fn apply(&mut self, key: &str, value: OptionValue) -> Result<(), DescriptorError> {
        match (key, value) {
            ("region_id", OptionValue::Uuid(id)) => self.region_id = RegionId(id),
            ("region_name", OptionValue::String(name)) => self.region_name = name,
            ("location_x", OptionValue::U32(x)) => self.location_x = Some(x),
            ("location_y", OptionValue::U32(y)) => self.location_y = Some(y),
            ("internal_address", OptionValue::IpAddr(address)) => self.internal_address = address,
            ("internal_port", OptionValue::U16(port)) => self.internal_port = port,
            ("allow_alternate_ports", OptionValue::Bool(allow)) => {
                self.allow_alternate_ports = allow
            }
            ("external_hostname", OptionValue::String(hostname)) => {
                self.external_hostname = if hostname == SYSTEM_IP_SENTINEL {
                    crate::utils::system_ip().to_string()
                } else {
                    hostname
                };
            }
            ("master_avatar_id", OptionValue::Uuid(id)) => {
                self.master_avatar_id = (!id.is_nil()).then_some(AvatarId(id));
            }
            ("covenant_id", OptionValue::Uuid(id)) => {
                self.covenant_id = (!id.is_nil()).then_some(id);
            }
            ("master_avatar_first", OptionValue::String(first)) => {
                self.master_avatar_first_name = first
            }
            ("master_avatar_last", OptionValue::String(last)) => {
                self.master_avatar_last_name = last
            }
            ("master_avatar_password", OptionValue::String(password)) => {
                self.master_avatar_password_hash = hash_master_password(&password);
            }
            (key, value) => {
                return Err(DescriptorError::InvalidOptionValue {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn finish(self) -> RegionDescriptor {
        RegionDescriptor {
            region_id: self.region_id,
            region_name: self.region_name,
            grid_position: self
                .location_x
                .zip(self.location_y)
                .map(|(x, y)| GridPosition::new(x, y)),
            internal_endpoint: SocketAddr::new(self.internal_address, self.internal_port),
            external_hostname: self.external_hostname,
            remoting_port: 0,
            allow_alternate_ports: self.allow_alternate_ports,
            remoting_address: String::new(),
            master_avatar_id: self.master_avatar_id,
            master_avatar_first_name: self.master_avatar_first_name,
            master_avatar_last_name: self.master_avatar_last_name,
            master_avatar_password_hash: self.master_avatar_password_hash,
            covenant_id: self.covenant_id,
            estate: OnceCell::new(),
        }
    }
}

impl Default for RegionDescriptorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ConfigOption;
    use crate::utils::system_ip;
    use std::collections::HashMap;

    struct EmptySource;

    impl OptionSource for EmptySource {
        fn resolve(
            &mut self,
            _option: &ConfigOption,
            _should_prompt: bool,
        ) -> Result<Option<OptionValue>, DescriptorError> {
            Ok(None)
        }
    }

    /// Resolves from a fixed map and records the prompt flag per key.
    struct MapSource {
        values: HashMap<&'static str, OptionValue>,
        prompts: Vec<(&'static str, bool)>,
    }

    impl MapSource {
        fn new(values: HashMap<&'static str, OptionValue>) -> Self {
            Self {
                values,
                prompts: Vec::new(),
            }
        }
    }

    impl OptionSource for MapSource {
        fn resolve(
            &mut self,
            option: &ConfigOption,
            should_prompt: bool,
        ) -> Result<Option<OptionValue>, DescriptorError> {
            self.prompts.push((option.key, should_prompt));
            Ok(self.values.get(option.key).cloned())
        }
    }

    fn test_descriptor(name: &str, x: u32, y: u32) -> RegionDescriptor {
        RegionDescriptor::new(
            name,
            GridPosition::new(x, y),
            "127.0.0.1:9000".parse().unwrap(),
            "127.0.0.1",
        )
    }

    #[test]
    fn test_builder_applies_documented_defaults() {
        let mut source = EmptySource;
        let descriptor = RegionDescriptorBuilder::new()
            .load(&mut source)
            .unwrap()
            .finish();

        assert_eq!(descriptor.region_name, "Zenith Test");
        assert_eq!(descriptor.grid_position(), Some(GridPosition::new(1000, 1000)));
        assert_eq!(descriptor.internal_endpoint, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(descriptor.external_hostname, "127.0.0.1");
        assert!(!descriptor.allow_alternate_ports);
        assert!(!descriptor.region_id.0.is_nil());
        assert!(descriptor.master_avatar_id.is_none());
        assert!(descriptor.covenant_id.is_none());
        assert_eq!(descriptor.master_avatar_first_name, "Test");
        assert_eq!(descriptor.master_avatar_last_name, "User");
        assert_eq!(
            descriptor.master_avatar_password_hash,
            hash_master_password("test")
        );
    }

    #[test]
    fn test_master_prompts_skipped_once_assigned() {
        let mut values = HashMap::new();
        values.insert(
            "master_avatar_id",
            OptionValue::Uuid(Uuid::parse_str("6dc9ed4a-0d90-4f9d-9415-7522b70a4d4a").unwrap()),
        );
        let mut source = MapSource::new(values);
        let descriptor = RegionDescriptorBuilder::new()
            .load(&mut source)
            .unwrap()
            .finish();
        assert!(descriptor.master_avatar_assigned());

        let prompts: HashMap<&str, bool> = source.prompts.into_iter().collect();
        assert!(prompts["region_name"]);
        assert!(!prompts["region_id"]);
        assert!(!prompts["master_avatar_first"]);
        assert!(!prompts["master_avatar_last"]);
        assert!(!prompts["master_avatar_password"]);
    }

    #[test]
    fn test_master_prompts_active_while_unassigned() {
        let mut source = MapSource::new(HashMap::new());
        let descriptor = RegionDescriptorBuilder::new()
            .load(&mut source)
            .unwrap()
            .finish();
        assert!(!descriptor.master_avatar_assigned());

        let prompts: HashMap<&str, bool> = source.prompts.into_iter().collect();
        assert!(prompts["master_avatar_first"]);
        assert!(prompts["master_avatar_password"]);
    }

    #[test]
    fn test_systemip_sentinel_substitutes_local_address() {
        let mut values = HashMap::new();
        values.insert(
            "external_hostname",
            OptionValue::String(SYSTEM_IP_SENTINEL.to_string()),
        );
        let mut source = MapSource::new(values);
        let descriptor = RegionDescriptorBuilder::new()
            .load(&mut source)
            .unwrap()
            .finish();

        assert_ne!(descriptor.external_hostname, SYSTEM_IP_SENTINEL);
        assert_eq!(descriptor.external_hostname, system_ip().to_string());
    }

    #[test]
    fn test_password_is_never_stored_plaintext() {
        let mut values = HashMap::new();
        values.insert(
            "master_avatar_password",
            OptionValue::String("hunter2".to_string()),
        );
        let mut source = MapSource::new(values);
        let descriptor = RegionDescriptorBuilder::new()
            .load(&mut source)
            .unwrap()
            .finish();

        let hash = &descriptor.master_avatar_password_hash;
        assert_ne!(hash, "hunter2");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));

        // Double digest with the salt separator, computed independently.
        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"hunter2");
            let inner = format!("{:x}", hasher.finalize());
            let mut hasher = Sha256::new();
            hasher.update(format!("{inner}:").as_bytes());
            format!("{:x}", hasher.finalize())
        };
        assert_eq!(hash, &expected);
        assert_ne!(hash_master_password("hunter2"), hash_master_password("hunter3"));
    }

    #[test]
    fn test_mismatched_option_value_rejected() {
        let mut values = HashMap::new();
        values.insert("region_name", OptionValue::Bool(true));
        let mut source = MapSource::new(values);
        let err = RegionDescriptorBuilder::new().load(&mut source).unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::InvalidOptionValue { ref key, .. } if key == "region_name"
        ));
    }

    #[test]
    fn test_region_handle_requires_coordinates() {
        let descriptor = RegionDescriptorBuilder::new().finish();
        assert!(descriptor.grid_position().is_none());
        assert!(matches!(
            descriptor.region_handle(),
            Err(DescriptorError::CoordinatesUnassigned)
        ));
    }

    #[tokio::test]
    async fn test_external_endpoint_uses_ipv4_literal_directly() {
        let descriptor = RegionDescriptor::new(
            "Literal",
            GridPosition::new(1000, 1000),
            "10.0.0.5:9200".parse().unwrap(),
            "203.0.113.7",
        );
        let endpoint = descriptor.external_endpoint().await.unwrap();
        assert_eq!(endpoint, "203.0.113.7:9200".parse().unwrap());
    }

    #[tokio::test]
    async fn test_external_endpoint_uses_ipv6_literal_directly() {
        let descriptor = RegionDescriptor::new(
            "LiteralV6",
            GridPosition::new(1000, 1000),
            "10.0.0.5:9200".parse().unwrap(),
            "2001:db8::1",
        );
        let endpoint = descriptor.external_endpoint().await.unwrap();
        assert_eq!(endpoint.ip(), "2001:db8::1".parse::<IpAddr>().unwrap());
        assert_eq!(endpoint.port(), 9200);
    }

    #[tokio::test]
    async fn test_external_endpoint_resolves_hostnames() {
        let descriptor = RegionDescriptor::new(
            "Resolved",
            GridPosition::new(1000, 1000),
            "0.0.0.0:9300".parse().unwrap(),
            "localhost",
        );
        let endpoint = descriptor.external_endpoint().await.unwrap();
        assert!(endpoint.ip().is_loopback());
        assert_eq!(endpoint.port(), 9300);
    }

    #[tokio::test]
    async fn test_external_endpoint_unresolvable_hostname_errors() {
        let descriptor = RegionDescriptor::new(
            "Broken",
            GridPosition::new(1000, 1000),
            "0.0.0.0:9300".parse().unwrap(),
            "region.does-not-exist.invalid",
        );
        let err = descriptor.external_endpoint().await.unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::HostnameUnresolvable { ref host } if host == "region.does-not-exist.invalid"
        ));
    }

    #[test]
    fn test_simple_conversion_preserves_identity() {
        let full = test_descriptor("Alpha", 1200, 1300);
        let simple = SimpleRegionDescriptor::from(&full);
        assert_eq!(simple.region_id, full.region_id);
        assert_eq!(simple.grid_position, Some(GridPosition::new(1200, 1300)));
        assert_eq!(simple.internal_endpoint, full.internal_endpoint);
        assert_eq!(simple.external_hostname, full.external_hostname);
        assert_eq!(simple.region_handle().unwrap(), full.region_handle().unwrap());

        let back = RegionDescriptor::from(simple);
        assert_eq!(back.region_id, full.region_id);
        assert_eq!(back.grid_position(), full.grid_position());
        assert_eq!(back.region_handle().unwrap(), full.region_handle().unwrap());
        assert!(back.region_name.is_empty());
        assert!(back.master_avatar_id.is_none());
    }

    #[test]
    fn test_estate_settings_initialize_once() {
        let descriptor = test_descriptor("Estates", 1000, 1000);
        let estate = descriptor.estate_settings();
        assert_eq!(estate.max_agents, 40);
        assert_eq!(estate.water_height, 20.0);

        let again = descriptor.estate_settings();
        assert!(std::ptr::eq(estate, again));
    }
}
