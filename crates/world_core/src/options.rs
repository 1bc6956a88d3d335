//! Declarative configuration option table for region descriptors.
//!
//! Every setting a region descriptor is built from is described by one
//! [`ConfigOption`] entry: its key, value kind, human-readable description,
//! default, and prompting policy. Configuration backends implement the
//! narrow [`OptionSource`] trait and never need to know the full option
//! list; the descriptor builder walks [`region_options`] and applies each
//! resolved value through a single typed step.

use crate::descriptor::DescriptorError;
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

/// Hostname sentinel that resolves to the machine's own outbound address at
/// load time instead of being stored verbatim.
pub const SYSTEM_IP_SENTINEL: &str = "SYSTEMIP";

/// Value kind an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Uuid,
    String,
    /// A string that must contain at least one non-whitespace character.
    StringNotEmpty,
    U32,
    U16,
    Bool,
    IpAddr,
}

impl OptionKind {
    /// Parses a raw string into a typed value of this kind.
    pub fn parse(&self, raw: &str) -> Result<OptionValue, String> {
        match self {
            OptionKind::Uuid => raw
                .parse::<Uuid>()
                .map(OptionValue::Uuid)
                .map_err(|e| e.to_string()),
            OptionKind::String => Ok(OptionValue::String(raw.to_string())),
            OptionKind::StringNotEmpty => {
                if raw.trim().is_empty() {
                    Err("value must not be empty".to_string())
                } else {
                    Ok(OptionValue::String(raw.to_string()))
                }
            }
            OptionKind::U32 => raw
                .parse::<u32>()
                .map(OptionValue::U32)
                .map_err(|e| e.to_string()),
            OptionKind::U16 => raw
                .parse::<u16>()
                .map(OptionValue::U16)
                .map_err(|e| e.to_string()),
            OptionKind::Bool => raw
                .parse::<bool>()
                .map(OptionValue::Bool)
                .map_err(|e| e.to_string()),
            OptionKind::IpAddr => raw
                .parse::<IpAddr>()
                .map(OptionValue::IpAddr)
                .map_err(|e| e.to_string()),
        }
    }
}

/// A typed value resolved for one option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Uuid(Uuid),
    String(String),
    U32(u32),
    U16(u16),
    Bool(bool),
    IpAddr(IpAddr),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Uuid(value) => write!(f, "{value}"),
            OptionValue::String(value) => write!(f, "{value}"),
            OptionValue::U32(value) => write!(f, "{value}"),
            OptionValue::U16(value) => write!(f, "{value}"),
            OptionValue::Bool(value) => write!(f, "{value}"),
            OptionValue::IpAddr(value) => write!(f, "{value}"),
        }
    }
}

/// When an interactive source should ask the operator for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPolicy {
    /// Ask whenever the backing store has no value for the key.
    WhenMissing,
    /// Never ask; silently fall back to the default.
    Never,
    /// Ask only while no master avatar has been assigned yet. Once the
    /// master avatar id is settled these options stop being prompted on
    /// reload.
    WhenMasterUnassigned,
}

/// One entry in the region option table.
#[derive(Debug, Clone)]
pub struct ConfigOption {
    /// Key the option is stored under in configuration sources.
    pub key: &'static str,
    pub kind: OptionKind,
    /// Description shown when prompting interactively.
    pub description: &'static str,
    /// Produces the fallback value. A function rather than a constant so
    /// defaults like a fresh random region id stay fresh per use.
    pub default: fn() -> OptionValue,
    pub prompt: PromptPolicy,
}

/// Backend that can resolve option values: a parsed file, an interactive
/// console, or a combination of both.
///
/// Returning `Ok(None)` means the source has nothing for this key and the
/// option's default applies. `should_prompt` is advisory: file-backed
/// sources ignore it, interactive ones stay silent when it is false.
pub trait OptionSource {
    fn resolve(
        &mut self,
        option: &ConfigOption,
        should_prompt: bool,
    ) -> Result<Option<OptionValue>, DescriptorError>;
}

/// Tries `primary` first, consulting `secondary` only for keys the primary
/// source has no value for.
pub struct ChainedSource<A, B> {
    primary: A,
    secondary: B,
}

impl<A, B> ChainedSource<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: OptionSource, B: OptionSource> OptionSource for ChainedSource<A, B> {
    fn resolve(
        &mut self,
        option: &ConfigOption,
        should_prompt: bool,
    ) -> Result<Option<OptionValue>, DescriptorError> {
        if let Some(value) = self.primary.resolve(option, should_prompt)? {
            return Ok(Some(value));
        }
        self.secondary.resolve(option, should_prompt)
    }
}

/// The full region option table, in resolution order.
///
/// Order matters: the master avatar id is resolved before the master name
/// and password entries so their [`PromptPolicy::WhenMasterUnassigned`]
/// check observes the freshly applied id.
pub fn region_options() -> Vec<ConfigOption> {
    vec![
        ConfigOption {
            key: "region_id",
            kind: OptionKind::Uuid,
            description: "UUID of the region (a random UUID is recommended)",
            default: || OptionValue::Uuid(Uuid::new_v4()),
            prompt: PromptPolicy::Never,
        },
        ConfigOption {
            key: "region_name",
            kind: OptionKind::StringNotEmpty,
            description: "Region name",
            default: || OptionValue::String("Zenith Test".to_string()),
            prompt: PromptPolicy::WhenMissing,
        },
        ConfigOption {
            key: "location_x",
            kind: OptionKind::U32,
            description: "Grid location (X axis)",
            default: || OptionValue::U32(1000),
            prompt: PromptPolicy::WhenMissing,
        },
        ConfigOption {
            key: "location_y",
            kind: OptionKind::U32,
            description: "Grid location (Y axis)",
            default: || OptionValue::U32(1000),
            prompt: PromptPolicy::WhenMissing,
        },
        ConfigOption {
            key: "internal_address",
            kind: OptionKind::IpAddr,
            description: "Internal IP address to bind for region traffic",
            default: || OptionValue::IpAddr(IpAddr::from([0, 0, 0, 0])),
            prompt: PromptPolicy::WhenMissing,
        },
        ConfigOption {
            key: "internal_port",
            kind: OptionKind::U16,
            description: "Internal port for region traffic",
            default: || OptionValue::U16(9000),
            prompt: PromptPolicy::WhenMissing,
        },
        ConfigOption {
            key: "allow_alternate_ports",
            kind: OptionKind::Bool,
            description: "Allow falling back to alternate ports when the configured port is taken",
            default: || OptionValue::Bool(false),
            prompt: PromptPolicy::Never,
        },
        ConfigOption {
            key: "external_hostname",
            kind: OptionKind::StringNotEmpty,
            description: "External host name (SYSTEMIP substitutes the local address)",
            default: || OptionValue::String("127.0.0.1".to_string()),
            prompt: PromptPolicy::WhenMissing,
        },
        ConfigOption {
            key: "master_avatar_id",
            kind: OptionKind::Uuid,
            description: "UUID of the master avatar (zero when unassigned)",
            default: || OptionValue::Uuid(Uuid::nil()),
            prompt: PromptPolicy::Never,
        },
        ConfigOption {
            key: "covenant_id",
            kind: OptionKind::Uuid,
            description: "UUID of the estate covenant document (zero for none)",
            default: || OptionValue::Uuid(Uuid::nil()),
            prompt: PromptPolicy::Never,
        },
        ConfigOption {
            key: "master_avatar_first",
            kind: OptionKind::StringNotEmpty,
            description: "First name of the master avatar",
            default: || OptionValue::String("Test".to_string()),
            prompt: PromptPolicy::WhenMasterUnassigned,
        },
        ConfigOption {
            key: "master_avatar_last",
            kind: OptionKind::StringNotEmpty,
            description: "Last name of the master avatar",
            default: || OptionValue::String("User".to_string()),
            prompt: PromptPolicy::WhenMasterUnassigned,
        },
        ConfigOption {
            key: "master_avatar_password",
            kind: OptionKind::String,
            description: "Password of the master avatar account",
            default: || OptionValue::String("test".to_string()),
            prompt: PromptPolicy::WhenMasterUnassigned,
        },
    ]
}
