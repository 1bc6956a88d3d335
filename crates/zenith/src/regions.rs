//! Region descriptor loading for the world server.
//!
//! Each region is described by one TOML file in the configured regions
//! directory. Files are walked through the shared option table, so missing
//! keys fall back to documented defaults, optionally after asking the
//! operator. An empty directory is seeded with a default region so a fresh
//! install always boots something.

use std::io::{self, Write};
use std::path::Path;
use tracing::info;
use uuid::Uuid;
use world_core::{
    ChainedSource, ConfigOption, DescriptorError, OptionKind, OptionSource, OptionValue,
    RegionDescriptor, RegionDescriptorBuilder,
};

/// Option source backed by one parsed region TOML file.
///
/// Native TOML types map directly onto option kinds; strings are accepted
/// for any kind and parsed accordingly. The prompt flag is ignored, files
/// either have a value or they don't.
pub struct TomlOptionSource {
    values: toml::Table,
}

impl std::str::FromStr for TomlOptionSource {
    type Err = toml::de::Error;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            values: content.parse::<toml::Table>()?,
        })
    }
}

impl OptionSource for TomlOptionSource {
    fn resolve(
        &mut self,
        option: &ConfigOption,
        _should_prompt: bool,
    ) -> Result<Option<OptionValue>, DescriptorError> {
        let Some(raw) = self.values.get(option.key) else {
            return Ok(None);
        };
        let invalid = || DescriptorError::InvalidOptionValue {
            key: option.key.to_string(),
            value: raw.to_string(),
        };

        let value = match (option.kind, raw) {
            (OptionKind::Bool, toml::Value::Boolean(flag)) => OptionValue::Bool(*flag),
            (OptionKind::U32, toml::Value::Integer(number)) => {
                OptionValue::U32(u32::try_from(*number).map_err(|_| invalid())?)
            }
            (OptionKind::U16, toml::Value::Integer(number)) => {
                OptionValue::U16(u16::try_from(*number).map_err(|_| invalid())?)
            }
            (_, toml::Value::String(text)) => option.kind.parse(text).map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };
        Ok(Some(value))
    }
}

/// Interactive option source reading from stdin.
///
/// Stays quiet unless the option's prompt policy asks for input. An empty
/// line (or EOF) accepts the default; invalid input is rejected and asked
/// again.
#[derive(Default)]
pub struct PromptSource;

impl PromptSource {
    pub fn new() -> Self {
        Self
    }
}

impl OptionSource for PromptSource {
    fn resolve(
        &mut self,
        option: &ConfigOption,
        should_prompt: bool,
    ) -> Result<Option<OptionValue>, DescriptorError> {
        if !should_prompt {
            return Ok(None);
        }

        let default = (option.default)();
        loop {
            print!("{} [{}]: ", option.description, default);
            let _ = io::stdout().flush();

            let mut line = String::new();
            match io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => return Ok(None),
                Ok(_) => {}
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match option.kind.parse(trimmed) {
                Ok(value) => return Ok(Some(value)),
                Err(reason) => eprintln!("Invalid value: {reason}"),
            }
        }
    }
}

fn default_region_template() -> String {
    format!(
        r#"# Zenith region descriptor.
#
# Options omitted here fall back to their documented defaults. The region id
# is generated once and kept in this file so the region keeps its identity
# across restarts.

region_id = "{}"
region_name = "Zenith Test"
location_x = 1000
location_y = 1000
internal_address = "0.0.0.0"
internal_port = 9000
external_hostname = "127.0.0.1"
"#,
        Uuid::new_v4()
    )
}

/// Loads every region descriptor from `dir`, seeding a default region file
/// when the directory is empty or missing.
///
/// Files load in path order so registry insertion order is stable across
/// restarts. With `non_interactive` set, missing options silently use their
/// defaults instead of prompting.
pub async fn load_region_descriptors(
    dir: &Path,
    non_interactive: bool,
) -> Result<Vec<RegionDescriptor>, Box<dyn std::error::Error>> {
    if !dir.exists() {
        tokio::fs::create_dir_all(dir).await?;
        info!("📁 Created regions directory: {}", dir.display());
    }

    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("toml") {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        let default_path = dir.join("default_region.toml");
        tokio::fs::write(&default_path, default_region_template()).await?;
        info!("📝 Created default region file: {}", default_path.display());
        paths.push(default_path);
    }

    paths.sort();

    let mut descriptors = Vec::new();
    for path in &paths {
        let content = tokio::fs::read_to_string(path).await?;
        let file_source: TomlOptionSource = content.parse()?;

        let descriptor = if non_interactive {
            let mut source = file_source;
            RegionDescriptorBuilder::new().load(&mut source)?.finish()
        } else {
            let mut source = ChainedSource::new(file_source, PromptSource::new());
            RegionDescriptorBuilder::new().load(&mut source)?.finish()
        };

        let placement = descriptor
            .grid_position()
            .map(|position| position.to_string())
            .unwrap_or_else(|| "unplaced".to_string());
        info!(
            "🌍 Loaded region '{}' at {} from {}",
            descriptor.region_name,
            placement,
            path.display()
        );
        descriptors.push(descriptor);
    }

    Ok(descriptors)
}
