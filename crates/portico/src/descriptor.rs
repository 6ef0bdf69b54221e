//! Descriptor reading and writing.
//!
//! Every template directory carries a descriptor file named `config`: a
//! sectioned key-value document with an `[info]` section (template metadata)
//! and an optional `[context]` section (runtime substitution values). The
//! sections are expressed as TOML tables.
//!
//! Reading goes through the [`DescriptorReader`] trait so that template
//! entities and the registry can be constructed against a test double; the
//! default implementation is [`TomlDescriptor`].

use crate::error::{Error, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Name of the descriptor file inside each template directory.
pub const DESCRIPTOR_FILE: &str = "config";

/// Section holding template metadata.
pub const INFO_SECTION: &str = "info";

/// Section holding runtime substitution values.
pub const CONTEXT_SECTION: &str = "context";

/// `[info]` key naming the template's payload file, when one exists.
pub const PAYLOAD_PATH_KEY: &str = "payloadpath";

/// `[context]` key naming the payload's serving path, when one exists.
pub const UPDATE_PATH_KEY: &str = "update_path";

/// One descriptor section, mapped key to value.
pub type SectionMap = BTreeMap<String, String>;

/// A full descriptor document as persisted to disk.
///
/// Writing a descriptor replaces the file with a clean rendering of these
/// two sections; comments and key ordering of the previous file are not
/// preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Template metadata (`name`, `description`, optional `payloadpath`).
    #[serde(default)]
    pub info: SectionMap,

    /// Runtime substitution values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: SectionMap,
}

/// Reads and writes template descriptors.
pub trait DescriptorReader: std::fmt::Debug + Send + Sync {
    /// Map one section of the descriptor at `path` to a key-value map.
    ///
    /// A missing file or missing section yields an empty map, never an
    /// error. A descriptor that exists but cannot be parsed is an error.
    fn section_map(&self, path: &Utf8Path, section: &str) -> Result<SectionMap>;

    /// Persist `descriptor` at `path`, replacing any existing file.
    ///
    /// The write must be atomic with respect to the target path: a failure
    /// part-way through must leave the original file intact.
    fn write(&self, path: &Utf8Path, descriptor: &Descriptor) -> Result<()>;
}

/// Default descriptor codec backed by the `toml` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlDescriptor;

impl TomlDescriptor {
    /// Create a new TOML descriptor codec
    pub fn new() -> Self {
        Self
    }
}

impl DescriptorReader for TomlDescriptor {
    fn section_map(&self, path: &Utf8Path, section: &str) -> Result<SectionMap> {
        if !path.is_file() {
            return Ok(SectionMap::new());
        }

        let text = std::fs::read_to_string(path)?;
        let table: toml::Table = text
            .parse()
            .map_err(|err: toml::de::Error| Error::descriptor_parse(path.as_str(), err.to_string()))?;

        let mut map = SectionMap::new();
        if let Some(toml::Value::Table(entries)) = table.get(section) {
            for (key, value) in entries {
                let value = match value {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                map.insert(key.clone(), value);
            }
        }

        Ok(map)
    }

    fn write(&self, path: &Utf8Path, descriptor: &Descriptor) -> Result<()> {
        let text = toml::to_string_pretty(descriptor)?;
        let dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));

        // Write-then-rename: the original descriptor survives any failure
        // before the final rename.
        let mut file = tempfile::NamedTempFile::new_in(dir)
            .map_err(|err| Error::persist(path.as_str(), err))?;
        file.write_all(text.as_bytes())
            .map_err(|err| Error::persist(path.as_str(), err))?;
        file.persist(path)
            .map_err(|err| Error::persist(path.as_str(), err.error))?;

        Ok(())
    }
}
