//! The page template entity.
//!
//! A [`PageTemplate`] is one validated template directory loaded into
//! memory: descriptor-derived metadata, runtime context, and the list of
//! files staged into its static asset tree during the current session.

use crate::descriptor::{
    Descriptor, DescriptorReader, SectionMap, CONTEXT_SECTION, DESCRIPTOR_FILE, INFO_SECTION,
    PAYLOAD_PATH_KEY, UPDATE_PATH_KEY,
};
use crate::error::{Error, Result};
use crate::{ASSETS_DIR, STATIC_DIR};
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// One page template loaded from a template directory.
#[derive(Debug, Clone)]
pub struct PageTemplate {
    name: String,
    display_name: String,
    description: String,
    payload_path: Option<Utf8PathBuf>,
    config_path: Utf8PathBuf,
    asset_path: Utf8PathBuf,
    static_asset_path: Utf8PathBuf,
    context: SectionMap,
    staged_files: Vec<Utf8PathBuf>,
    reader: Arc<dyn DescriptorReader>,
}

impl PageTemplate {
    /// Load the template named `name` from under `root_dir`.
    ///
    /// Fails with [`Error::MissingDescriptorKey`] if the descriptor's
    /// `[info]` section lacks `name` or `description`. An absent or empty
    /// `payloadpath` marks the template as payload-less rather than failing.
    pub fn new(
        root_dir: &Utf8Path,
        name: &str,
        reader: Arc<dyn DescriptorReader>,
    ) -> Result<Self> {
        let config_path = root_dir.join(name).join(DESCRIPTOR_FILE);
        let info = reader.section_map(&config_path, INFO_SECTION)?;

        let display_name = info
            .get("name")
            .cloned()
            .ok_or_else(|| Error::missing_descriptor_key(name, "name"))?;
        let description = info
            .get("description")
            .cloned()
            .ok_or_else(|| Error::missing_descriptor_key(name, "description"))?;
        let payload_path = payload_from_info(&info);

        let asset_path = root_dir.join(name.to_lowercase()).join(ASSETS_DIR);
        let static_asset_path = asset_path.join(STATIC_DIR);
        let context = reader.section_map(&config_path, CONTEXT_SECTION)?;

        debug!("loaded template '{name}' ({display_name})");

        Ok(Self {
            name: name.to_string(),
            display_name,
            description,
            payload_path,
            config_path,
            asset_path,
            static_asset_path,
            context,
            staged_files: Vec::new(),
            reader,
        })
    }

    /// Directory name, the template's registry id
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable name from the descriptor's `[info]` section
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Description from the descriptor's `[info]` section
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Path of the descriptor file
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }

    /// Path of the HTML asset tree
    pub fn asset_path(&self) -> &Utf8Path {
        &self.asset_path
    }

    /// Destination directory for staged extra files
    pub fn static_asset_path(&self) -> &Utf8Path {
        &self.static_asset_path
    }

    /// The template's payload file path, if one is configured
    pub fn payload_path(&self) -> Option<&Utf8Path> {
        self.payload_path.as_deref()
    }

    /// Whether the template carries a payload
    pub fn has_payload(&self) -> bool {
        self.payload_path.is_some()
    }

    /// Runtime substitution values
    pub fn context(&self) -> &SectionMap {
        &self.context
    }

    /// Files staged into the static asset tree during this session
    pub fn staged_files(&self) -> &[Utf8PathBuf] {
        &self.staged_files
    }

    /// Merge `incoming` into the template's context, in place.
    ///
    /// Keys already present in the template always keep their current
    /// values; only keys new to the template are added. Safe to call with
    /// an empty map.
    pub fn merge_context(&mut self, incoming: SectionMap) {
        for (key, value) in incoming {
            self.context.entry(key).or_insert(value);
        }
    }

    /// Swap the template's payload to a sibling file named `filename`.
    ///
    /// Re-reads the descriptor fresh from disk, rewrites `info.payloadpath`
    /// and `context.update_path` to `dirname(old value)/filename` while
    /// keeping every other key verbatim, persists the result atomically,
    /// and only then refreshes the in-memory payload path and context. The
    /// staged-file list is reset: a payload swap invalidates files staged
    /// for the previous payload.
    ///
    /// A descriptor missing `info.payloadpath` or `context.update_path` is
    /// a hard error and leaves both disk and memory untouched.
    pub fn update_payload_path(&mut self, filename: &str) -> Result<()> {
        let info = self.reader.section_map(&self.config_path, INFO_SECTION)?;
        let context = self.reader.section_map(&self.config_path, CONTEXT_SECTION)?;

        let old_payload = info
            .get(PAYLOAD_PATH_KEY)
            .ok_or_else(|| Error::missing_descriptor_key(self.name.as_str(), PAYLOAD_PATH_KEY))?;
        let old_update = context
            .get(UPDATE_PATH_KEY)
            .ok_or_else(|| Error::missing_descriptor_key(self.name.as_str(), UPDATE_PATH_KEY))?;

        let mut descriptor = Descriptor {
            info: info.clone(),
            context: context.clone(),
        };
        descriptor
            .info
            .insert(PAYLOAD_PATH_KEY.to_string(), sibling_path(old_payload, filename));
        descriptor
            .context
            .insert(UPDATE_PATH_KEY.to_string(), sibling_path(old_update, filename));

        self.reader.write(&self.config_path, &descriptor)?;

        // Persist succeeded; now and only now refresh the entity from disk.
        let info = self.reader.section_map(&self.config_path, INFO_SECTION)?;
        self.payload_path = payload_from_info(&info);
        self.context = self.reader.section_map(&self.config_path, CONTEXT_SECTION)?;
        self.staged_files.clear();

        debug!("template '{}' payload switched to '{filename}'", self.name);

        Ok(())
    }

    /// Stage `source` into the template's static asset tree.
    ///
    /// Copies the file under its base filename, records the destination for
    /// later cleanup, and returns the base filename. An empty path or a
    /// path that is not an existing regular file is a no-op signalled with
    /// `None`, not an error. Copy failures propagate.
    pub fn use_file(&mut self, source: &Utf8Path) -> Result<Option<String>> {
        if source.as_str().is_empty() || !source.is_file() {
            return Ok(None);
        }
        let filename = match source.file_name() {
            Some(filename) => filename.to_string(),
            None => return Ok(None),
        };

        std::fs::create_dir_all(&self.static_asset_path)?;
        let destination = self.static_asset_path.join(&filename);
        std::fs::copy(source, &destination)?;
        self.staged_files.push(destination);

        Ok(Some(filename))
    }

    /// Delete every staged file that still exists.
    ///
    /// Best-effort: a file already gone is not an error, and one file's
    /// delete failure does not stop the rest. The staged list itself is not
    /// cleared; re-invocation is safe because existence is re-checked.
    pub fn remove_extra_files(&self) {
        for path in &self.staged_files {
            if !path.is_file() {
                continue;
            }
            if let Err(err) = std::fs::remove_file(path) {
                warn!("failed to remove staged file {path}: {err}");
            }
        }
    }

    /// Two-line human-readable summary: display name, then description.
    pub fn describe(&self) -> String {
        format!("{}\n\t{}\n", self.display_name, self.description)
    }
}

impl std::fmt::Display for PageTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

fn payload_from_info(info: &SectionMap) -> Option<Utf8PathBuf> {
    info.get(PAYLOAD_PATH_KEY)
        .filter(|value| !value.is_empty())
        .map(Utf8PathBuf::from)
}

/// Replace the filename component of `old`, keeping its directory.
fn sibling_path(old: &str, filename: &str) -> String {
    match Utf8Path::new(old).parent() {
        Some(dir) if !dir.as_str().is_empty() => dir.join(filename).into_string(),
        _ => filename.to_string(),
    }
}
