//! Template discovery and registry.
//!
//! The registry scans a root directory once at construction, keeps one
//! [`PageTemplate`] per directory name, and orchestrates end-of-session
//! cleanup across all of them. Directory names are the registry keys, so a
//! template can never be registered twice.
//!
//! Discovery runs in two passes: the initial listing, then a user-template
//! pass that re-lists the root and picks up anything the first pass missed.
//! The second pass is also what backs [`TemplateRegistry::register`], so
//! templates added programmatically between passes behave consistently.
//!
//! The registry is single-threaded; a host sharing one instance across
//! threads should wrap it in a single coarse `Mutex`, since discovery and
//! the entities' mutable state offer no finer partitioning.

use crate::descriptor::{DescriptorReader, TomlDescriptor};
use crate::error::{Error, Result};
use crate::template::PageTemplate;
use crate::validator::validate;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Registry of page templates discovered under one root directory.
#[derive(Debug)]
pub struct TemplateRegistry {
    root_dir: Utf8PathBuf,
    reader: Arc<dyn DescriptorReader>,
    templates: HashMap<String, PageTemplate>,
}

impl TemplateRegistry {
    /// Open the registry over `root_dir` with the default descriptor codec.
    pub fn open(root_dir: impl Into<Utf8PathBuf>) -> Result<Self> {
        Self::open_with_reader(root_dir, Arc::new(TomlDescriptor::new()))
    }

    /// Open the registry over `root_dir` with an injected descriptor reader.
    ///
    /// Lists the root, loads every directory entry that passes validation,
    /// then runs the user-template pass to pick up anything the initial
    /// listing missed. Construction failures propagate: a directory the
    /// validator accepted must be loadable, so a failure here signals an
    /// inconsistency rather than a normal-path error.
    pub fn open_with_reader(
        root_dir: impl Into<Utf8PathBuf>,
        reader: Arc<dyn DescriptorReader>,
    ) -> Result<Self> {
        let mut registry = Self {
            root_dir: root_dir.into(),
            reader,
            templates: HashMap::new(),
        };

        for entry in registry.root_dir.read_dir_utf8()? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            if validate(&registry.root_dir, name).is_ok() {
                let template = PageTemplate::new(
                    &registry.root_dir,
                    name,
                    Arc::clone(&registry.reader),
                )?;
                registry.templates.insert(name.to_string(), template);
            }
        }

        registry.add_user_templates()?;

        debug!(
            "registry opened over {} with {} template(s)",
            registry.root_dir,
            registry.templates.len()
        );

        Ok(registry)
    }

    /// Root directory the registry scans
    pub fn root(&self) -> &Utf8Path {
        &self.root_dir
    }

    /// Look up a template by directory name
    pub fn get(&self, name: &str) -> Option<&PageTemplate> {
        self.templates.get(name)
    }

    /// Look up a template by directory name, mutably
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PageTemplate> {
        self.templates.get_mut(name)
    }

    /// Whether a template with this directory name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Registered directory names, in no particular order
    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// Iterate over the registered templates, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &PageTemplate> {
        self.templates.values()
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry holds no templates
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Re-list the root and return valid template directories not yet
    /// registered, in listing order.
    ///
    /// Invalid candidates are reported through the diagnostic channel (one
    /// warning naming the directory and the failure reason) and skipped;
    /// they never abort the scan.
    pub fn find_user_templates(&self) -> Result<Vec<String>> {
        let mut found = Vec::new();

        for entry in self.root_dir.read_dir_utf8()? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            if self.templates.contains_key(name) {
                continue;
            }
            match validate(&self.root_dir, name) {
                Ok(()) => found.push(name.to_string()),
                Err(reason) => warn!("skipping template directory '{name}': {reason}"),
            }
        }

        Ok(found)
    }

    /// Load and register every template found by [`find_user_templates`].
    ///
    /// Construction failures propagate; validation already accepted these
    /// directories, so a template that fails to load here is an internal
    /// inconsistency, not something to drop silently.
    ///
    /// [`find_user_templates`]: TemplateRegistry::find_user_templates
    pub fn add_user_templates(&mut self) -> Result<()> {
        for name in self.find_user_templates()? {
            let template =
                PageTemplate::new(&self.root_dir, &name, Arc::clone(&self.reader))?;
            self.templates.insert(name, template);
        }
        Ok(())
    }

    /// Validate and register a single directory by name.
    ///
    /// Unlike discovery, the validation failure is surfaced to the caller
    /// as [`Error::InvalidTemplate`] since the directory was requested
    /// explicitly. Registering an already-known name reloads it.
    pub fn register(&mut self, name: &str) -> Result<&PageTemplate> {
        validate(&self.root_dir, name)
            .map_err(|reason| Error::invalid_template(name, reason.to_string()))?;
        let template = PageTemplate::new(&self.root_dir, name, Arc::clone(&self.reader))?;
        let template = match self.templates.entry(name.to_string()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(template);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(template),
        };
        Ok(template)
    }

    /// Delete every file staged into any template during this session.
    ///
    /// Best-effort and order-independent: one template's cleanup failure
    /// does not block another's.
    pub fn on_exit(&self) {
        for template in self.templates.values() {
            template.remove_extra_files();
        }
    }
}
