//! Structural validation of template directories.
//!
//! A directory qualifies as a page template when it carries a descriptor
//! file, an assets subdirectory, and at least one HTML entry inside that
//! subdirectory. Validation is pure: it never modifies the filesystem and is
//! safe to run repeatedly over the same directory.

use crate::descriptor::DESCRIPTOR_FILE;
use crate::{ASSETS_DIR, HTML_SUFFIX};
use camino::Utf8Path;
use thiserror::Error;

/// Reason a directory failed template validation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// No descriptor file directly inside the template directory
    #[error("descriptor not found")]
    DescriptorNotFound,

    /// Assets subdirectory missing or not listable
    #[error("assets directory not found")]
    AssetsDirNotFound,

    /// Assets subdirectory holds no HTML entry
    #[error("no HTML files found")]
    NoHtmlFiles,
}

/// Check whether `root_dir/name` is structurally a valid page template.
///
/// Rules are checked in order, short-circuiting on the first failure:
/// descriptor file present, assets subdirectory listable, at least one
/// entry in it ending in [`HTML_SUFFIX`].
pub fn validate(root_dir: &Utf8Path, name: &str) -> Result<(), ValidationError> {
    let template_dir = root_dir.join(name);

    if !template_dir.join(DESCRIPTOR_FILE).is_file() {
        return Err(ValidationError::DescriptorNotFound);
    }

    // Any listing failure counts as a missing assets directory.
    let entries = match template_dir.join(ASSETS_DIR).read_dir_utf8() {
        Ok(entries) => entries,
        Err(_) => return Err(ValidationError::AssetsDirNotFound),
    };

    for entry in entries.flatten() {
        if entry.file_name().ends_with(HTML_SUFFIX) {
            return Ok(());
        }
    }

    Err(ValidationError::NoHtmlFiles)
}
