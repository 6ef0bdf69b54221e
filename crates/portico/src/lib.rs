//! # portico
//!
//! Page template registry providing:
//! - Structural validation of template directories
//! - Typed template entities loaded from on-disk descriptors
//! - Discovery and deduplication across a template root
//! - Runtime payload swapping with atomic descriptor rewrites
//! - Tracking and cleanup of files staged during a session
//!
//! A page template is a directory bundling a descriptor file named `config`,
//! an `html/` asset tree with at least one `*.html` entry, and optional
//! payload/context metadata:
//!
//! ```text
//! <root>/<name>/config          descriptor (required)
//! <root>/<name>/html/           assets (required, at least one *.html)
//! <root>/<name>/html/static/    destination for staged extra files
//! ```
//!
//! # Example
//!
//! ```no_run
//! use portico::TemplateRegistry;
//! use camino::Utf8Path;
//!
//! # fn example() -> portico::Result<()> {
//! let mut registry = TemplateRegistry::open(Utf8Path::new("/var/lib/portico/pages"))?;
//!
//! for template in registry.iter() {
//!     print!("{template}");
//! }
//!
//! if let Some(template) = registry.get_mut("login_portal") {
//!     template.update_payload_path("update-2.1.exe")?;
//! }
//!
//! // Delete anything staged into the templates during the session.
//! registry.on_exit();
//! # Ok(())
//! # }
//! ```

pub mod descriptor;
pub mod error;
pub mod registry;
pub mod template;
pub mod validator;

pub use descriptor::{Descriptor, DescriptorReader, SectionMap, TomlDescriptor};
pub use error::{Error, Result};
pub use registry::TemplateRegistry;
pub use template::PageTemplate;
pub use validator::{validate, ValidationError};

/// Name of the assets subdirectory inside each template directory.
pub const ASSETS_DIR: &str = "html";

/// Name of the staged-file destination inside the assets subdirectory.
pub const STATIC_DIR: &str = "static";

/// Suffix that marks an asset entry as an HTML file.
pub const HTML_SUFFIX: &str = ".html";
