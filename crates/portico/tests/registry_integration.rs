//! Integration tests for the template registry
//!
//! These tests verify the complete workflow over real on-disk template
//! directories: discovery, deduplication, payload swapping, file staging,
//! and end-of-session cleanup.

use camino::{Utf8Path, Utf8PathBuf};
use portico::descriptor::{
    Descriptor, DescriptorReader, SectionMap, DESCRIPTOR_FILE, INFO_SECTION, PAYLOAD_PATH_KEY,
};
use portico::{Error, TemplateRegistry, TomlDescriptor, ASSETS_DIR};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn utf8_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
}

fn write_template(root: &Utf8Path, name: &str, descriptor: &str, html_files: &[&str]) {
    let dir = root.join(name);
    let assets = dir.join(ASSETS_DIR);
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::write(dir.join(DESCRIPTOR_FILE), descriptor).unwrap();
    for file in html_files {
        std::fs::write(assets.join(file), "<html></html>").unwrap();
    }
}

fn minimal_descriptor(display_name: &str) -> String {
    format!("[info]\nname = \"{display_name}\"\ndescription = \"test template\"\n")
}

/// Wraps the real codec and counts descriptor reads, so tests can assert
/// that rediscovery never reconstructs an already-registered template.
#[derive(Debug, Default)]
struct CountingReader {
    inner: TomlDescriptor,
    reads: AtomicUsize,
}

impl DescriptorReader for CountingReader {
    fn section_map(&self, path: &Utf8Path, section: &str) -> portico::Result<SectionMap> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.section_map(path, section)
    }

    fn write(&self, path: &Utf8Path, descriptor: &Descriptor) -> portico::Result<()> {
        self.inner.write(path, descriptor)
    }
}

#[test]
fn test_end_to_end_discovery_skips_invalid_directories() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);

    // tpl1 is complete; tpl2 lacks the assets directory entirely.
    write_template(&root, "tpl1", &minimal_descriptor("Template One"), &["index.html"]);
    std::fs::create_dir(root.join("tpl2")).unwrap();
    std::fs::write(root.join("tpl2").join(DESCRIPTOR_FILE), minimal_descriptor("Two")).unwrap();

    let registry = TemplateRegistry::open(root).unwrap();

    assert_eq!(registry.names(), vec!["tpl1"]);
    let tpl1 = registry.get("tpl1").unwrap();
    assert_eq!(tpl1.display_name(), "Template One");
    assert!(registry.get("tpl2").is_none());
}

#[test]
fn test_rediscovery_never_duplicates_or_reloads() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    write_template(&root, "portal", &minimal_descriptor("Portal"), &["index.html"]);

    let reader = Arc::new(CountingReader::default());
    let mut registry = TemplateRegistry::open_with_reader(root, Arc::clone(&reader) as Arc<dyn DescriptorReader>)
            .unwrap();
    assert_eq!(registry.len(), 1);

    let reads_after_open = reader.reads.load(Ordering::SeqCst);
    registry.add_user_templates().unwrap();
    registry.add_user_templates().unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(reader.reads.load(Ordering::SeqCst), reads_after_open);
}

#[test]
fn test_second_pass_picks_up_late_template_directories() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    write_template(&root, "first", &minimal_descriptor("First"), &["index.html"]);

    let mut registry = TemplateRegistry::open(root.clone()).unwrap();
    assert_eq!(registry.len(), 1);

    write_template(&root, "second", &minimal_descriptor("Second"), &["login.html"]);
    assert_eq!(registry.find_user_templates().unwrap(), vec!["second"]);

    registry.add_user_templates().unwrap();
    assert_eq!(registry.len(), 2);
    assert!(registry.contains("second"));
}

#[test]
fn test_construction_failure_after_validation_propagates() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);

    // Structurally valid, but the descriptor lacks a required info key.
    write_template(&root, "hollow", "[info]\nname = \"No description\"\n", &["index.html"]);

    let err = TemplateRegistry::open(root).unwrap_err();
    assert!(matches!(
        err,
        Error::MissingDescriptorKey { ref key, .. } if key == "description"
    ));
}

#[test]
fn test_on_exit_cleans_staged_files_across_templates() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    write_template(&root, "alpha", &minimal_descriptor("Alpha"), &["index.html"]);
    write_template(&root, "beta", &minimal_descriptor("Beta"), &["index.html"]);

    let extra = root.join("extra.bin");
    std::fs::write(&extra, "bytes").unwrap();

    let mut registry = TemplateRegistry::open(root).unwrap();
    let mut staged = Vec::new();
    for name in ["alpha", "beta"] {
        let template = registry.get_mut(name).unwrap();
        template.use_file(&extra).unwrap();
        staged.push(template.static_asset_path().join("extra.bin"));
    }
    for path in &staged {
        assert!(path.is_file());
    }

    registry.on_exit();
    for path in &staged {
        assert!(!path.exists());
    }

    // Cleanup is idempotent at the registry level too.
    registry.on_exit();
}

#[test]
fn test_payload_swap_through_the_registry() {
    let dir = tempdir().unwrap();
    let root = utf8_root(&dir);
    write_template(
        &root,
        "portal",
        "[info]\n\
         name = \"Portal\"\n\
         description = \"test template\"\n\
         payloadpath = \"payloads/app.exe\"\n\
         \n\
         [context]\n\
         update_path = \"static/update.exe\"\n\
         vendor = \"acme\"\n",
        &["index.html"],
    );

    let mut registry = TemplateRegistry::open(root).unwrap();
    let template = registry.get_mut("portal").unwrap();
    assert!(template.has_payload());

    template.update_payload_path("new.exe").unwrap();
    assert_eq!(
        template.payload_path().map(Utf8Path::as_str),
        Some("payloads/new.exe")
    );
    assert_eq!(
        template.context().get("vendor").map(String::as_str),
        Some("acme")
    );

    // The rewrite is visible to a fresh read of the descriptor.
    let reader = TomlDescriptor::new();
    let info = reader
        .section_map(template.config_path(), INFO_SECTION)
        .unwrap();
    assert_eq!(
        info.get(PAYLOAD_PATH_KEY).map(String::as_str),
        Some("payloads/new.exe")
    );
}
