//! Catalog backed by directories of JSON component manifests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::{Advertisement, CatalogSource};
use crate::error::{CatalogError, ToolError};
use crate::manifest::ComponentManifest;
use crate::process::ProcessToolFactory;

/// Tracing target for catalog scanning.
const CATALOG_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::catalog");

/// File extension recognised as a component manifest.
const MANIFEST_EXTENSION: &str = "json";

/// Catalog that reads every `*.json` component manifest in a set of
/// directories.
///
/// Directories are scanned in the order given and files within a directory
/// in file-name order, so advertisement order is deterministic. Directories
/// that do not exist are skipped.
///
/// # Example
///
/// ```no_run
/// use anvil_tools::{CatalogSource, ManifestCatalog, DEFAULT_TOOL_GROUP};
///
/// let catalog = ManifestCatalog::new(vec!["/usr/share/anvil/plugins".into()]);
/// for entry in catalog.advertisements(DEFAULT_TOOL_GROUP) {
///     match entry {
///         Ok(advertisement) => println!("{}", advertisement.name()),
///         Err(error) => eprintln!("{error}"),
///     }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManifestCatalog {
    directories: Vec<PathBuf>,
}

impl ManifestCatalog {
    /// Creates a catalog over the given directories.
    #[must_use]
    pub const fn new(directories: Vec<PathBuf>) -> Self {
        Self { directories }
    }

    /// Returns the scanned directories.
    #[must_use]
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }
}

impl CatalogSource for ManifestCatalog {
    fn label(&self) -> &str {
        "manifest-directories"
    }

    fn advertisements(&self, group: &str) -> Vec<Result<Advertisement, CatalogError>> {
        let mut entries = Vec::new();
        for directory in &self.directories {
            for file in manifest_files(directory, &mut entries) {
                collect_from_file(&file, group, &mut entries);
            }
        }
        entries
    }
}

/// Lists manifest files in `directory`, sorted by file name.
///
/// Listing failures are pushed onto `entries`; a single unreadable entry
/// does not hide the rest of the directory.
fn manifest_files(
    directory: &Path,
    entries: &mut Vec<Result<Advertisement, CatalogError>>,
) -> Vec<PathBuf> {
    if !directory.is_dir() {
        debug!(
            target: CATALOG_TARGET,
            directory = %directory.display(),
            "manifest directory absent; skipping"
        );
        return Vec::new();
    }
    match fs::read_dir(directory) {
        Ok(listing) => select_manifests(
            directory,
            listing.map(|entry| entry.map(|found| found.path())),
            entries,
        ),
        Err(source) => {
            entries.push(Err(read_error(directory, source)));
            Vec::new()
        }
    }
}

fn select_manifests(
    directory: &Path,
    listing: impl IntoIterator<Item = std::io::Result<PathBuf>>,
    entries: &mut Vec<Result<Advertisement, CatalogError>>,
) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for item in listing {
        let path = match item {
            Ok(path) => path,
            Err(source) => {
                entries.push(Err(read_error(directory, source)));
                continue;
            }
        };
        let is_manifest = path
            .extension()
            .is_some_and(|extension| extension == MANIFEST_EXTENSION);
        if is_manifest && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    files
}

fn read_error(directory: &Path, source: std::io::Error) -> CatalogError {
    CatalogError::ReadDirectory {
        path: directory.to_path_buf(),
        source: Arc::new(source),
    }
}

/// Reads one manifest and pushes its advertisements for `group`.
fn collect_from_file(
    path: &Path,
    group: &str,
    entries: &mut Vec<Result<Advertisement, CatalogError>>,
) {
    let manifest = match read_manifest(path) {
        Ok(manifest) => manifest,
        Err(error) => {
            entries.push(Err(error));
            return;
        }
    };

    debug!(
        target: CATALOG_TARGET,
        manifest = %path.display(),
        component = manifest.component(),
        version = manifest.version(),
        tools = manifest.tools().len(),
        "read component manifest"
    );

    for tool in manifest.tools().iter().filter(|tool| tool.group() == group) {
        let entry = tool
            .validate()
            .map(|()| {
                Advertisement::new(
                    tool.name(),
                    manifest.component(),
                    Arc::new(ProcessToolFactory::new(tool.clone())),
                )
            })
            .map_err(|source| CatalogError::InvalidManifest {
                path: path.to_path_buf(),
                source,
            });
        entries.push(entry);
    }
}

fn read_manifest(path: &Path) -> Result<ComponentManifest, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::ReadManifest {
        path: path.to_path_buf(),
        source: Arc::new(source),
    })?;
    let manifest: ComponentManifest =
        serde_json::from_str(&text).map_err(|source| CatalogError::ParseManifest {
            path: path.to_path_buf(),
            source,
        })?;
    if manifest.component().trim().is_empty() {
        return Err(CatalogError::InvalidManifest {
            path: path.to_path_buf(),
            source: ToolError::Manifest {
                message: String::from("component name must not be empty"),
            },
        });
    }
    Ok(manifest)
}
