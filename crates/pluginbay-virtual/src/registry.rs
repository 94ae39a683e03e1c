//! Plugin registries
//!
//! [`DirectoryRegistry`] scans plugin bundle directories on disk;
//! [`CatalogRegistry`] serves a fixed list.

use pluginbay_core::{DescriptorInfo, PluginKind, PluginRegistry, Result, SessionError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Registry backed by plugin bundles found in a set of directories.
///
/// # Example
/// ```ignore
/// let registry = DirectoryRegistry::system();
/// let effects = registry.query(PluginKind::Effect, &|_| true)?;
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryRegistry {
    search_paths: Vec<PathBuf>,
}

impl DirectoryRegistry {
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Standard VST, VST3, CLAP and AudioUnit locations for this platform.
    pub fn system() -> Self {
        let home = home_dir();
        Self::new(
            BUNDLE_FORMATS
                .iter()
                .flat_map(|&(ext, folder)| platform_search_paths(ext, folder, home.as_deref())),
        )
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn scan_directory(dir_path: &Path) -> Result<Vec<DescriptorInfo>> {
        let mut found = Vec::new();

        for entry in std::fs::read_dir(dir_path)? {
            let path = entry?.path();
            if let Some(info) = descriptor_for_path(&path) {
                found.push(info);
            }
        }

        Ok(found)
    }
}

impl PluginRegistry for DirectoryRegistry {
    fn query(
        &self,
        kind: PluginKind,
        filter: &dyn Fn(&DescriptorInfo) -> bool,
    ) -> Result<Vec<DescriptorInfo>> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for dir in &self.search_paths {
            if !dir.is_dir() {
                tracing::debug!("Skipping missing plugin directory {}", dir.display());
                continue;
            }
            match Self::scan_directory(dir) {
                Ok(plugins) => found.extend(plugins),
                Err(e) => tracing::warn!("Failed to scan {}: {}", dir.display(), e),
            }
        }

        found.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        found.retain(|info| info.kind == kind && seen.insert(info.id.clone()) && filter(info));

        tracing::debug!("Found {} {} bundle(s) on disk", found.len(), kind);
        Ok(found)
    }
}

/// Registry serving a fixed in-memory list.
#[derive(Debug, Clone, Default)]
pub struct CatalogRegistry {
    plugins: Vec<DescriptorInfo>,
    failure: Option<String>,
}

impl CatalogRegistry {
    pub fn new(plugins: impl IntoIterator<Item = DescriptorInfo>) -> Self {
        Self {
            plugins: plugins.into_iter().collect(),
            failure: None,
        }
    }

    /// Registry whose every query fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            plugins: Vec::new(),
            failure: Some(reason.into()),
        }
    }
}

impl PluginRegistry for CatalogRegistry {
    fn query(
        &self,
        kind: PluginKind,
        filter: &dyn Fn(&DescriptorInfo) -> bool,
    ) -> Result<Vec<DescriptorInfo>> {
        if let Some(reason) = &self.failure {
            return Err(SessionError::Registry(reason.clone()));
        }
        Ok(self
            .plugins
            .iter()
            .filter(|info| info.kind == kind && filter(info))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Bundle extension and the folder that format lives in under the
/// platform's plugin roots.
const BUNDLE_FORMATS: &[(&str, &str)] = &[
    ("vst", "VST"),
    ("vst3", "VST3"),
    ("clap", "CLAP"),
    ("component", "Components"),
];

fn is_plugin_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| BUNDLE_FORMATS.iter().any(|&(known, _)| known == ext))
}

fn descriptor_for_path(path: &Path) -> Option<DescriptorInfo> {
    if !is_plugin_file(path) {
        return None;
    }
    let name = path.file_stem().and_then(|s| s.to_str())?;
    let ext = path.extension().and_then(|s| s.to_str())?;

    Some(
        DescriptorInfo::new(format!("{}:{}", ext, name), name, infer_kind(name))
            .custom_view(true)
            .location(path),
    )
}

/// Bundles carry no category on disk, so guess from the name.
fn infer_kind(name: &str) -> PluginKind {
    let lowercase = name.to_ascii_lowercase();
    let instrument = ["synth", "drum", "bass", "piano", "keys", "organ", "sampler"];
    if instrument.iter().any(|word| lowercase.contains(word)) {
        PluginKind::Instrument
    } else {
        PluginKind::Effect
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(target_os = "macos")]
fn platform_search_paths(_ext: &str, folder: &str, home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![Path::new("/Library/Audio/Plug-Ins").join(folder)];
    if let Some(home) = home {
        paths.push(home.join("Library/Audio/Plug-Ins").join(folder));
    }
    paths
}

#[cfg(target_os = "windows")]
fn platform_search_paths(ext: &str, folder: &str, _home: Option<&Path>) -> Vec<PathBuf> {
    match ext {
        "component" => Vec::new(),
        "vst" => vec![
            PathBuf::from(r"C:\Program Files\VstPlugins"),
            PathBuf::from(r"C:\Program Files\Common Files\VST2"),
        ],
        _ => vec![Path::new(r"C:\Program Files\Common Files").join(folder)],
    }
}

/// Lowercase format directories under the system and user prefixes.
#[cfg(target_os = "linux")]
fn platform_search_paths(ext: &str, _folder: &str, home: Option<&Path>) -> Vec<PathBuf> {
    if ext == "component" {
        return Vec::new();
    }
    let mut paths = vec![
        Path::new("/usr/lib").join(ext),
        Path::new("/usr/local/lib").join(ext),
    ];
    if let Some(home) = home {
        paths.push(home.join(format!(".{}", ext)));
    }
    paths
}

#[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
fn platform_search_paths(_ext: &str, _folder: &str, _home: Option<&Path>) -> Vec<PathBuf> {
    Vec::new()
}
