//! Server binary resolution.

use crate::{Result as SupervisorResult, SupervisorConfig, SupervisorError};

use std::path::{Path, PathBuf};

use tracing::{debug, info};

const BUNDLE_EXTENSION: &str = "app";
const TEMPLATES_DIR: &str = "templates";

/// Ordered list of places the server binary may live.
///
/// Search order:
/// 1. Explicit `binary.path` from config
/// 2. Sibling to current exe (packaged bundle, Contents/MacOS)
/// 3. <exe dir>/../Resources/bin (packaged resources)
/// 4. <cwd>/bin (development tree)
/// 5. bin/ next to the bundle, then one level further up
#[derive(Debug, Clone)]
pub struct BinaryLocator {
    candidates: Vec<PathBuf>,
}

impl BinaryLocator {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates: dedup(candidates),
        }
    }

    /// Build the candidate list from config and the running process.
    pub fn from_config(config: &SupervisorConfig) -> Self {
        let exe = std::env::current_exe().ok();
        let cwd = std::env::current_dir().ok();
        Self::new(Self::default_candidates(
            config,
            exe.as_deref(),
            cwd.as_deref(),
        ))
    }

    pub(crate) fn default_candidates(
        config: &SupervisorConfig,
        exe: Option<&Path>,
        cwd: Option<&Path>,
    ) -> Vec<PathBuf> {
        let name = config.binary.name.as_str();
        let mut candidates = Vec::new();

        if let Some(ref explicit) = config.binary.path {
            candidates.push(explicit.clone());
        }

        let exe_dir = exe.and_then(Path::parent);

        if let Some(exe_dir) = exe_dir {
            candidates.push(exe_dir.join(name));
            if let Some(contents) = exe_dir.parent() {
                candidates.push(contents.join("Resources").join("bin").join(name));
            }
        }

        if let Some(cwd) = cwd {
            candidates.push(cwd.join("bin").join(name));
        }

        if let Some(exe_dir) = exe_dir {
            let bundle = Self::bundle_dir(exe_dir).unwrap_or(exe_dir);
            if let Some(parent) = bundle.parent() {
                candidates.push(parent.join("bin").join(name));
                if let Some(grandparent) = parent.parent() {
                    candidates.push(grandparent.join("bin").join(name));
                }
            }
        }

        candidates
    }

    /// The enclosing `.app` directory when running from a macOS bundle.
    fn bundle_dir(exe_dir: &Path) -> Option<&Path> {
        exe_dir
            .ancestors()
            .find(|dir| dir.extension().is_some_and(|ext| ext == BUNDLE_EXTENSION))
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that exists on disk wins.
    pub fn resolve(&self) -> SupervisorResult<PathBuf> {
        for candidate in &self.candidates {
            debug!("Checking for server binary at {}", candidate.display());
            if candidate.exists() {
                info!("Using server binary: {}", candidate.display());
                return Ok(candidate.clone());
            }
        }

        Err(SupervisorError::binary_not_found(self.candidates.clone()))
    }
}

/// Where the server's HTML templates may live when config names none.
///
/// Search order:
/// 1. <exe dir>/../Resources/templates (packaged resources)
/// 2. <exe dir>/../cmd/web/templates (shell run from the source tree)
/// 3. <cwd>/cmd/web/templates (development tree)
#[derive(Debug, Clone)]
pub struct TemplateLocator {
    candidates: Vec<PathBuf>,
}

impl TemplateLocator {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates: dedup(candidates),
        }
    }

    pub fn from_environment() -> Self {
        let exe = std::env::current_exe().ok();
        let cwd = std::env::current_dir().ok();
        Self::new(Self::default_candidates(exe.as_deref(), cwd.as_deref()))
    }

    pub(crate) fn default_candidates(exe: Option<&Path>, cwd: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(parent) = exe.and_then(Path::parent).and_then(Path::parent) {
            candidates.push(parent.join("Resources").join(TEMPLATES_DIR));
            candidates.push(parent.join("cmd").join("web").join(TEMPLATES_DIR));
        }

        if let Some(cwd) = cwd {
            candidates.push(cwd.join("cmd").join("web").join(TEMPLATES_DIR));
        }

        candidates
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that is a directory; the server falls back to its
    /// embedded templates when there is none.
    pub fn resolve(&self) -> Option<PathBuf> {
        let found = self.candidates.iter().find(|dir| dir.is_dir()).cloned();

        match found {
            Some(ref dir) => info!("Using templates: {}", dir.display()),
            None => debug!("No template directory found, server uses its embedded templates"),
        }

        found
    }
}

/// Drop repeated candidates, keeping the first occurrence.
fn dedup(candidates: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut unique: Vec<PathBuf> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !unique.contains(&candidate) {
            unique.push(candidate);
        }
    }
    unique
}
