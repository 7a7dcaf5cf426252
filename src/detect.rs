//! Component probes
//!
//! Pure, read-only functions over the game directory's current contents.
//! Nothing here mutates the filesystem and ordinary absence is never an
//! error. A probe pass rebuilds the whole snapshot from scratch; results
//! are transient and must not be cached across mutations.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::logging::log_warning;
use crate::paths;

// ============================================================================
// Probe Results
// ============================================================================

/// Result of probing one component.
///
/// `Found { version: None }` means the component is on disk but its manifest
/// was missing or unreadable - distinct from `NotFound`, which callers must
/// handle separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Found { version: Option<String> },
    NotFound,
    /// Both the packed and the extracted form exist at once (translation
    /// patch only). Inconsistent; reported as-is, never silently resolved.
    Conflicted,
}

impl Detection {
    pub fn is_present(&self) -> bool {
        !matches!(self, Detection::NotFound)
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            Detection::Found { version } => version.as_deref(),
            _ => None,
        }
    }
}

/// Whether GOMORI carries the data-format compatibility fix.
///
/// `Unknown` when GOMORI is absent or the probed source file cannot be
/// read; never coerced to `Missing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatPatch {
    Applied,
    Missing,
    Unknown,
}

/// One full probe pass over the game directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSnapshot {
    pub gomori: Detection,
    pub gomori_compat: CompatPatch,
    pub oneloader: Detection,
    pub translations: Detection,
}

// ============================================================================
// Probes
// ============================================================================

/// Check that a directory looks like an OMORI installation.
pub fn is_game_dir(path: &Path) -> bool {
    path.join(paths::GAME_EXECUTABLE).exists()
}

/// Probe all tracked components at once.
pub fn probe(game_dir: &Path) -> InstallSnapshot {
    InstallSnapshot {
        gomori: probe_gomori(game_dir),
        gomori_compat: probe_gomori_compat(game_dir),
        oneloader: probe_oneloader(game_dir),
        translations: probe_translations(game_dir),
    }
}

/// GOMORI presence is defined by its marker script, not its manifest.
pub fn probe_gomori(game_dir: &Path) -> Detection {
    if !game_dir.join(paths::GOMORI_MARKER).exists() {
        return Detection::NotFound;
    }
    Detection::Found {
        version: read_manifest_version(&game_dir.join(paths::GOMORI_MANIFEST)),
    }
}

/// Token search in the installed file types table.
pub fn probe_gomori_compat(game_dir: &Path) -> CompatPatch {
    if !game_dir.join(paths::GOMORI_MARKER).exists() {
        return CompatPatch::Unknown;
    }
    match fs::read_to_string(game_dir.join(paths::GOMORI_COMPAT_SOURCE)) {
        Ok(source) if source.contains(paths::GOMORI_COMPAT_TOKEN) => CompatPatch::Applied,
        Ok(_) => CompatPatch::Missing,
        Err(_) => CompatPatch::Unknown,
    }
}

pub fn probe_oneloader(game_dir: &Path) -> Detection {
    let manifest_path = game_dir.join(paths::ONELOADER_MANIFEST);
    if !manifest_path.exists() {
        return Detection::NotFound;
    }
    Detection::Found {
        version: read_manifest_version(&manifest_path),
    }
}

/// The translation patch is installed when exactly one of its two forms
/// exists: the extracted directory or the single packed archive.
pub fn probe_translations(game_dir: &Path) -> Detection {
    let loose_manifest = game_dir.join(paths::TRANSLATION_MANIFEST);
    let archive = game_dir.join(paths::TRANSLATION_ARCHIVE);

    match (loose_manifest.exists(), archive.exists()) {
        (true, true) => Detection::Conflicted,
        (false, false) => Detection::NotFound,
        (true, false) => Detection::Found {
            version: read_manifest_version(&loose_manifest),
        },
        (false, true) => Detection::Found {
            version: read_archive_manifest_version(&archive),
        },
    }
}

// ============================================================================
// Manifest Reading
// ============================================================================

#[derive(Deserialize)]
struct ModManifest {
    version: String,
}

/// Read the `version` field of a mod.json. Missing or malformed manifests
/// degrade to `None` ("version unknown"), never a hard failure.
fn read_manifest_version(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<ModManifest>(&contents) {
        Ok(manifest) => Some(manifest.version),
        Err(e) => {
            log_warning(&format!("Malformed manifest at {:?}: {}", path, e));
            None
        }
    }
}

/// Read the manifest from inside the packed translation archive.
fn read_archive_manifest_version(archive_path: &Path) -> Option<String> {
    let file = fs::File::open(archive_path).ok()?;
    let mut archive = zip::ZipArchive::new(file).ok()?;
    let mut entry = match archive.by_name(paths::ARCHIVE_MANIFEST_ENTRY) {
        Ok(entry) => entry,
        Err(_) => {
            // archive present but no manifest inside: a broken install
            log_warning(&format!(
                "Packed translation archive {:?} has no {} entry",
                archive_path,
                paths::ARCHIVE_MANIFEST_ENTRY
            ));
            return None;
        }
    };

    let mut contents = String::new();
    entry.read_to_string(&mut contents).ok()?;
    match serde_json::from_str::<ModManifest>(&contents) {
        Ok(manifest) => Some(manifest.version),
        Err(e) => {
            log_warning(&format!(
                "Malformed manifest inside {:?}: {}",
                archive_path, e
            ));
            None
        }
    }
}
