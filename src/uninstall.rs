//! Component uninstall candidate sets
//!
//! Each component maps to a fixed set of paths under the game directory;
//! GOMORI additionally scatters versioned helper bundles under `www/` that
//! are matched by prefix. Everything funnels through `safe_delete`, so a
//! bad candidate can never reach outside the game directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::log_install;
use crate::package::Component;
use crate::paths;
use crate::utils::safe_delete;

/// Remove one component's on-disk footprint. Best-effort: individual
/// failures are logged by `safe_delete` and observed via re-probing.
pub fn clear_component(game_dir: &Path, component: Component) {
    log_install(&format!("Removing {}", component.display_name()));
    match component {
        Component::Gomori => clear_gomori(game_dir),
        Component::OneLoader => clear_oneloader(game_dir),
        Component::Translations => clear_translations(game_dir),
    }
}

pub fn clear_gomori(game_dir: &Path) {
    let mut candidates: Vec<PathBuf> = paths::GOMORI_CLEAR_PATHS
        .iter()
        .map(|p| game_dir.join(p))
        .collect();
    candidates.extend(prefix_matches(
        &game_dir.join("www"),
        paths::GOMORI_CLEAR_PREFIXES,
    ));
    safe_delete(game_dir, &candidates);
}

pub fn clear_oneloader(game_dir: &Path) {
    let candidates: Vec<PathBuf> = paths::ONELOADER_CLEAR_PATHS
        .iter()
        .map(|p| game_dir.join(p))
        .collect();
    safe_delete(game_dir, &candidates);
}

/// Removes both the extracted and the packed form of the patch.
pub fn clear_translations(game_dir: &Path) {
    let candidates: Vec<PathBuf> = paths::TRANSLATION_CLEAR_PATHS
        .iter()
        .map(|p| game_dir.join(p))
        .collect();
    safe_delete(game_dir, &candidates);
}

/// Direct children of `dir` whose names start with any of the prefixes.
/// Sorted so the resulting candidate list is deterministic.
fn prefix_matches(dir: &Path, prefixes: &[&str]) -> Vec<PathBuf> {
    let mut matches = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if prefixes.iter().any(|prefix| name.starts_with(prefix)) {
                matches.push(entry.path());
            }
        }
    }
    matches.sort();
    matches
}
