//! Shared filesystem helpers
//!
//! Everything the installer deletes or extracts goes through the two
//! functions here. Uninstall candidates are computed from patterns and a
//! bad pattern (or a stray symlink) could point outside the game directory,
//! so both helpers resolve real paths and refuse anything that escapes the
//! container.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::logging::{log_error, log_info, log_warning};

/// Delete the given paths, but only those that resolve inside `container`.
///
/// Each candidate is canonicalized first: missing paths are skipped (not an
/// error), and paths whose real location is outside the container are
/// skipped and logged as a data inconsistency. Directories are removed
/// recursively, files are unlinked. A failed removal is logged and the
/// remaining candidates are still attempted; callers observe the eventual
/// state by re-probing, not through a returned error.
pub fn safe_delete(container: &Path, paths: &[PathBuf]) {
    let real_container = match fs::canonicalize(container) {
        Ok(path) => path,
        Err(e) => {
            log_error(&format!(
                "Cannot resolve container {:?}, refusing to delete anything: {}",
                container, e
            ));
            return;
        }
    };

    for target in paths {
        // canonicalize also resolves symlinks, so a link inside the
        // container pointing elsewhere fails the check below
        let real_target = match fs::canonicalize(target) {
            Ok(path) => path,
            Err(_) => {
                log_info(&format!("Skipping {:?}: does not exist", target));
                continue;
            }
        };

        if !real_target.starts_with(&real_container) {
            log_warning(&format!(
                "Skipping {:?}: resolves outside {:?}",
                target, real_container
            ));
            continue;
        }

        let result = if real_target.is_dir() {
            fs::remove_dir_all(&real_target)
        } else {
            fs::remove_file(&real_target)
        };

        match result {
            Ok(()) => log_info(&format!("Deleted {:?}", real_target)),
            Err(e) => log_error(&format!("Failed to delete {:?}: {}", real_target, e)),
        }
    }
}

/// Resolve `relative` against `root` and return the result only if it is
/// still inside `root`.
///
/// The root is canonicalized (it must exist); the relative part is
/// normalized lexically so that `..` components cannot climb out even when
/// the final path does not exist yet. Returns `None` for absolute or
/// escaping inputs.
pub fn resolve_inside(root: &Path, relative: &Path) -> Option<PathBuf> {
    let root = fs::canonicalize(root).ok()?;
    let mut resolved = root.clone();

    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if resolved.starts_with(&root) {
        Some(resolved)
    } else {
        None
    }
}
