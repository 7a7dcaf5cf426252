//! Installable packages
//!
//! A `PackageDescriptor` is one installable unit from the remote manifest
//! (or a locally bundled archive). Installing it stages the archive in a
//! private temporary directory, verifies the extraction target stays inside
//! the game directory, then unpacks over whatever is there.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::logging::{log_download, log_install};
use crate::utils::resolve_inside;

const USER_AGENT: &str = concat!("omoritr-installer/", env!("CARGO_PKG_VERSION"));

/// 64KB chunks; the progress sink fires once per chunk.
const DOWNLOAD_CHUNK_SIZE: usize = 65536;

// ============================================================================
// Components
// ============================================================================

/// The three tracked add-on components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Gomori,
    OneLoader,
    Translations,
}

impl Component {
    pub fn display_name(&self) -> &'static str {
        match self {
            Component::Gomori => "GOMORI",
            Component::OneLoader => "OneLoader",
            Component::Translations => "Turkish translation patch",
        }
    }

    /// Key used for this component in the remote manifest.
    pub fn manifest_key(&self) -> &'static str {
        match self {
            Component::Gomori => "gomori",
            Component::OneLoader => "oneloader",
            Component::Translations => "translations",
        }
    }
}

// ============================================================================
// Package Descriptors
// ============================================================================

/// Where a package's archive comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSource {
    /// Download from this URL into a staging directory first.
    Remote(String),
    /// Archive already on disk (bundled); no download step.
    Local(PathBuf),
}

/// One installable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub source: PackageSource,
    pub filename: String,
    pub version: String,
    /// Extraction target, relative to the game directory. Must resolve to
    /// a descendant of the game directory; checked before any write.
    pub target: String,
}

// ============================================================================
// Install Errors
// ============================================================================

/// Errors raised while installing a single package or applying a plan.
#[derive(Debug)]
pub enum InstallError {
    /// Extraction target escapes the game directory. Fatal, never corrected.
    InvalidTarget { package: String, target: String },
    /// Network or IO failure while fetching the archive.
    Fetch { package: String, reason: String },
    /// Archive could not be opened or unpacked.
    Extract { package: String, reason: String },
    /// A plan action failed; records which one and where in the plan.
    Step {
        position: usize,
        action: String,
        reason: String,
    },
}

impl fmt::Display for InstallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallError::InvalidTarget { package, target } => {
                write!(f, "{}: manifest target '{}' is invalid", package, target)
            }
            InstallError::Fetch { package, reason } => {
                write!(f, "{}: download failed: {}", package, reason)
            }
            InstallError::Extract { package, reason } => {
                write!(f, "{}: extraction failed: {}", package, reason)
            }
            InstallError::Step {
                position,
                action,
                reason,
            } => {
                write!(f, "step {} ({}) failed: {}", position + 1, action, reason)
            }
        }
    }
}

impl Error for InstallError {}

// ============================================================================
// Fetch & Extract
// ============================================================================

/// Install a package into the game directory.
///
/// The target containment check runs before anything is written. Remote
/// sources are streamed into a temporary staging directory which is removed
/// when this function returns, successfully or not. `progress_sink` receives
/// cumulative downloaded bytes once per chunk, with the total size when the
/// server reports one.
pub fn install<F>(
    descriptor: &PackageDescriptor,
    game_dir: &Path,
    progress_sink: &mut F,
) -> Result<(), InstallError>
where
    F: FnMut(u64, Option<u64>),
{
    let extract_target = resolve_inside(game_dir, Path::new(&descriptor.target)).ok_or_else(
        || InstallError::InvalidTarget {
            package: descriptor.name.clone(),
            target: descriptor.target.clone(),
        },
    )?;

    // staging dir is removed on drop, including every error path below
    let staging = tempfile::Builder::new()
        .prefix("omoritr-package-")
        .tempdir()
        .map_err(|e| InstallError::Fetch {
            package: descriptor.name.clone(),
            reason: e.to_string(),
        })?;

    let archive_path = match &descriptor.source {
        PackageSource::Local(path) => path.clone(),
        PackageSource::Remote(url) => {
            let path = staging.path().join(&descriptor.filename);
            download(url, &path, &descriptor.name, progress_sink)?;
            path
        }
    };

    log_install(&format!(
        "Extracting {} {} into {:?}",
        descriptor.name, descriptor.version, extract_target
    ));

    extract_archive(&archive_path, &extract_target).map_err(|e| InstallError::Extract {
        package: descriptor.name.clone(),
        reason: e.to_string(),
    })?;

    log_install(&format!("{} {} installed", descriptor.name, descriptor.version));
    Ok(())
}

/// Stream a URL to disk, reporting cumulative progress per chunk.
fn download<F>(
    url: &str,
    path: &Path,
    package: &str,
    progress_sink: &mut F,
) -> Result<(), InstallError>
where
    F: FnMut(u64, Option<u64>),
{
    log_download(&format!("Downloading {}: {}", package, url));

    let fetch_err = |reason: String| InstallError::Fetch {
        package: package.to_string(),
        reason,
    };

    let response = ureq::get(url)
        .set("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| fetch_err(e.to_string()))?;

    // servers may omit Content-Length; progress is still reported, with an
    // indeterminate total
    let total = response
        .header("Content-Length")
        .and_then(|s| s.parse::<u64>().ok());

    let mut file = fs::File::create(path).map_err(|e| fetch_err(e.to_string()))?;
    let mut reader = response.into_reader();
    let mut buffer = [0u8; DOWNLOAD_CHUNK_SIZE];
    let mut downloaded: u64 = 0;

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| fetch_err(e.to_string()))?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])
            .map_err(|e| fetch_err(e.to_string()))?;
        downloaded += bytes_read as u64;
        progress_sink(downloaded, total);
    }

    log_download(&format!("{} downloaded to {:?} ({} bytes)", package, path, downloaded));
    Ok(())
}

/// Unpack a zip archive into the target, overwriting conflicting paths.
fn extract_archive(archive_path: &Path, target: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(target)?;
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    archive.extract(target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_archive(path: &Path, entries: &[(&str, &str)]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn local_descriptor(archive: PathBuf, target: &str) -> PackageDescriptor {
        PackageDescriptor {
            name: "translations".to_string(),
            source: PackageSource::Local(archive),
            filename: "omoritr.zip".to_string(),
            version: "2.0".to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn test_install_roundtrip_manifest_readable() {
        let staging = tempfile::tempdir().unwrap();
        let game_dir = tempfile::tempdir().unwrap();

        let archive = staging.path().join("omoritr.zip");
        write_archive(
            &archive,
            &[
                ("omoritr/mod.json", r#"{"version": "2.0"}"#),
                ("omoritr/languages/tr.json", "{}"),
            ],
        );

        let descriptor = local_descriptor(archive, "www/mods");
        install(&descriptor, game_dir.path(), &mut |_, _| {}).unwrap();

        let manifest = game_dir.path().join("www/mods/omoritr/mod.json");
        let contents = fs::read_to_string(manifest).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["version"], "2.0");
    }

    #[test]
    fn test_install_overwrites_existing_files() {
        let staging = tempfile::tempdir().unwrap();
        let game_dir = tempfile::tempdir().unwrap();

        let old = game_dir.path().join("www/mods/omoritr/mod.json");
        fs::create_dir_all(old.parent().unwrap()).unwrap();
        fs::write(&old, r#"{"version": "1.0"}"#).unwrap();

        let archive = staging.path().join("omoritr.zip");
        write_archive(&archive, &[("omoritr/mod.json", r#"{"version": "2.0"}"#)]);

        install(
            &local_descriptor(archive, "www/mods"),
            game_dir.path(),
            &mut |_, _| {},
        )
        .unwrap();

        assert!(fs::read_to_string(&old).unwrap().contains("2.0"));
    }

    #[test]
    fn test_install_rejects_escaping_target_before_any_write() {
        let staging = tempfile::tempdir().unwrap();
        let game_dir = tempfile::tempdir().unwrap();

        let archive = staging.path().join("omoritr.zip");
        write_archive(&archive, &[("mod.json", r#"{"version": "2.0"}"#)]);

        let descriptor = local_descriptor(archive, "../../evil");
        let err = install(&descriptor, game_dir.path(), &mut |_, _| {}).unwrap_err();
        assert!(matches!(err, InstallError::InvalidTarget { .. }));

        // nothing may have been written anywhere under the game dir
        assert_eq!(fs::read_dir(game_dir.path()).unwrap().count(), 0);
        let evil = game_dir.path().join("../../evil");
        assert!(!evil.exists());
    }

    #[test]
    fn test_install_missing_local_archive_is_extract_error() {
        let game_dir = tempfile::tempdir().unwrap();
        let descriptor = local_descriptor(PathBuf::from("/nonexistent/omoritr.zip"), "www/mods");
        let err = install(&descriptor, game_dir.path(), &mut |_, _| {}).unwrap_err();
        assert!(matches!(err, InstallError::Extract { .. }));
    }
}
