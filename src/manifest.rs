//! Remote package manifest
//!
//! The desired state of every component comes from a versioned JSON
//! document published alongside the patch. Any `manifestVersion` other than
//! the one this build understands is rejected outright - that is the signal
//! that the installer itself is outdated.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use serde::Deserialize;

use crate::logging::log_info;
use crate::package::{Component, PackageDescriptor, PackageSource};

/// Only schema this build can reconcile against.
pub const SUPPORTED_MANIFEST_VERSION: u32 = 1;

const USER_AGENT: &str = concat!("omoritr-installer/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RemoteManifest {
    #[serde(rename = "manifestVersion")]
    pub manifest_version: u32,
    pub packages: HashMap<String, PackageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageEntry {
    pub version: String,
    /// Download URL for the package archive.
    pub path: String,
    pub filename: String,
    /// Extraction target relative to the game directory.
    pub target: String,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ManifestError {
    /// The document uses a schema this installer does not understand;
    /// the user needs a newer installer, not a retry.
    Incompatible { found: u32 },
    /// Network or parse failure while fetching the document.
    Fetch { reason: String },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Incompatible { found } => write!(
                f,
                "incompatible manifest version {} (supported: {}); update the installer",
                found, SUPPORTED_MANIFEST_VERSION
            ),
            ManifestError::Fetch { reason } => {
                write!(f, "failed to fetch package manifest: {}", reason)
            }
        }
    }
}

impl Error for ManifestError {}

// ============================================================================
// Candidate Index
// ============================================================================

/// Best-known descriptor per component; the authoritative desired state for
/// one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    pub gomori: Option<PackageDescriptor>,
    pub oneloader: Option<PackageDescriptor>,
    pub translations: Option<PackageDescriptor>,
}

impl CandidateIndex {
    /// Build the index from an already-parsed manifest document.
    pub fn from_manifest(manifest: RemoteManifest) -> Result<Self, ManifestError> {
        if manifest.manifest_version != SUPPORTED_MANIFEST_VERSION {
            return Err(ManifestError::Incompatible {
                found: manifest.manifest_version,
            });
        }

        let mut packages = manifest.packages;
        let mut take = |component: Component| {
            packages.remove(component.manifest_key()).map(|entry| PackageDescriptor {
                name: component.manifest_key().to_string(),
                source: PackageSource::Remote(entry.path),
                filename: entry.filename,
                version: entry.version,
                target: entry.target,
            })
        };

        Ok(Self {
            gomori: take(Component::Gomori),
            oneloader: take(Component::OneLoader),
            translations: take(Component::Translations),
        })
    }

    pub fn get(&self, component: Component) -> Option<&PackageDescriptor> {
        match component {
            Component::Gomori => self.gomori.as_ref(),
            Component::OneLoader => self.oneloader.as_ref(),
            Component::Translations => self.translations.as_ref(),
        }
    }
}

/// Fetch and index the remote package manifest.
pub fn fetch_manifest(url: &str) -> Result<CandidateIndex, ManifestError> {
    log_info(&format!("Fetching package manifest: {}", url));

    let response = ureq::get(url)
        .set("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| ManifestError::Fetch {
            reason: e.to_string(),
        })?;

    let manifest: RemoteManifest = response.into_json().map_err(|e| ManifestError::Fetch {
        reason: e.to_string(),
    })?;

    CandidateIndex::from_manifest(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST_JSON: &str = r#"{
        "manifestVersion": 1,
        "packages": {
            "oneloader": {
                "version": "1.0.3",
                "path": "https://example.invalid/oneloader.zip",
                "filename": "oneloader.zip",
                "target": "www/mods"
            },
            "translations": {
                "version": "2.0",
                "path": "https://example.invalid/omoritr.zip",
                "filename": "omoritr.zip",
                "target": "www/mods"
            }
        }
    }"#;

    #[test]
    fn test_index_from_v1_manifest() {
        let manifest: RemoteManifest = serde_json::from_str(MANIFEST_JSON).unwrap();
        let index = CandidateIndex::from_manifest(manifest).unwrap();

        let oneloader = index.get(Component::OneLoader).unwrap();
        assert_eq!(oneloader.version, "1.0.3");
        assert_eq!(oneloader.target, "www/mods");
        assert_eq!(
            oneloader.source,
            PackageSource::Remote("https://example.invalid/oneloader.zip".to_string())
        );

        // absent entries stay absent instead of erroring at parse time
        assert!(index.get(Component::Gomori).is_none());
        assert!(index.get(Component::Translations).is_some());
    }

    #[test]
    fn test_incompatible_manifest_version_rejected() {
        let manifest: RemoteManifest =
            serde_json::from_str(r#"{"manifestVersion": 2, "packages": {}}"#).unwrap();
        let err = CandidateIndex::from_manifest(manifest).unwrap_err();
        assert!(matches!(err, ManifestError::Incompatible { found: 2 }));
    }

    #[test]
    fn test_malformed_document_fails_parse() {
        let result = serde_json::from_str::<RemoteManifest>(r#"{"packages": {}}"#);
        assert!(result.is_err());
    }
}
