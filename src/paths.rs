//! Fixed on-disk layout of the game directory
//!
//! Every tracked component lives at a known relative path under the game
//! dir; probes and uninstall candidate sets are built from these constants.
//! All installable content sits below `www/`.

/// Marker executable that identifies an OMORI installation.
pub const GAME_EXECUTABLE: &str = "OMORI.exe";

// ============================================================================
// GOMORI (first-generation mod loader)
// ============================================================================

/// Marker script whose existence means GOMORI is installed.
pub const GOMORI_MARKER: &str = "www/gomori/gomori.js";

/// GOMORI's own package manifest.
pub const GOMORI_MANIFEST: &str = "www/mods/gomori/mod.json";

/// Source file probed for the data-format compatibility fix.
pub const GOMORI_COMPAT_SOURCE: &str = "www/gomori/constants/filetypes.js";

/// Token registered in the file types table by the compatibility fix.
pub const GOMORI_COMPAT_TOKEN: &str = "yaml";

/// Fixed uninstall candidates for GOMORI.
pub const GOMORI_CLEAR_PATHS: &[&str] = &["www/gomori", "www/mods/gomori", "www/index.html"];

/// GOMORI also scatters versioned helper bundles directly under `www/`;
/// anything starting with these prefixes belongs to it.
pub const GOMORI_CLEAR_PREFIXES: &[&str] = &["JSON-Patch", "adm-zip"];

// ============================================================================
// OneLoader (second-generation mod loader)
// ============================================================================

/// OneLoader's package manifest; presence marker and version source.
pub const ONELOADER_MANIFEST: &str = "www/mods/oneloader/mod.json";

/// Fixed uninstall candidates for OneLoader.
pub const ONELOADER_CLEAR_PATHS: &[&str] = &["www/modloader", "www/mods/oneloader"];

// ============================================================================
// Turkish translation patch (omoritr)
// ============================================================================

/// Extracted form of the translation patch.
pub const TRANSLATION_MANIFEST: &str = "www/mods/omoritr/mod.json";

/// Packed form: the patch left as a single archive under the mods tree.
pub const TRANSLATION_ARCHIVE: &str = "www/mods/omoritr.zip";

/// Manifest entry name inside the packed form.
pub const ARCHIVE_MANIFEST_ENTRY: &str = "mod.json";

/// Fixed uninstall candidates for the translation patch (both forms).
pub const TRANSLATION_CLEAR_PATHS: &[&str] = &["www/mods/omoritr", "www/mods/omoritr.zip"];

// ============================================================================
// Remote package manifest
// ============================================================================

/// Published v1 package manifest endpoint.
pub const MANIFEST_URL: &str = "https://omoritr.emreis.com/packages/v1_manifest.json";
