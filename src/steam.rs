//! Steam and game directory discovery
//!
//! Locates the Steam root, then the OMORI installation: the default library
//! first, otherwise every library listed in `libraryfolders.vdf`. This is
//! plain filesystem probing on behalf of the CLI; the core operations take
//! the resolved game directory as input.

use std::fs;
use std::path::{Path, PathBuf};

use crate::detect::is_game_dir;
use crate::logging::{log_info, log_warning};

const GAME_LIBRARY_SUBPATH: &str = "steamapps/common/OMORI";

/// Find the Steam installation path.
#[cfg(windows)]
pub fn find_steam_path() -> Option<PathBuf> {
    use winreg::enums::HKEY_CURRENT_USER;
    use winreg::RegKey;

    let key = RegKey::predef(HKEY_CURRENT_USER)
        .open_subkey("SOFTWARE\\Valve\\Steam")
        .ok()?;
    let path: String = key.get_value("SteamPath").ok()?;
    Some(PathBuf::from(path))
}

/// Find the Steam installation path.
///
/// Checks common locations for native, Flatpak, and Snap Steam installs.
#[cfg(not(windows))]
pub fn find_steam_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;

    let steam_paths = [
        format!("{}/.steam/steam", home),
        format!("{}/.local/share/Steam", home),
        format!("{}/.var/app/com.valvesoftware.Steam/.steam/steam", home),
        format!("{}/snap/steam/common/.steam/steam", home),
    ];

    steam_paths.iter().map(PathBuf::from).find(|p| p.exists())
}

/// Find the OMORI game directory under any Steam library.
pub fn find_game_dir(steam_path: &Path) -> Option<PathBuf> {
    let default_dir = steam_path.join(GAME_LIBRARY_SUBPATH);
    if is_game_dir(&default_dir) {
        log_info(&format!("Game found at {:?}", default_dir));
        return Some(default_dir);
    }

    let library_file = steam_path.join("steamapps/libraryfolders.vdf");
    let contents = match fs::read_to_string(&library_file) {
        Ok(contents) => contents,
        Err(_) => {
            log_warning(&format!("No library map at {:?}", library_file));
            return None;
        }
    };

    for library in library_paths(&contents) {
        if !library.is_absolute() || !library.exists() {
            continue;
        }
        let candidate = library.join(GAME_LIBRARY_SUBPATH);
        if is_game_dir(&candidate) {
            log_info(&format!("Game found at {:?}", candidate));
            return Some(candidate);
        }
    }

    None
}

/// Extract the `"path"` values from a libraryfolders.vdf document.
///
/// The file is VDF, but all we need are the quoted values of `path` keys;
/// escaped backslashes in Windows paths are unescaped.
fn library_paths(contents: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for line in contents.lines() {
        let fields: Vec<&str> = line.trim().split('"').collect();
        // a key/value line splits as ["", key, separator, value, ""]
        if fields.len() >= 4 && fields[1] == "path" {
            paths.push(PathBuf::from(fields[3].replace("\\\\", "\\")));
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_paths_parsing() {
        let vdf = r#"
"libraryfolders"
{
	"0"
	{
		"path"		"/home/user/.local/share/Steam"
		"label"		""
	}
	"1"
	{
		"path"		"D:\\SteamLibrary"
	}
}
"#;
        let paths = library_paths(vdf);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/home/user/.local/share/Steam"),
                PathBuf::from(r"D:\SteamLibrary"),
            ]
        );
    }

    #[test]
    fn test_library_paths_ignores_other_keys() {
        let vdf = "\"label\"\t\t\"path\"\n\"apps\"\n{\n}\n";
        assert!(library_paths(vdf).is_empty());
    }

    #[test]
    fn test_find_game_dir_in_secondary_library() {
        let steam = tempfile::tempdir().unwrap();
        let library = tempfile::tempdir().unwrap();

        let game = library.path().join(GAME_LIBRARY_SUBPATH);
        fs::create_dir_all(&game).unwrap();
        fs::write(game.join("OMORI.exe"), "").unwrap();

        fs::create_dir_all(steam.path().join("steamapps")).unwrap();
        fs::write(
            steam.path().join("steamapps/libraryfolders.vdf"),
            format!(
                "\"libraryfolders\"\n{{\n\t\"0\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n}}\n",
                library.path().display()
            ),
        )
        .unwrap();

        assert_eq!(find_game_dir(steam.path()), Some(game));
    }

    #[test]
    fn test_find_game_dir_absent() {
        let steam = tempfile::tempdir().unwrap();
        assert_eq!(find_game_dir(steam.path()), None);
    }
}
