// LinkHub platform paths
// Config and data directories per OS, selected with `cfg(target_os)`.
//
// - Linux:   $XDG_CONFIG_HOME/linkhub, $XDG_DATA_HOME/linkhub
//            (falling back to ~/.config and ~/.local/share)
// - macOS:   ~/Library/Application Support/LinkHub
// - Windows: %APPDATA%/LinkHub

use std::env;
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// `$var/linkhub` when `var` is set, else `~/<fallback...>/linkhub`.
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(base) if !base.is_empty() => PathBuf::from(base).join("linkhub"),
        _ => fallback
            .iter()
            .fold(home_dir(), |path, part| path.join(part))
            .join("linkhub"),
    }
}

#[cfg(target_os = "macos")]
fn app_support_dir() -> PathBuf {
    home_dir()
        .join("Library")
        .join("Application Support")
        .join("LinkHub")
}

#[cfg(target_os = "windows")]
fn roaming_dir() -> PathBuf {
    let appdata = env::var("APPDATA")
        .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("LinkHub")
}

/// Directory holding `config.json`.
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        app_support_dir()
    }
    #[cfg(target_os = "windows")]
    {
        roaming_dir()
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        xdg_dir("XDG_CONFIG_HOME", &[".config"])
    }
}

/// Directory holding the storage database.
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        app_support_dir()
    }
    #[cfg(target_os = "windows")]
    {
        roaming_dir()
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        xdg_dir("XDG_DATA_HOME", &[".local", "share"])
    }
}

/// Path of the web storage database inside the data directory.
pub fn get_storage_db_path() -> PathBuf {
    get_data_dir().join("storage.db")
}
