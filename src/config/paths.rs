//! Platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (`settings.toml`):
//!   Windows: %APPDATA%\sarcasm-detect\
//!   macOS:   ~/Library/Application Support/sarcasm-detect/
//!   Linux:   ~/.config/sarcasm-detect/

use std::path::PathBuf;

/// Holds the resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "sarcasm-detect";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (containers without `$HOME`, for instance).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
