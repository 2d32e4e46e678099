//! Platform-specific application directories.

use std::path::PathBuf;

const APP_DIR_NAME: &str = "recital-core";

/// Directory where the desktop adapters keep their databases.
///
/// Falls back to `~/.local/share` and finally to the working directory when
/// the platform reports no data directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
        })
        .join(APP_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_is_app_scoped() {
        assert!(default_data_dir().ends_with(APP_DIR_NAME));
    }
}
