use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Image2List";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// File holding the persisted checklist.
pub const CHECKLIST_FILE: &str = "checklist.json";
/// File holding the last captured photo.
pub const IMAGE_FILE: &str = "saved_image.jpg";

/// Get the application data directory.
/// Platform data dir (e.g. ~/.local/share/Image2List); falls back to the
/// system temp dir when the platform reports none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Get the persisted checklist path
pub fn checklist_path() -> PathBuf {
    app_data_dir().join(CHECKLIST_FILE)
}

/// Get the persisted photo path
pub fn image_path() -> PathBuf {
    app_data_dir().join(IMAGE_FILE)
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "image2list=debug,image2list_lib=debug,info"
    } else {
        "image2list=info,image2list_lib=info,warn"
    }
}
