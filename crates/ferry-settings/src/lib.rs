//! # ferry-settings
//!
//! Configuration management with layered sources for the Ferry server.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`FerrySettings::default()`]
//! 2. **User file** — `~/.ferry/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `FERRY_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton, initialized on first access.
static SETTINGS: OnceLock<FerrySettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.ferry/settings.json` with env
/// var overrides; falls back to compiled defaults if loading fails.
pub fn get_settings() -> &'static FerrySettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with a specific value.
///
/// # Errors
///
/// Returns the provided settings back if the global was already
/// initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: FerrySettings) -> std::result::Result<(), FerrySettings> {
    SETTINGS.set(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = FerrySettings::default();
        assert_eq!(settings.name, "ferry");
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.presence.heartbeat_timeout_secs, 30);
        assert_eq!(settings.presence.sweep_interval_secs, 10);
        assert_eq!(settings.presence.session_ttl_secs, 86_400);
        assert_eq!(settings.files.max_upload_bytes, 0);
        assert!(settings.files.allowed_extensions.contains(&"pdf".to_owned()));
        assert!(settings.security.auth_enabled);
        assert_eq!(settings.security.auth_pin.as_deref(), Some("1234"));
    }

    #[test]
    fn deep_merge_re_exported() {
        let a = serde_json::json!({"x": 1});
        let b = serde_json::json!({"y": 2});
        let merged = deep_merge(a, b);
        assert_eq!(merged["x"], 1);
        assert_eq!(merged["y"], 2);
    }
}
