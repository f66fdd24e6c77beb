//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`FerrySettings::default()`]
//! 2. If `~/.ferry/settings.json` exists, deep-merge user values over
//!    defaults
//! 3. Apply environment variable overrides (highest priority)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::FerrySettings;

/// Resolve the path to the settings file (`~/.ferry/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_owned());
    PathBuf::from(home).join(".ferry").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<FerrySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<FerrySettings> {
    let defaults = serde_json::to_value(FerrySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: FerrySettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `FERRY_*` environment variable overrides.
///
/// Invalid values are silently ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut FerrySettings) {
    if let Some(v) = read_env_string("FERRY_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u64("FERRY_PORT", 1, 65_535) {
        #[allow(clippy::cast_possible_truncation)]
        {
            settings.server.port = v as u16;
        }
    }
    if let Some(v) = read_env_string("FERRY_DATA_DIR") {
        settings.files.data_dir = Some(v);
    }
    if let Some(v) = read_env_u64("FERRY_MAX_UPLOAD_BYTES", 0, u64::MAX) {
        settings.files.max_upload_bytes = v;
    }
    if let Some(v) = read_env_u64("FERRY_HEARTBEAT_TIMEOUT_SECS", 1, 86_400) {
        #[allow(clippy::cast_possible_wrap)]
        {
            settings.presence.heartbeat_timeout_secs = v as i64;
        }
    }
    if let Some(v) = read_env_u64("FERRY_SWEEP_INTERVAL_SECS", 1, 3600) {
        settings.presence.sweep_interval_secs = v;
    }
    if let Some(v) = read_env_u64("FERRY_SESSION_TTL_SECS", 1, 31_536_000) {
        #[allow(clippy::cast_possible_wrap)]
        {
            settings.presence.session_ttl_secs = v as i64;
        }
    }
    if let Some(v) = read_env_string("FERRY_AUTH_PIN") {
        settings.security.auth_pin = Some(v);
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    std::env::var(name)
        .ok()?
        .parse::<u64>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn merge_nested_objects() {
        let target = json!({"server": {"host": "0.0.0.0", "port": 5000}});
        let source = json!({"server": {"port": 8080}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["host"], "0.0.0.0");
        assert_eq!(merged["server"]["port"], 8080);
    }

    #[test]
    fn merge_replaces_arrays() {
        let target = json!({"exts": ["a", "b", "c"]});
        let source = json!({"exts": ["z"]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["exts"], json!(["z"]));
    }

    #[test]
    fn merge_skips_nulls() {
        let target = json!({"keep": 1});
        let source = json!({"keep": null, "add": 2});
        let merged = deep_merge(target, source);
        assert_eq!(merged["keep"], 1);
        assert_eq!(merged["add"], 2);
    }

    #[test]
    fn merge_adds_new_keys() {
        let target = json!({});
        let source = json!({"fresh": {"nested": true}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["fresh"]["nested"], true);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings =
            load_settings_from_path(Path::new("/nonexistent/ferry-settings.json")).unwrap();
        assert_eq!(settings.server.port, 5000);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"server": {{"port": 9000}}, "presence": {{"sweepIntervalSecs": 5}}}}"#
        )
        .unwrap();
        let settings = load_settings_from_path(file.path()).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.presence.sweep_interval_secs, 5);
        // Untouched keys keep their defaults.
        assert_eq!(settings.presence.heartbeat_timeout_secs, 30);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_settings_from_path(file.path()).is_err());
    }

    #[test]
    fn env_u64_rejects_out_of_range() {
        // Helper behavior; actual env vars are process-global, so only the
        // parsing path is exercised here.
        assert_eq!(read_env_u64("FERRY_TEST_UNSET_VAR", 1, 10), None);
    }
}
