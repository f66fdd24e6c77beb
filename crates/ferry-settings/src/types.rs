//! Settings type definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default upload extension allow-list.
const DEFAULT_EXTENSIONS: &[&str] = &[
    "txt", "pdf", "png", "jpg", "jpeg", "gif", "mp4", "mp3", "doc", "docx", "xls", "xlsx", "zip",
    "rar", "avi", "mov", "wmv", "flv", "webm", "mkv", "wav", "aac", "ogg", "ppt", "pptx",
];

/// Root settings object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FerrySettings {
    /// Settings schema version.
    pub version: String,
    /// Application name, shown in startup logging.
    pub name: String,
    /// Network and HTTP settings.
    pub server: ServerSettings,
    /// File storage settings.
    pub files: FileSettings,
    /// Presence and session tuning.
    pub presence: PresenceSettings,
    /// Security settings.
    pub security: SecuritySettings,
}

impl Default for FerrySettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_owned(),
            name: "ferry".to_owned(),
            server: ServerSettings::default(),
            files: FileSettings::default(),
            presence: PresenceSettings::default(),
            security: SecuritySettings::default(),
        }
    }
}

/// Network and HTTP settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Suggested client polling interval for the file list, in seconds.
    pub auto_refresh_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 5000,
            auto_refresh_interval_secs: 10,
        }
    }
}

/// File storage settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileSettings {
    /// Root directory for stored files; `inbound/` and `outbound/` live
    /// under it. `None` means `~/.ferry/files`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Maximum upload size in bytes; `0` means unlimited.
    pub max_upload_bytes: u64,
    /// Upload extension allow-list (lowercase, no dots).
    pub allowed_extensions: Vec<String>,
    /// Default age cutoff for the cleanup endpoint, in hours.
    pub cleanup_default_hours: u64,
}

impl FileSettings {
    /// Resolve the data directory, defaulting to `~/.ferry/files`.
    #[must_use]
    pub fn resolved_data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_owned());
                PathBuf::from(home).join(".ferry").join("files")
            }
        }
    }
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_upload_bytes: 0,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_owned()).collect(),
            cleanup_default_hours: 24,
        }
    }
}

/// Presence and session tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresenceSettings {
    /// Seconds without a heartbeat before a device is evicted.
    pub heartbeat_timeout_secs: i64,
    /// Seconds between sweep passes.
    pub sweep_interval_secs: u64,
    /// Session lifetime in seconds.
    pub session_ttl_secs: i64,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            heartbeat_timeout_secs: 30,
            sweep_interval_secs: 10,
            session_ttl_secs: 86_400,
        }
    }
}

/// Security settings.
///
/// The PIN is loaded and surfaced but not enforced anywhere in request
/// handling; the deployment model is a trusted LAN.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecuritySettings {
    /// Whether PIN auth is nominally enabled.
    pub auth_enabled: bool,
    /// The PIN itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_pin: Option<String>,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            auth_enabled: true,
            auth_pin: Some("1234".to_owned()),
        }
    }
}
