//! Device detection from `User-Agent` strings.
//!
//! Classification is deliberately coarse: the roster UI only needs a
//! device class, an OS name, a browser, and a friendly display name.
//! Mobile checks run before desktop checks because mobile user agents
//! also contain desktop OS markers (Android UAs contain "Linux").

use serde::{Deserialize, Serialize};

/// Broad device class shown in the roster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Phones.
    Mobile,
    /// iPads and Android tablets.
    Tablet,
    /// Windows / macOS / Linux browsers.
    Desktop,
    /// Anything we could not classify.
    #[default]
    Unknown,
}

/// Everything Ferry knows about one client device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Device class.
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    /// Operating system name (e.g. `"Android"`, `"macOS"`).
    pub os_name: String,
    /// Browser name.
    pub browser: String,
    /// Browser version, when it could be extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_version: Option<String>,
    /// Hardware-ish name (e.g. `"Samsung Galaxy S Series"`, `"Windows PC"`).
    pub device_name: String,
    /// Friendly name shown in the roster: device plus browser.
    pub display_name: String,
    /// Originating network address, as seen by the server.
    pub source_address: String,
    /// The raw `User-Agent` header this was derived from.
    pub user_agent: String,
}

impl DeviceInfo {
    /// Derive device info from a `User-Agent` header and peer address.
    #[must_use]
    pub fn from_user_agent(user_agent: &str, source_address: &str) -> Self {
        let (kind, os_name, device_name) = classify(user_agent);
        let (browser, browser_version) = detect_browser(user_agent);

        let display_name = match &browser_version {
            Some(v) => format!("{device_name} ({browser} {v})"),
            None => format!("{device_name} ({browser})"),
        };

        Self {
            kind,
            os_name: os_name.to_owned(),
            browser: browser.to_owned(),
            browser_version,
            device_name,
            display_name,
            source_address: source_address.to_owned(),
            user_agent: user_agent.to_owned(),
        }
    }
}

/// Device class, OS, and hardware name from the user agent.
fn classify(ua: &str) -> (DeviceKind, &'static str, String) {
    if ua.contains("Android") {
        let kind = if ua.contains("Tablet") {
            DeviceKind::Tablet
        } else {
            DeviceKind::Mobile
        };
        return (kind, "Android", android_model(ua));
    }
    if ua.contains("iPhone") {
        return (DeviceKind::Mobile, "iOS", "iPhone".to_owned());
    }
    if ua.contains("iPad") {
        return (DeviceKind::Tablet, "iOS", "iPad".to_owned());
    }
    if ua.contains("Windows") {
        return (DeviceKind::Desktop, "Windows", "Windows PC".to_owned());
    }
    if ua.contains("Mac") {
        return (DeviceKind::Desktop, "macOS", "Mac".to_owned());
    }
    if ua.contains("Linux") {
        return (DeviceKind::Desktop, "Linux", "Linux PC".to_owned());
    }
    (DeviceKind::Unknown, "Unknown OS", "Unknown Device".to_owned())
}

/// Vendor bucket for Android hardware. Ordering matters: model prefixes
/// like `SM-` are checked before the generic vendor names.
fn android_model(ua: &str) -> String {
    let model = if ua.contains("iQOO") || ua.contains("IQOO") {
        "iQOO Phone"
    } else if ua.contains("SM-") || ua.contains("Samsung") {
        if ua.contains("SM-G") {
            "Samsung Galaxy S Series"
        } else if ua.contains("SM-N") {
            "Samsung Galaxy Note"
        } else if ua.contains("SM-A") {
            "Samsung Galaxy A Series"
        } else if ua.contains("SM-T") {
            "Samsung Galaxy Tab"
        } else {
            "Samsung Phone"
        }
    } else if ua.contains("Redmi") {
        "Xiaomi Redmi"
    } else if ua.contains("POCO") {
        "POCO Phone"
    } else if ua.contains("Xiaomi") || ua.contains("MI ") {
        "Xiaomi Phone"
    } else if ua.contains("OnePlus") {
        "OnePlus Phone"
    } else if ua.contains("Huawei") {
        "Huawei Phone"
    } else if ua.contains("Pixel") || ua.contains("Google") {
        "Google Pixel"
    } else if ua.contains("Motorola") || ua.contains("Moto") {
        "Motorola Phone"
    } else if ua.contains("OPPO") {
        "OPPO Phone"
    } else if ua.contains("Vivo") {
        "Vivo Phone"
    } else if ua.contains("Realme") {
        "Realme Phone"
    } else {
        "Android Phone"
    };
    model.to_owned()
}

/// Browser name and version. Chrome must be checked before Safari because
/// Chrome UAs also contain "Safari".
fn detect_browser(ua: &str) -> (&'static str, Option<String>) {
    if ua.contains("Edg/") || ua.contains("Edge") {
        return ("Edge", version_after(ua, "Edg/"));
    }
    if ua.contains("Chrome") {
        return ("Chrome", version_after(ua, "Chrome/"));
    }
    if ua.contains("Firefox") {
        return ("Firefox", version_after(ua, "Firefox/"));
    }
    if ua.contains("Safari") {
        return ("Safari", version_after(ua, "Version/"));
    }
    ("Unknown", None)
}

/// Extract the token following `marker`, up to the next space or semicolon.
fn version_after(ua: &str, marker: &str) -> Option<String> {
    let start = ua.find(marker)? + marker.len();
    let rest = &ua[start..];
    let end = rest
        .find(|c: char| c == ' ' || c == ';')
        .unwrap_or(rest.len());
    let version = &rest[..end];
    if version.is_empty() {
        None
    } else {
        Some(version.to_owned())
    }
}
