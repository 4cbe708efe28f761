use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured detection rule as carried in SCCM exports, cart items, and
/// deployment configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectionRule {
    Msi {
        product_code: String,
    },
    File {
        path: String,
        file_or_folder: String,
    },
    Registry {
        key_path: String,
        value_name: Option<String>,
    },
}

/// Where a resolved detection rule set or command pair came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigSource {
    SccmPreserved,
    WingetDefault,
    Synthesized,
}

/// Cart item payload. The two deployment paths are statically distinguished;
/// every consumer matches exhaustively instead of probing optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartPayload {
    Win32 {
        winget_id: String,
        version: Option<String>,
        install_command: Option<String>,
        uninstall_command: Option<String>,
        detection_rules: Vec<DetectionRule>,
        detection_source: ConfigSource,
        command_source: ConfigSource,
    },
    Store {
        store_product_id: String,
    },
}

/// Deployment configuration carried by an update policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub display_name: Option<String>,
    pub publisher: Option<String>,
    pub architecture: Option<String>,
    pub installer_type: Option<String>,
    pub install_command: Option<String>,
    pub uninstall_command: Option<String>,
    pub install_scope: Option<String>,
    #[serde(default)]
    pub detection_rules: Vec<DetectionRule>,
    #[serde(default)]
    pub assignments: Option<Value>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub migrate_assignments: bool,
}

/// Assembled input descriptor handed to the packaging dispatch collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInputs {
    pub display_name: String,
    pub publisher: Option<String>,
    pub version: String,
    pub installer_url: String,
    pub installer_sha256: Option<String>,
    pub silent_switches: Option<String>,
    pub detection_rules: Vec<DetectionRule>,
    pub assignments: Option<Value>,
    pub categories: Vec<String>,
    pub force_create: bool,
}

/// Silent-install switches for an installer, preferring an explicit install
/// command from the deployment config over installer-type defaults.
pub fn silent_switches(install_command: Option<&str>, installer_type: Option<&str>) -> Option<String> {
    if let Some(command) = install_command {
        if let Some((_, switches)) = split_command(command) {
            if !switches.is_empty() {
                return Some(switches);
            }
        }
    }

    match installer_type.map(|t| t.to_ascii_lowercase()).as_deref() {
        Some("msi") | Some("wix") => Some("/qn /norestart".to_string()),
        Some("inno") => Some("/VERYSILENT /NORESTART".to_string()),
        Some("nullsoft") => Some("/S".to_string()),
        Some("burn") | Some("exe") => Some("/quiet /norestart".to_string()),
        _ => None,
    }
}

/// Splits "installer.exe /a /b" into the executable and its switch string.
/// Handles a quoted executable path with embedded spaces.
fn split_command(command: &str) -> Option<(String, String)> {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix('"') {
        let end = rest.find('"')?;
        let exe = rest[..end].to_string();
        let switches = rest[end + 1..].trim().to_string();
        return Some((exe, switches));
    }

    match trimmed.split_once(' ') {
        Some((exe, switches)) => Some((exe.to_string(), switches.trim().to_string())),
        None => Some((trimmed.to_string(), String::new())),
    }
}
