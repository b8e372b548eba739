//! Face Configuration
//!
//! Static theme, identity and gateway settings consumed read-only by the
//! render pipeline and the connection state machine.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::errors::{FaceError, Result};

/// Theme colors as hex strings ("#rrggbb")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub glow: String,
    pub text: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary: "#3b82f6".to_string(),
            secondary: "#1e40af".to_string(),
            accent: "#fbbf24".to_string(),
            background: "#0f172a".to_string(),
            glow: "#60a5fa".to_string(),
            text: "#ffffff".to_string(),
        }
    }
}

/// Identity display strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub name: String,
    pub tagline: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: "Aura".to_string(),
            tagline: None,
        }
    }
}

/// Gateway connection defaults. The auth token usually arrives via CLI or
/// environment rather than the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub url: Option<String>,

    #[serde(default = "default_session")]
    pub session: String,

    pub token: Option<String>,
}

fn default_session() -> String {
    "main".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            session: default_session(),
            token: None,
        }
    }
}

/// Feature toggles and tuning for the face surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceOptions {
    /// Pupils follow the pointer
    #[serde(default = "default_true")]
    pub eye_tracking: bool,

    /// Weather underlay enabled
    #[serde(default = "default_true")]
    pub weather: bool,

    /// Status line at the top of the surface
    #[serde(default = "default_true")]
    pub show_status: bool,

    /// Response text bubble under the face
    #[serde(default = "default_true")]
    pub show_bubble: bool,

    /// Maximum pupil offset in canvas units
    #[serde(default = "default_eye_offset")]
    pub max_eye_offset: f64,

    /// Scales every behavior profile's particle count (0.0 disables)
    #[serde(default = "default_particle_scale")]
    pub particle_scale: f64,
}

fn default_true() -> bool {
    true
}

fn default_eye_offset() -> f64 {
    4.0
}

fn default_particle_scale() -> f64 {
    1.0
}

impl Default for FaceOptions {
    fn default() -> Self {
        Self {
            eye_tracking: true,
            weather: true,
            show_status: true,
            show_bubble: true,
            max_eye_offset: default_eye_offset(),
            particle_scale: default_particle_scale(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceConfig {
    #[serde(default)]
    pub theme: ThemeConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub face: FaceOptions,
}

impl FaceConfig {
    /// Configuration directory
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "aura", "aura-face")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Data directory (store, avatar history)
    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "aura", "aura-face")
            .map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Default config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }
}

/// Load configuration from an explicit path, or the default location.
/// A missing file yields defaults; a malformed file is an error.
pub fn load_config(path: Option<&Path>) -> Result<FaceConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match FaceConfig::config_path() {
            Some(p) => p,
            None => return Ok(FaceConfig::default()),
        },
    };

    if !path.exists() {
        return Ok(FaceConfig::default());
    }

    let content = fs::read_to_string(&path).map_err(|e| FaceError::ConfigLoadError {
        path: path.clone(),
        message: e.to_string(),
    })?;

    // TOML first, JSON for configs carried over from the web deployment
    if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(&content).map_err(|e| FaceError::ConfigLoadError {
            path,
            message: e.to_string(),
        })
    } else {
        toml::from_str(&content).map_err(|e| FaceError::ConfigLoadError {
            path,
            message: e.to_string(),
        })
    }
}
