//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON. Every section
//! defaults sensibly so a completely empty `{}` file is valid. The server
//! builds its pipeline from one `Config` at startup and never re-reads it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub routes: RoutesConfig,
    pub listing: ListingConfig,
    pub player: PlayerConfig,
    pub transcode: TranscodeConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    ///
    /// Settings that cannot be served at all, such as a reserved prefix of
    /// `/`, are rejected here rather than reported by [`Config::validate`].
    pub fn from_json(json_str: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))?;
        config.routes.check()?;
        Ok(config)
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        for (field, prefix) in [
            ("routes.api_prefix", &self.routes.api_prefix),
            ("routes.assets_prefix", &self.routes.assets_prefix),
        ] {
            if !prefix.starts_with('/') {
                warnings.push(format!("{field} '{prefix}' should start with '/'"));
            }
        }

        let api = self.routes.api_prefix();
        let assets = self.routes.assets_prefix();
        if api == assets || api.starts_with(&format!("{assets}/")) || assets.starts_with(&format!("{api}/")) {
            warnings.push(format!(
                "routes.api_prefix '{api}' and routes.assets_prefix '{assets}' overlap"
            ));
        }

        if let Some(sort) = &self.listing.default_sort {
            let (_, rejected) = crate::sort::SortSpec::parse(sort);
            for token in rejected {
                warnings.push(format!("listing.default_sort: unsupported token {token:?}"));
            }
        }

        if self.transcode.chunk_size < 64 {
            warnings.push(format!(
                "transcode.chunk_size {} is very small; 64 bytes will be used",
                self.transcode.chunk_size
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served as the site root.
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            root: PathBuf::from("."),
        }
    }
}

/// Reserved URL prefixes owned by the API and asset interceptors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    pub api_prefix: String,
    pub assets_prefix: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/_fileforged/api".into(),
            assets_prefix: "/_fileforged/assets".into(),
        }
    }
}

impl RoutesConfig {
    /// API prefix without trailing slash.
    pub fn api_prefix(&self) -> String {
        normalize_prefix(&self.api_prefix)
    }

    /// Asset prefix without trailing slash.
    pub fn assets_prefix(&self) -> String {
        normalize_prefix(&self.assets_prefix)
    }

    /// Reject prefixes that would claim the whole site.
    pub fn check(&self) -> Result<()> {
        for (field, prefix) in [
            ("routes.api_prefix", self.api_prefix()),
            ("routes.assets_prefix", self.assets_prefix()),
        ] {
            if prefix == "/" {
                return Err(Error::Validation(format!(
                    "{field} must not be the site root"
                )));
            }
        }
        Ok(())
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Directory listing behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Sort applied when the request carries no usable `sort` parameter.
    /// `None` means newest first (`-mtime`).
    pub default_sort: Option<String>,
    /// Show entries whose name starts with a dot. Set to `false` to leave
    /// them out of listings.
    pub show_hidden: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_sort: None,
            show_hidden: true,
        }
    }
}

/// Video player page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Stylesheet URLs linked from generated pages. Relative entries are
    /// resolved against the asset prefix.
    pub stylesheets: Vec<String>,
    /// Script URLs linked from generated pages.
    pub scripts: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            stylesheets: vec!["css/style.css".into()],
            scripts: vec!["js/player.js".into()],
        }
    }
}

/// SRT to WebVTT transcoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Bytes pulled from the source file per read.
    pub chunk_size: usize,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self { chunk_size: 8192 }
    }
}
