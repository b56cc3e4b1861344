use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Resolution constants
// =============================================================================

/// Upper bound on next-major probes for a single module.
///
/// This counts probe steps, not proxy queries: the initial query and any
/// `+incompatible` fallback queries come on top, so a walk issues at most
/// `1 + 2 * RESOLVE_LIMIT` queries.
pub const RESOLVE_LIMIT: usize = 100;

/// Public Go module proxy
pub const DEFAULT_PROXY_URL: &str = "https://proxy.golang.org";

/// Manifest file marking a module root
pub const MANIFEST_FILE: &str = "go.mod";

/// Environment variable holding the tracing filter
pub const LOG_ENV: &str = "GCU_LOG";

/// gcu configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the module proxy
    pub proxy_url: String,
    /// Only consider releases without a prerelease suffix
    pub stable: bool,
    /// Ask the proxy to answer from its cache only
    pub cached: bool,
    /// Restrict updates to the current major version
    pub safe: bool,
    /// Rewrite import paths after a major upgrade
    pub rewrite: bool,
    /// Run `go mod tidy` after rewriting
    pub tidy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            stable: true,
            cached: false,
            safe: false,
            rewrite: true,
            tidy: true,
        }
    }
}

impl Config {
    /// Loads the configuration file (if any) and applies `GOPROXY`
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        if let Some(url) = std::env::var("GOPROXY")
            .ok()
            .and_then(|value| proxy_from_goproxy(&value))
        {
            config.proxy_url = url;
        }

        Ok(config)
    }

    /// Reads a JSON configuration file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Picks the first HTTP(S) proxy from a GOPROXY list.
///
/// `direct` and `off` entries cannot serve version lists and are ignored.
pub fn proxy_from_goproxy(value: &str) -> Option<String> {
    value
        .split([',', '|'])
        .map(str::trim)
        .find(|entry| entry.starts_with("https://") || entry.starts_with("http://"))
        .map(|entry| entry.trim_end_matches('/').to_string())
}

/// Returns the path to the config directory for gcu.
pub fn config_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::home_dir(),
        ".config",
    )
}

/// Returns the path to the config file.
pub fn config_path() -> PathBuf {
    config_dir().join("gcu.json")
}

/// Returns the path to the data directory for gcu.
/// Uses $XDG_DATA_HOME/gcu if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/gcu,
/// or ./gcu if neither is available.
pub fn data_dir() -> PathBuf {
    dir_with_env(
        std::env::var("XDG_DATA_HOME").ok(),
        dirs::home_dir(),
        ".local/share",
    )
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("gcu.log")
}

/// Returns the directory `go install` writes binaries to.
/// Uses $GOBIN if set, otherwise the `bin` directory of the first $GOPATH
/// entry, falling back to ~/go/bin.
pub fn go_bin_dir() -> PathBuf {
    go_bin_dir_with_env(
        std::env::var("GOBIN").ok(),
        std::env::var("GOPATH").ok(),
        dirs::home_dir(),
    )
}

fn go_bin_dir_with_env(
    gobin: Option<String>,
    gopath: Option<String>,
    home_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(gobin) = gobin.filter(|value| !value.is_empty()) {
        return PathBuf::from(gobin);
    }

    gopath
        .as_deref()
        .and_then(|value| std::env::split_paths(value).next())
        .filter(|path| !path.as_os_str().is_empty())
        .or_else(|| home_dir.map(|home| home.join("go")))
        .unwrap_or_else(|| PathBuf::from("go"))
        .join("bin")
}

fn dir_with_env(xdg_home: Option<String>, home_dir: Option<PathBuf>, fallback: &str) -> PathBuf {
    let base = xdg_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(fallback)))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("gcu")
}
