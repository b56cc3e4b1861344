//! GOPROXY protocol client

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::DEFAULT_PROXY_URL;
use crate::module::error::ProxyError;
use crate::module::path::escape_path;
use crate::module::proxy::ModuleProxy;
use crate::module::types::Module;

/// Header asking the proxy not to fetch a module it has not cached yet
const DISABLE_FETCH_HEADER: &str = "Disable-Module-Fetch";

/// Body prefix the proxy uses for modules that do not exist
const NOT_FOUND_PREFIX: &str = "not found: ";

/// Client for the `/@v/list` endpoint of a GOPROXY-compatible server
pub struct GoProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl GoProxyClient {
    /// Creates a new GoProxyClient with a custom base URL
    pub fn new(base_url: &str) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gcu/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client for the public Go module proxy
    pub fn public() -> Result<Self, ProxyError> {
        Self::new(DEFAULT_PROXY_URL)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl ModuleProxy for GoProxyClient {
    async fn query(&self, module_path: &str, cached: bool) -> Result<Option<Module>, ProxyError> {
        let escaped = escape_path(module_path)?;
        let url = format!("{}/{}/@v/list", self.base_url, escaped);

        let mut request = self.client.get(&url);
        if cached {
            request = request.header(DISABLE_FETCH_HEADER, "true");
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.inspect_err(|e| {
            warn!("Failed to read proxy response for {}: {}", module_path, e);
        })?;

        if !status.is_success() {
            if status == StatusCode::GONE && body.starts_with(NOT_FOUND_PREFIX) {
                debug!("Module not found on proxy: {}", module_path);
                return Ok(None);
            }

            warn!("Proxy returned status {}: {}", status, url);
            let message = body.trim_end();
            let message = if message.is_empty() {
                status.to_string()
            } else {
                message.to_string()
            };
            return Err(ProxyError::Registry(message));
        }

        if body.is_empty() {
            debug!("Proxy returned an empty list for {}", module_path);
            return Ok(None);
        }

        let versions: Vec<String> = body
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.to_string())
            .collect();
        debug!("Proxy listed {} versions for {}", versions.len(), module_path);

        Ok(Some(Module::new(module_path, versions)))
    }
}
