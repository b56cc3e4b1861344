//! Proxy trait for fetching module version lists

#[cfg(test)]
use mockall::automock;

use crate::module::error::ProxyError;
use crate::module::types::Module;

/// Trait for querying a module proxy
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ModuleProxy: Send + Sync {
    /// Fetches the version list for a module path
    ///
    /// # Arguments
    /// * `module_path` - Full module path including any major suffix
    /// * `cached` - Ask the proxy to answer from its cache without fetching upstream
    ///
    /// # Returns
    /// * `Ok(Some(Module))` - The module and its versions (unsorted)
    /// * `Ok(None)` - The proxy knows no versions for this path
    /// * `Err(ProxyError)` - The request failed
    async fn query(&self, module_path: &str, cached: bool) -> Result<Option<Module>, ProxyError>;
}
