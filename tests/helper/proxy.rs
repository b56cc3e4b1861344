//! In-memory module proxy

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use gcu::module::error::ProxyError;
use gcu::module::{Module, ModuleProxy};

/// Mock proxy serving fixed version lists and recording queried paths
#[derive(Default)]
pub struct MockProxy {
    versions: HashMap<String, Vec<String>>,
    queries: Mutex<Vec<String>>,
}

impl MockProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versions(mut self, module_path: &str, versions: Vec<&str>) -> Self {
        self.versions.insert(
            module_path.to_string(),
            versions.into_iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Paths queried so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModuleProxy for MockProxy {
    async fn query(&self, module_path: &str, _cached: bool) -> Result<Option<Module>, ProxyError> {
        self.queries.lock().unwrap().push(module_path.to_string());
        Ok(self
            .versions
            .get(module_path)
            .map(|versions| Module::new(module_path, versions.clone())))
    }
}
