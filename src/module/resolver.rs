//! Latest release resolution across major versions
//!
//! A module's newest release may live under a different path than the one
//! in go.mod (`example.com/mod` → `example.com/mod/v2` → `example.com/mod/v3`).
//! The resolver walks forward one major at a time until the proxy has no
//! further major to offer.

use tracing::debug;

use crate::config::RESOLVE_LIMIT;
use crate::module::error::ResolveError;
use crate::module::proxy::ModuleProxy;
use crate::module::types::Module;
use crate::module::version;

/// State of the forward walk
#[derive(Debug, Clone, PartialEq, Eq)]
enum ProbeState {
    /// Probe the next-major path of the current module
    Probing,
    /// The next-major path was missing; probe the same major by its bare suffix
    FallbackProbe(String),
    /// The current module is the latest
    Done,
    /// The walk did not settle within [`RESOLVE_LIMIT`] probes
    BoundExceeded,
}

/// Path to probe when the next-major path does not exist.
///
/// A module whose latest release is `+incompatible` was published without
/// a major suffix. Later releases of that same major may have moved to the
/// suffixed path once the module gained a go.mod, so that path is probed
/// with the bare major. Returns `None` if it is the path already resolved.
fn fallback_path(current: &Module) -> Option<String> {
    let latest = current.max_version("", true)?;
    if !version::is_incompatible(&latest) {
        return None;
    }

    let path = current.version_path(&version::major(&latest));
    (path != current.path).then_some(path)
}

/// Resolves the module holding the newest release reachable from `module_path`.
///
/// The returned module's `max_version` is the true latest release.
pub async fn resolve_latest(
    proxy: &dyn ModuleProxy,
    module_path: &str,
    cached: bool,
) -> Result<Module, ResolveError> {
    let mut current = proxy
        .query(module_path, cached)
        .await?
        .ok_or_else(|| ResolveError::NotFound(module_path.to_string()))?;

    let mut probes = 0;
    let mut state = ProbeState::Probing;

    loop {
        state = match state {
            ProbeState::Probing if probes == RESOLVE_LIMIT => ProbeState::BoundExceeded,
            ProbeState::Probing => {
                probes += 1;
                match current.next_major_path() {
                    None => ProbeState::Done,
                    Some(next_path) => match proxy.query(&next_path, cached).await? {
                        Some(next) => {
                            debug!("{} advanced to {}", current.path, next.path);
                            current = next;
                            ProbeState::Probing
                        }
                        None => fallback_path(&current)
                            .map(ProbeState::FallbackProbe)
                            .unwrap_or(ProbeState::Done),
                    },
                }
            }
            ProbeState::FallbackProbe(path) => match proxy.query(&path, cached).await? {
                Some(next) => {
                    debug!("{} advanced to fallback path {}", current.path, next.path);
                    current = next;
                    ProbeState::Probing
                }
                None => ProbeState::Done,
            },
            ProbeState::Done => return Ok(current),
            ProbeState::BoundExceeded => return Err(ResolveError::TooManyRequests),
        };
    }
}
