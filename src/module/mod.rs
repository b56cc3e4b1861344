//! Go module resolution layer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Proxy    │────▶│  Resolver   │     │   Locator   │
//! │  (/@v/list) │     │(major walk) │     │(import path)│
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │                   │
//!        ▼                   ▼                   ▼
//! ┌─────────────────────────────────────────────────────┐
//! │        Path codec / version algebra / Module        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`path`]: Encode/decode major-version suffixes in module paths
//! - [`version`]: Go-flavoured semver helpers
//! - [`types`]: `Module` and max-version selection
//! - [`proxy`]: Proxy trait for fetching version lists
//! - [`go_proxy`]: GOPROXY protocol client
//! - [`resolver`]: Latest release resolution across majors
//! - [`locator`]: Owning-module lookup for import paths
//! - [`error`]: Error types

pub mod error;
pub mod go_proxy;
pub mod locator;
pub mod path;
pub mod proxy;
pub mod resolver;
pub mod types;
pub mod version;

pub use go_proxy::GoProxyClient;
pub use proxy::ModuleProxy;
pub use types::Module;
