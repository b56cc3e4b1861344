pub mod binary;
pub mod check;
pub mod config;
pub mod logging;
pub mod manifest;
pub mod module;
pub mod rewrite;
pub mod upgrade;
