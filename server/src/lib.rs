//! AssetDesk server
//!
//! Filtered, paged listings over entities declared in configuration, served
//! as a small JSON API on top of SQLite.

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
