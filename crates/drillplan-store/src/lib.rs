//! drillplan-store: Durable progress storage and configuration.
//!
//! Implements the `ProgressStore` trait over a JSON file and loads the
//! `drillplan.toml` configuration that selects and tunes the store.

pub mod config;
pub mod json_file;

pub use config::{create_store, load_config_from, DrillplanConfig, StoreKind};
pub use json_file::JsonFileStore;
