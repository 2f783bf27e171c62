// Irradose - platform/mod.rs
//
// Platform abstraction layer: filesystem access, spreadsheet reading,
// platform directories and config.toml.
// Must NOT depend on: app.

pub mod config;
pub mod fs;
pub mod workbook;
