// Irradose - core/mod.rs
//
// Core business logic layer: table model, delimited-text staging, sentinel
// resolution, decay integration, isotope table, and report rendering.
// Must NOT depend on: platform or app, or touch the filesystem directly.

pub mod delimited;
pub mod integrate;
pub mod isotope;
pub mod model;
pub mod report;
pub mod resolver;
