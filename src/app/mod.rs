// Irradose - app/mod.rs
//
// Application layer: input dispatch, the end-to-end calculation pipeline,
// and the background calculation session.
// Dependencies: core and platform layers.

pub mod loader;
pub mod pipeline;
pub mod worker;
