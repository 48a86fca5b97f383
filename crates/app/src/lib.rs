//! Battant application layer: remote resource services, the batch applier
//! and the wiring the `battant` CLI runs on.

pub mod applier;
pub mod config;
pub mod context;
pub mod logging;
pub mod resources;
