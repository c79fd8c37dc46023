//! netslice - network slice controller
//!
//! Keeps VPLS, VPRN and EPIPE services on a fleet of routers synchronized
//! with a declared intent. An intent is expanded into per-router work,
//! rendered into gNMI configuration documents, pushed over a device session,
//! and periodically checked for drift.

pub mod cli;
pub mod config;
pub mod device;
pub mod drift;
pub mod engine;
pub mod intent;
pub mod logging;
pub mod payload;
