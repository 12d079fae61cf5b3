// src/core/mod.rs

pub mod assistant;
pub mod config;
pub mod errors;
pub mod exporter;
pub mod formatter;
pub mod managers;
pub mod parameters;
pub mod paths;
pub mod secrets;
pub mod snippet;
pub mod sync;
pub mod tempdir;
