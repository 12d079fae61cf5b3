// src/cli/handlers/mod.rs

// One module per command.

pub mod assistant;
pub mod browse;
pub mod commons;
pub mod config;
pub mod copy;
pub mod exec;
pub mod export;
pub mod info;
pub mod manager;
pub mod print;
pub mod sync;
