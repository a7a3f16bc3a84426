//! Komet library crate
//!
//! Exposes the engine and lab modules so the lab binary and external
//! tooling can drive generation without going through CLI startup.

pub mod config;
pub mod engine;
pub mod generate;
pub mod git_ops;
pub mod lab;
pub mod logger;
pub mod normalize;
pub mod prompt;
pub mod providers;
pub mod types;
pub mod validate;
