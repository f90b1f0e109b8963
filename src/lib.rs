// src/lib.rs

pub mod bootstrap;
pub mod config;
pub mod core;

// Re-export
pub use crate::bootstrap::{BootstrapReport, run};
pub use crate::core::BootstrapError;
