// src/core/mod.rs

pub mod credential;
pub mod errors;
pub mod store;
pub mod validate;

pub use self::errors::BootstrapError;
