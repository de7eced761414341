pub mod checks;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod fixtures;
pub mod image;
pub mod runtime;
pub mod services;
pub mod suite;
pub mod tag;

pub use anyhow::Result;
pub use error::HarnessError;
