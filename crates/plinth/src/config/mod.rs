//! # Configuration Abstractions
//!
//! Layered configuration loading and the shared configuration blocks
//! consumed by Plinth backends.

pub mod loader;
pub mod types;

// Re-export commonly used types
pub use loader::*;
pub use types::*;
