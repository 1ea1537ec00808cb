/*!
 * Core Module
 * Shared types, error taxonomy, limits and synchronization primitives
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use config::CompatConfig;
pub use errors::*;
pub use types::*;
