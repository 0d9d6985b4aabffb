#![deny(clippy::unwrap_used)]
#![warn(clippy::all, clippy::perf, clippy::missing_const_for_fn)]
#![deny(missing_docs)]
//!Crate for mesh types, decoders and encoders shared between the viewer core and its front ends

/// Error types
pub mod error;

/// Load in model files
pub mod loader;

/// Write models back out
pub mod exporter;

/// Settings types
pub mod settings;

/// Common shared types
pub mod types;

/// Messages for IPC
pub mod messages;

/// Utilities Functions
pub mod utils;

/// Handles input
pub mod input;

/// the standard imports for the shared crate
pub mod prelude;
