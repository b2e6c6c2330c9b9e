//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Sync commands
pub mod sync;

// Export commands
pub use general::*;
pub use sync::*;
