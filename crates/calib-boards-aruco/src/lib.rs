//! ArUco marker dictionaries used to draw ChArUco boards.
//!
//! This crate only carries the code tables and per-bit access needed by a
//! renderer. Marker detection and decoding are out of scope.

pub mod builtins;
mod dictionary;

pub use builtins::{builtin_dictionary, BUILTIN_NAMES, DEFAULT_DICTIONARY};
pub use dictionary::Dictionary;
