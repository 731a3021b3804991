//! Builtin type-name tables.
//!
//! This module provides the fixed mapping from the primitive type names
//! WinDbg prints in `dt` output to their Windows SDK equivalents.

pub mod windbg;

pub use windbg::{known_type, known_types};
