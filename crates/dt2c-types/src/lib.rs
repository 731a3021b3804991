//! # dt2c-types
//!
//! WinDbg `dt` dump parsing and C declaration rendering.
//!
//! This crate provides:
//! - A field tree model (simple, array, bitfield, union, pack)
//! - A parser for single `dt` field lines
//! - The grouping engine that infers unions and packs from repeated offsets
//! - A renderer producing `typedef struct` declarations
//!
//! # Example
//!
//! ```
//! let dump = "ntdll!_TEST
//!    +0x000 Flag             : UChar
//!    +0x004 Count            : Int4B
//!    +0x008 Next             : Ptr64 _TEST
//! ";
//!
//! let structure = dt2c_types::parse_structure(dump).unwrap();
//! assert_eq!(structure.name.as_deref(), Some("TEST"));
//!
//! let c = dt2c_types::convert(dump).unwrap();
//! assert!(c.contains("PTEST Next;"));
//! ```

pub mod builtin;
pub mod error;
pub mod grouping;
pub mod parser;
pub mod render;
pub mod structure;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use parser::{parse_field_line, DumpLine, TypeRef};
pub use render::{render_structure, RenderConfig, Renderer};
pub use structure::{convert, convert_with, parse_structure};
pub use types::*;
