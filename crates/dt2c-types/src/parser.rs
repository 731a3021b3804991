//! Field line parser.
//!
//! Parses a single `dt` field line into a flat [`Field`]:
//!
//! ```text
//! +0x018 Ldr              : Ptr64 _PEB_LDR_DATA
//! +0x003 IsProtectedProcess : Pos 1, 1 Bit
//! +0x2c0 Reserved         : [16] UChar
//! ```
//!
//! Grouping lines into unions and packs is the job of
//! [`grouping`](crate::grouping); this module never produces either.

use std::fmt;

use crate::builtin::known_type;
use crate::error::{ParseError, ParseResult};
use crate::types::*;

const OFFSET_PREFIX: &str = "+0x";
const BITFIELD_PREFIX: &str = "Pos";
const POINTER_TOKENS: [&str; 2] = ["Ptr64", "Ptr32"];

/// One field line of a dump.
///
/// The offset is parsed when the line is created so the grouping engine can
/// compare offsets without handling errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpLine<'a> {
    /// 1-based line number in the original input.
    pub number: usize,
    /// Trimmed line text.
    pub text: &'a str,
    /// Byte offset from the `+0x` prefix.
    pub offset: u64,
}

impl<'a> DumpLine<'a> {
    /// Wrap a trimmed, non-blank field line, parsing its offset.
    pub fn new(number: usize, text: &'a str) -> ParseResult<Self> {
        let offset = parse_offset(text).ok_or_else(|| ParseError::MalformedOffset {
            line: number,
            text: text.to_string(),
        })?;
        Ok(Self {
            number,
            text,
            offset,
        })
    }

    /// Type description after the `:` delimiter, if there is one.
    pub fn description(&self) -> Option<&'a str> {
        self.text.split_once(':').map(|(_, desc)| desc.trim())
    }

    /// Whether the type description is a `Pos <n>, <m> Bits` bitfield spec.
    pub fn is_bitfield(&self) -> bool {
        self.description()
            .is_some_and(|desc| desc.starts_with(BITFIELD_PREFIX))
    }

    /// Parse this line into a flat field.
    pub fn parse(&self) -> ParseResult<Field> {
        parse_field_line(self.number, self.text)
    }
}

/// Parse the hex offset of a field line (`+0x01c Name : ...` gives `0x1c`).
pub fn parse_offset(line: &str) -> Option<u64> {
    let rest = line.strip_prefix(OFFSET_PREFIX)?;
    let hex = rest.split(char::is_whitespace).next().unwrap_or(rest);
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(hex, 16).ok()
}

/// Parse one trimmed field line.
///
/// `line` is only used for error reporting.
pub fn parse_field_line(line: usize, text: &str) -> ParseResult<Field> {
    let offset = parse_offset(text).ok_or_else(|| ParseError::MalformedOffset {
        line,
        text: text.to_string(),
    })?;

    let (head, desc) = text
        .split_once(':')
        .ok_or_else(|| ParseError::MissingDelimiter {
            line,
            text: text.to_string(),
        })?;
    let desc = desc.trim();

    // Name sits between the offset and the next run of whitespace.
    let name = head
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ParseError::MissingName {
            line,
            text: text.to_string(),
        })?
        .to_string();

    if let Some(spec) = desc.strip_prefix(BITFIELD_PREFIX) {
        let (bit_position, bit_length) =
            parse_bitfield_spec(spec).ok_or_else(|| ParseError::MalformedBitfieldSpec {
                line,
                text: text.to_string(),
            })?;
        return Ok(Field::Bitfield(BitfieldMember::new(
            name,
            offset,
            bit_position,
            bit_length,
        )));
    }

    let (length, element) = match desc.strip_prefix('[') {
        Some(subscript) => {
            let (length, rest) =
                parse_subscript(subscript).ok_or_else(|| ParseError::MalformedArraySpec {
                    line,
                    text: text.to_string(),
                })?;
            (Some(length), rest)
        }
        None => (None, desc),
    };

    let type_ref = resolve_type(element).ok_or_else(|| ParseError::MissingType {
        line,
        text: text.to_string(),
    })?;
    let type_name = type_ref.to_string();

    Ok(match length {
        Some(length) => Field::Array(ArrayMember {
            name,
            type_name,
            offset,
            length,
        }),
        None => Field::Simple(Member {
            name,
            type_name,
            offset,
        }),
    })
}

/// Parse `" 3, 2 Bits"` (the text after `Pos`) into `(3, 2)`.
fn parse_bitfield_spec(spec: &str) -> Option<(u32, u32)> {
    let (pos, len) = spec.split_once(',')?;
    let pos = pos.trim().parse().ok()?;

    let len = len.trim_start();
    let digits = len.find(|c: char| !c.is_ascii_digit()).unwrap_or(len.len());
    let (len, unit) = len.split_at(digits);
    let len: u32 = len.parse().ok()?;
    let unit = unit.trim();
    if len == 0 || !(unit.is_empty() || unit == "Bit" || unit == "Bits") {
        return None;
    }
    Some((pos, len))
}

/// Parse `"16] UChar"` (the text after `[`) into `(16, "UChar")`.
fn parse_subscript(subscript: &str) -> Option<(u64, &str)> {
    let (length, rest) = subscript.split_once(']')?;
    let length = length.trim().parse().ok()?;
    Some((length, rest.trim()))
}

/// A resolved type reference: an SDK base name plus pointer depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Base type after table lookup or underscore stripping.
    pub base: String,
    /// Number of `Ptr64`/`Ptr32` tokens stripped.
    pub pointer_depth: usize,
}

impl fmt::Display for TypeRef {
    /// `PCHAR*` style: one `P` prefix, then a `*` per extra level.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer_depth == 0 {
            return f.write_str(&self.base);
        }
        write!(f, "P{}", self.base)?;
        for _ in 1..self.pointer_depth {
            f.write_str("*")?;
        }
        Ok(())
    }
}

/// Resolve a type description with any array subscript already removed.
///
/// Returns `None` if nothing but pointer tokens remain.
pub fn resolve_type(desc: &str) -> Option<TypeRef> {
    let mut pointer_depth = 0;
    let mut base = Vec::new();
    for token in desc.split_whitespace() {
        if POINTER_TOKENS.contains(&token) {
            pointer_depth += 1;
        } else {
            base.push(token);
        }
    }
    if base.is_empty() {
        return None;
    }

    let base = base.join(" ");
    let base = match known_type(&base) {
        Some(sdk) => sdk.to_string(),
        None => base.strip_prefix('_').unwrap_or(&base).to_string(),
    };

    Some(TypeRef {
        base,
        pointer_depth,
    })
}
