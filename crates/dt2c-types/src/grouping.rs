//! Grouping of flat field lines into unions and packs.
//!
//! `dt` output has no block delimiters. Nesting is implied by offsets:
//!
//! - two or more lines sharing one offset form a union, spanning from the
//!   first line to the last line with that offset;
//! - inside a union, a line followed by a larger offset starts a pack (an
//!   anonymous struct) that runs up to the next line back at the union's
//!   offset;
//! - inside a union, consecutive `Pos` lines form a bitfield pack. If that
//!   run is the whole union, the pack replaces the union.
//!
//! Every call works within an exclusive line bound. The top level uses the
//! line count, a union uses its span, and a pack uses the index of the next
//! line at the union's offset, so nested groups never outgrow their parent.
//! Nesting is capped at [`MAX_NESTING`] unions.

use tracing::trace;

use crate::error::{ParseError, ParseResult};
use crate::parser::DumpLine;
use crate::types::{Field, Group};

/// Deepest union nesting accepted before grouping gives up.
pub const MAX_NESTING: usize = 256;

/// Position in the line sequence during grouping.
#[derive(Debug)]
pub struct Cursor<'l, 'a> {
    lines: &'l [DumpLine<'a>],
    pos: usize,
}

impl<'l, 'a> Cursor<'l, 'a> {
    pub fn new(lines: &'l [DumpLine<'a>]) -> Self {
        Self { lines, pos: 0 }
    }

    /// Index of the next unconsumed line.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.lines.len()
    }

    fn current(&self) -> &'l DumpLine<'a> {
        &self.lines[self.pos]
    }

    /// Offset of line `index`, or `None` at or past `limit`.
    fn offset_at(&self, index: usize, limit: usize) -> Option<u64> {
        (index < limit).then(|| self.lines[index].offset)
    }

    /// Parse the current line as a flat field and step past it.
    fn take_flat(&mut self) -> ParseResult<Field> {
        let field = self.current().parse()?;
        self.pos += 1;
        Ok(field)
    }

    /// End (exclusive) of the union starting at the current line, if any.
    ///
    /// The span ends after the last line before `limit` that repeats the
    /// current offset.
    fn union_end(&self, limit: usize) -> Option<usize> {
        let anchor = self.current().offset;
        (self.pos + 1..limit)
            .rev()
            .find(|&i| self.lines[i].offset == anchor)
            .map(|i| i + 1)
    }

    /// Index of the next line after the current one, before `limit`, whose
    /// offset is `anchor`. Falls back to `limit`.
    fn next_at(&self, anchor: u64, limit: usize) -> usize {
        (self.pos + 1..limit)
            .find(|&i| self.lines[i].offset == anchor)
            .unwrap_or(limit)
    }
}

/// Group every line into top-level fields.
pub fn group_fields(lines: &[DumpLine<'_>]) -> ParseResult<Vec<Field>> {
    let mut cursor = Cursor::new(lines);
    let mut fields = Vec::new();
    while !cursor.is_done() {
        fields.push(handle_field(&mut cursor, lines.len())?);
    }
    Ok(fields)
}

/// Consume the next field starting at the cursor, looking no further than
/// `limit`.
///
/// Returns a union, a pack (bitfield-only union), or a single flat field.
pub fn handle_field(cursor: &mut Cursor<'_, '_>, limit: usize) -> ParseResult<Field> {
    handle_nested(cursor, limit, 0)
}

fn handle_nested(cursor: &mut Cursor<'_, '_>, limit: usize, depth: usize) -> ParseResult<Field> {
    let Some(span_end) = cursor.union_end(limit) else {
        return cursor.take_flat();
    };

    if depth >= MAX_NESTING {
        return Err(ParseError::NestingTooDeep {
            line: cursor.current().number,
            limit: MAX_NESTING,
        });
    }

    let start = cursor.position();
    let anchor = cursor.current().offset;
    let span_len = span_end - start;
    trace!(line = cursor.current().number, anchor, span_len, "union");

    let mut union = Group::new(anchor);
    while cursor.position() < span_end {
        let current = cursor.current();
        let next = cursor.offset_at(cursor.position() + 1, span_end);

        if next.is_some_and(|next| current.offset < next) {
            let pack_end = cursor.next_at(anchor, span_end);
            trace!(line = current.number, pack_end, "pack");

            let mut pack = Group::new(current.offset);
            pack.push(cursor.take_flat()?);
            while cursor.position() < pack_end {
                pack.push(handle_nested(cursor, pack_end, depth + 1)?);
            }
            union.push(Field::Pack(pack));
        } else if current.is_bitfield() {
            let mut pack = Group::new(current.offset);
            while cursor.position() < span_end && cursor.current().is_bitfield() {
                pack.push(cursor.take_flat()?);
            }
            trace!(line = current.number, bits = pack.len(), "bitfield run");

            if pack.len() == span_len {
                return Ok(Field::Pack(pack));
            }
            union.push(Field::Pack(pack));
        } else {
            union.push(cursor.take_flat()?);
        }
    }

    Ok(Field::Union(union))
}
