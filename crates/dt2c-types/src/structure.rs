//! Structure building from a complete dump.

use tracing::{debug, warn};

use crate::error::ParseResult;
use crate::grouping::group_fields;
use crate::parser::DumpLine;
use crate::render::{RenderConfig, Renderer};
use crate::types::Structure;

/// Whether a trimmed line is a `module!Type` header.
pub fn is_header(line: &str) -> bool {
    line.contains('!')
}

/// Structure name from a header line.
///
/// Takes the token after the first `!` and strips one leading underscore:
/// `ntdll!_PEB` and `0:000> dt ntdll!_PEB` both give `PEB`.
pub fn header_name(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once('!')?;
    let name = rest.split_whitespace().next()?;
    let name = name.strip_prefix('_').unwrap_or(name);
    (!name.is_empty()).then_some(name)
}

/// Parse a complete dump into a [`Structure`].
///
/// A dump without a header still parses; the structure is left unnamed and
/// rendering it fails with [`ParseError::UnknownHeader`](crate::ParseError::UnknownHeader).
pub fn parse_structure(text: &str) -> ParseResult<Structure> {
    let mut name = None;
    let mut lines = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_header(line) {
            match header_name(line) {
                Some(found) if name.is_none() => {
                    debug!(line = index + 1, name = found, "header");
                    name = Some(found.to_string());
                }
                _ => warn!(line = index + 1, text = line, "ignoring header line"),
            }
            continue;
        }
        lines.push(DumpLine::new(index + 1, line)?);
    }

    let fields = group_fields(&lines)?;
    debug!(lines = lines.len(), fields = fields.len(), "grouped dump");

    Ok(Structure { name, fields })
}

/// Parse a dump and render it as a C typedef with the default layout.
pub fn convert(text: &str) -> ParseResult<String> {
    convert_with(text, &RenderConfig::default())
}

/// Parse a dump and render it with `config`.
pub fn convert_with(text: &str, config: &RenderConfig) -> ParseResult<String> {
    let structure = parse_structure(text)?;
    Renderer::new(config.clone()).render(&structure)
}
