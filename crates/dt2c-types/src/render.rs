//! C declaration rendering.
//!
//! Turns a [`Structure`] into a Windows-style typedef:
//!
//! ```text
//! typedef struct _TEST
//! {
//!     UCHAR Flag;                         // 0x0
//!     union
//!     {
//!         ULONG Value;                    // 0x4
//!         struct
//!         {
//!             USHORT Low;                 // 0x4
//!             USHORT High;                // 0x6
//!         };                              // 0x4
//!     };                                  // 0x4
//! } TEST, *PTEST;
//! ```

use crate::error::{ParseError, ParseResult};
use crate::types::{BitfieldMember, BitfieldStorage, Field, Structure};

/// Layout options for rendered declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Spaces per nesting level.
    pub indent_width: usize,
    /// Column at which offset comments start. Longer declarations get a
    /// single separating space.
    pub comment_column: usize,
    /// Emit `: <bits>` after bitfield names. Bitfields that share an offset
    /// then also share one storage type, wide enough for the highest bit.
    pub bitfield_widths: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            comment_column: 40,
            bitfield_widths: false,
        }
    }
}

impl RenderConfig {
    /// Default layout with bitfield widths spelled out.
    pub fn with_bitfield_widths() -> Self {
        Self {
            bitfield_widths: true,
            ..Self::default()
        }
    }
}

/// Renders structures as C typedefs.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a whole structure.
    ///
    /// Fails with [`ParseError::UnknownHeader`] if the structure has no name.
    pub fn render(&self, structure: &Structure) -> ParseResult<String> {
        let name = structure.name.as_deref().ok_or(ParseError::UnknownHeader)?;

        let mut out = format!("typedef struct _{}\n{{\n", name);
        self.render_fields(&structure.fields, 1, &mut out);
        out.push_str(&format!("}} {}, *P{};\n", name, name));
        Ok(out)
    }

    /// Render one field (and its children) at nesting `depth`.
    pub fn render_field(&self, field: &Field, depth: usize, out: &mut String) {
        match field {
            Field::Simple(m) => {
                let decl = format!("{} {};", m.type_name, m.name);
                self.push_line(out, depth, &decl, Some(m.offset));
            }
            Field::Array(a) => {
                let decl = format!("{} {}[{}];", a.type_name, a.name, a.length);
                self.push_line(out, depth, &decl, Some(a.offset));
            }
            Field::Bitfield(b) => self.render_bitfield(b, b.storage, depth, out),
            Field::Union(g) => self.render_group(out, depth, "union", &g.members, g.offset),
            Field::Pack(g) => self.render_group(out, depth, "struct", &g.members, g.offset),
        }
    }

    /// Render sibling fields. With bitfield widths on, each run of bitfields
    /// at one offset is declared with a common storage type.
    fn render_fields(&self, fields: &[Field], depth: usize, out: &mut String) {
        for (index, field) in fields.iter().enumerate() {
            match field {
                Field::Bitfield(b) if self.config.bitfield_widths => {
                    self.render_bitfield(b, unit_storage(fields, index, b), depth, out);
                }
                _ => self.render_field(field, depth, out),
            }
        }
    }

    fn render_bitfield(
        &self,
        b: &BitfieldMember,
        storage: BitfieldStorage,
        depth: usize,
        out: &mut String,
    ) {
        let decl = if self.config.bitfield_widths {
            format!("{} {} : {};", storage.type_name(), b.name, b.bit_length)
        } else {
            format!("{} {};", storage.type_name(), b.name)
        };
        self.push_line(out, depth, &decl, Some(b.offset));
    }

    fn render_group(
        &self,
        out: &mut String,
        depth: usize,
        keyword: &str,
        members: &[Field],
        offset: u64,
    ) {
        self.push_line(out, depth, keyword, None);
        self.push_line(out, depth, "{", None);
        self.render_fields(members, depth + 1, out);
        self.push_line(out, depth, "};", Some(offset));
    }

    fn push_line(&self, out: &mut String, depth: usize, text: &str, offset: Option<u64>) {
        let indent = " ".repeat(depth * self.config.indent_width);
        let line = format!("{}{}", indent, text);
        match offset {
            Some(offset) => {
                let pad = self.config.comment_column.saturating_sub(line.len()).max(1);
                out.push_str(&format!("{}{}// {:#x}\n", line, " ".repeat(pad), offset));
            }
            None => {
                out.push_str(&line);
                out.push('\n');
            }
        }
    }
}

/// Storage type for the bitfield at `index`, covering every adjacent bitfield
/// at the same offset.
fn unit_storage(fields: &[Field], index: usize, bitfield: &BitfieldMember) -> BitfieldStorage {
    let same_unit = |f: &&Field| f.is_bitfield() && f.offset() == bitfield.offset;
    let before = fields[..index].iter().rev().take_while(same_unit);
    let after = fields[index..].iter().take_while(same_unit);

    before
        .chain(after)
        .filter_map(|f| match f {
            Field::Bitfield(b) => Some(BitfieldStorage::for_width(
                b.bit_position.saturating_add(b.bit_length),
            )),
            _ => None,
        })
        .max()
        .unwrap_or(bitfield.storage)
}

/// Render a structure with the default layout.
pub fn render_structure(structure: &Structure) -> ParseResult<String> {
    Renderer::default().render(structure)
}
