#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

/// One well-formed field line with fuzzed offset and description.
#[derive(Debug, Arbitrary)]
struct FuzzedLine {
    offset: u8,
    kind: FuzzedKind,
}

#[derive(Debug, Arbitrary)]
enum FuzzedKind {
    Plain(u8),
    Pointer { depth: u8, base: u8 },
    Array { length: u16, base: u8 },
    Bitfield { position: u8, length: u8 },
}

const BASES: [&str; 8] = [
    "UChar", "Uint2B", "Int4B", "Uint8B", "Void", "Wchar", "_LIST_ENTRY", "_KTHREAD",
];

fn base(index: u8) -> &'static str {
    BASES[index as usize % BASES.len()]
}

impl FuzzedLine {
    fn render(&self, index: usize) -> String {
        let description = match &self.kind {
            FuzzedKind::Plain(b) => base(*b).to_string(),
            FuzzedKind::Pointer { depth, base: b } => {
                let mut s = "Ptr64 ".repeat((*depth % 4) as usize);
                s.push_str(base(*b));
                s
            }
            FuzzedKind::Array { length, base: b } => format!("[{}] {}", length, base(*b)),
            FuzzedKind::Bitfield { position, length } => {
                format!("Pos {}, {} Bits", position % 64, (length % 64) + 1)
            }
        };
        // Small offsets so that unions and packs actually form
        format!("   +0x{:03x} F{:<12} : {}\n", self.offset % 16, index, description)
    }
}

fuzz_target!(|lines: Vec<FuzzedLine>| {
    let mut text = String::from("nt!_FUZZED\n");
    for (i, line) in lines.iter().enumerate() {
        text.push_str(&line.render(i));
    }

    // Well-formed lines always group and render
    let structure = dt2c_types::parse_structure(&text).expect("well-formed dump");
    assert_eq!(structure.leaf_count(), lines.len());
    let _ = dt2c_types::render_structure(&structure).expect("named structure");
});
