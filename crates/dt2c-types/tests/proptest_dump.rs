//! Property-based tests for dump parsing and grouping.
//!
//! These tests verify that:
//! - Conversion never panics on arbitrary input
//! - Grouping consumes every field line exactly once, in order
//! - Unions always have at least two members
//! - Parsing is deterministic

use proptest::prelude::*;

use dt2c_types::{
    convert, parse_field_line, parse_structure, render_structure, BitfieldStorage, Field,
    Structure,
};

// =============================================================================
// Generators
// =============================================================================

const BASE_TYPES: [&str; 6] = ["UChar", "Uint2B", "Int4B", "Uint8B", "_LIST_ENTRY", "Void"];

/// One generated field line: offset, type selector, extra numeric parameter.
fn arb_line() -> impl Strategy<Value = (u64, usize, u32)> {
    (0u64..6, 0usize..9, 1u32..64)
}

fn describe(kind: usize, param: u32) -> String {
    match kind {
        0..=5 => BASE_TYPES[kind].to_string(),
        6 => format!("Ptr64 {}", BASE_TYPES[param as usize % BASE_TYPES.len()]),
        7 => format!("[{}] UChar", param),
        _ => format!("Pos {}, {} Bits", param % 8, param),
    }
}

/// A dump with unique field names `F0`, `F1`, ... in line order.
fn arb_dump() -> impl Strategy<Value = (String, usize)> {
    prop::collection::vec(arb_line(), 1..40).prop_map(|lines| {
        let mut text = String::from("nt!_GENERATED\n");
        for (i, (offset, kind, param)) in lines.iter().enumerate() {
            text.push_str(&format!(
                "   +0x{:03x} F{:<15} : {}\n",
                offset * 4,
                i,
                describe(*kind, *param)
            ));
        }
        (text, lines.len())
    })
}

fn leaf_names(fields: &[Field], out: &mut Vec<String>) {
    for field in fields {
        match field.name() {
            Some(name) => out.push(name.to_string()),
            None => leaf_names(field.members(), out),
        }
    }
}

fn check_unions(field: &Field) -> Result<(), TestCaseError> {
    if field.is_union() {
        prop_assert!(field.members().len() >= 2, "short union: {:?}", field);
    }
    for member in field.members() {
        check_unions(member)?;
    }
    Ok(())
}

// =============================================================================
// Robustness
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Conversion never panics on arbitrary text.
    #[test]
    fn convert_never_panics(text in "[ -~\n]{0,400}") {
        let _ = convert(&text);
    }

    /// Conversion never panics on text that looks like a dump.
    #[test]
    fn convert_never_panics_on_dump_like_text(
        lines in prop::collection::vec("\\+0x[0-9a-f]{1,3} [A-Za-z]{0,6} ?:? ?(Pos )?[0-9,\\[\\] A-Za-z]{0,12}", 0..20)
    ) {
        let text = format!("nt!_FUZZ\n{}", lines.join("\n"));
        let _ = convert(&text);
    }
}

// =============================================================================
// Grouping Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Every field line ends up in the tree exactly once, in source order.
    #[test]
    fn grouping_preserves_lines((text, count) in arb_dump()) {
        let s = parse_structure(&text).unwrap();
        prop_assert_eq!(s.leaf_count(), count);

        let mut names = Vec::new();
        leaf_names(&s.fields, &mut names);
        let expected: Vec<String> = (0..count).map(|i| format!("F{}", i)).collect();
        prop_assert_eq!(names, expected);
    }

    /// Unions always group at least two members.
    #[test]
    fn unions_have_two_members((text, _) in arb_dump()) {
        let s = parse_structure(&text).unwrap();
        for field in &s.fields {
            check_unions(field)?;
        }
    }

    /// Parsing the same dump twice gives equal trees.
    #[test]
    fn parse_is_deterministic((text, _) in arb_dump()) {
        let a = parse_structure(&text).unwrap();
        let b = parse_structure(&text).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Generated dumps always render.
    #[test]
    fn generated_dumps_render((text, count) in arb_dump()) {
        let out = convert(&text).unwrap();
        prop_assert!(out.starts_with("typedef struct _GENERATED\n{\n"), "bad prologue: {}", out);
        prop_assert!(out.ends_with("} GENERATED, *PGENERATED;\n"), "bad epilogue: {}", out);
        prop_assert!(out.matches("// 0x").count() >= count, "missing offsets: {}", out);
    }

    /// N bitfields sharing one offset, and nothing else there, form one pack.
    #[test]
    fn bitfield_run_collapses_to_pack(n in 2usize..12, offset in 0u64..0x100) {
        let mut text = String::from("nt!_BITS\n");
        for i in 0..n {
            text.push_str(&format!("+0x{:x} B{} : Pos {}, 1 Bit\n", offset, i, i));
        }
        let s = parse_structure(&text).unwrap();
        prop_assert_eq!(s.fields.len(), 1);
        prop_assert!(s.fields[0].is_pack());
        prop_assert_eq!(s.fields[0].members().len(), n);
        prop_assert!(s.fields[0].members().iter().all(Field::is_bitfield));
    }

    /// Plain lines sharing one offset form a union of the same size.
    #[test]
    fn shared_offset_forms_union(n in 2usize..12, offset in 0u64..0x100) {
        let mut text = String::from("nt!_ALTS\n");
        for i in 0..n {
            text.push_str(&format!("+0x{:x} A{} : Uint4B\n", offset, i));
        }
        let s = parse_structure(&text).unwrap();
        prop_assert_eq!(s.fields.len(), 1);
        prop_assert!(s.fields[0].is_union());
        prop_assert_eq!(s.fields[0].members().len(), n);
    }
}

// =============================================================================
// Field Line Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// A single parsed line renders with its name, type and offset.
    #[test]
    fn single_line_round_trip(
        offset in 0u64..0x10000,
        name in "[A-Z][A-Za-z0-9]{0,20}",
        kind in 0usize..8,
        param in 1u32..64,
    ) {
        let line = format!("+0x{:03x} {} : {}", offset, name, describe(kind, param));
        let field = parse_field_line(1, &line).unwrap();
        prop_assert_eq!(field.offset(), offset);
        prop_assert_eq!(field.name(), Some(name.as_str()));

        let type_name = field.type_name().unwrap().to_string();
        let s = Structure { name: Some("ONE".to_string()), fields: vec![field] };
        let out = render_structure(&s).unwrap();
        let comment = format!("// {:#x}", offset);
        let decl = format!("{} {}", type_name, name);
        prop_assert!(out.contains(&decl), "missing `{}` in {}", decl, out);
        prop_assert!(out.contains(&comment), "missing `{}` in {}", comment, out);
    }

    /// Bitfield storage never shrinks as the width grows, and always fits.
    #[test]
    fn bitfield_storage_monotonic(a in 1u32..=64, b in 1u32..=64) {
        let (lo, hi) = (a.min(b), a.max(b));
        prop_assert!(BitfieldStorage::for_width(lo) <= BitfieldStorage::for_width(hi));
        prop_assert!(BitfieldStorage::for_width(hi).size() * 8 >= hi as usize);
    }
}
