//! WinDbg primitive type names.

use std::collections::HashMap;
use std::sync::LazyLock;

/// `dt` primitive name -> Windows SDK type name.
static KNOWN_TYPES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("void", "VOID"),
        ("Void", "VOID"),
        ("Char", "CHAR"),
        ("UChar", "UCHAR"),
        ("Wchar", "WCHAR"),
        ("Int2B", "SHORT"),
        ("Uint2B", "USHORT"),
        ("Int4B", "LONG"),
        ("Uint4B", "ULONG"),
        ("Int8B", "LONGLONG"),
        ("Uint8B", "ULONGLONG"),
        ("Float", "FLOAT"),
        ("Double", "DOUBLE"),
    ])
});

/// Look up the SDK name for a WinDbg primitive.
pub fn known_type(name: &str) -> Option<&'static str> {
    KNOWN_TYPES.get(name).copied()
}

/// Iterate over all known `(windbg, sdk)` pairs in no particular order.
pub fn known_types() -> impl Iterator<Item = (&'static str, &'static str)> {
    KNOWN_TYPES.iter().map(|(k, v)| (*k, *v))
}
