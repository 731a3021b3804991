#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Conversion must never panic, whatever the text
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(structure) = dt2c_types::parse_structure(text) {
            let _ = structure.leaf_count();
            let _ = dt2c_types::render_structure(&structure);
        }
    }
});
