#![no_main]
use libfuzzer_sys::fuzz_target;
use mzlayout::{compute_regions, Buffer, ImageLayout, PeLayout, StructureCatalog};

fuzz_target!(|data: &[u8]| {
    let buf = Buffer::from_vec(data.to_vec());
    if let Ok(layout) = PeLayout::parse(&buf, StructureCatalog::builtin()) {
        let _ = compute_regions(buf.as_slice(), layout.sections(), layout.structures());
        let _ = layout.imports(&buf).map(|i| i.imphash());
        let _ = layout.exports(&buf);
    }
});
