//! Reference scenarios for the layout components.

use mzlayout::hexview::{self, AsciiCell, HexCell};
use mzlayout::regions::{compute_regions, SectionInfo, SegmentKind};
use mzlayout::render::{render_structure, FieldRenderer, RenderedRow};
use mzlayout::strings::{extract_ascii, StringFlavor};
use mzlayout::structures::{FieldDescriptor as F, StructureCatalog, StructureType};
use mzlayout::view::{StructureViewState, ViewStateStore};
use mzlayout::StructureRef;

#[test]
fn scenario_a_zero_row() {
    let buf = [0u8; 16];
    let rows: Vec<_> = hexview::render(&buf, 0, 16, 16).unwrap().collect();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.address_label(), "00000000:");
    assert!(row.hex_cells().all(|c| c == HexCell::Zero));
    assert!(row.ascii_cells().all(|c| c == AsciiCell::NonPrintable));
    assert_eq!(row.ascii_text(), ".".repeat(16));
}

#[test]
fn scenario_b_partial_row() {
    let mut buf = b"AAA".to_vec();
    buf.resize(16, 0);
    let row = hexview::render(&buf, 0, 4, 16).unwrap().next().unwrap();

    assert_eq!(row.padding_start, 0);
    assert_eq!(row.data_length(), 4);
    assert_eq!(row.padding_end, 12);
    assert!(row.hex_text().starts_with("41 41 41 00"));
    assert_eq!(row.ascii_text().trim_end(), "AAA.");
}

#[test]
fn scenario_c_single_ascii_string() {
    let buf = b"\x00\x00ABCD\x00\x00";
    let strings: Vec<_> = extract_ascii(buf, 4).collect();
    assert_eq!(strings.len(), 1);
    assert_eq!(strings[0].text, "ABCD");
    assert_eq!(strings[0].offset, 2);
    assert_eq!(strings[0].flavor, StringFlavor::Ascii);
}

#[test]
fn scenario_d_two_sections_and_overlay() {
    let buf = vec![0xAAu8; 0x900];
    let sections = [
        SectionInfo::raw(".two", 0x600, 0x200),
        SectionInfo::raw(".one", 0x200, 0x400),
    ];
    let regions = compute_regions(&buf, &sections, &[]).unwrap();

    let spans: Vec<(u64, u64, &str)> = regions
        .iter()
        .map(|r| (r.address, r.end(), r.name()))
        .collect();
    assert_eq!(
        spans,
        vec![
            (0, 0x200, "header"),
            (0x200, 0x600, ".one"),
            (0x600, 0x800, ".two"),
            (0x800, 0x900, "overlay"),
        ]
    );
    assert_eq!(regions[0].segment(), Some(SegmentKind::Header));
    assert_eq!(regions[3].segment(), Some(SegmentKind::Overlay));
}

static ABC_TYPES: &[StructureType] = &[StructureType {
    name: "ABC",
    size: 8,
    fields: &[F::uint("A", 0, 2), F::uint("B", 2, 2), F::uint("C", 4, 4)],
}];

#[test]
fn scenario_e_minimized_and_expanded() {
    let catalog = StructureCatalog::new(1, ABC_TYPES, &[]).unwrap();
    let mut renderer = FieldRenderer::new();
    renderer.set_key_fields("ABC", ["A", "B"]);

    let buf = [1u8, 0, 2, 0, 3, 0, 0, 0];
    let sref = StructureRef::new(0, "ABC");
    let mut states = ViewStateStore::new();

    let minimized = render_structure(&catalog, &renderer, states.get(&sref), &buf, &sref);
    let names: Vec<&str> = minimized.fields().map(|(name, _, _)| name).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(minimized.rows.last(), Some(&RenderedRow::Ellipsis));

    assert_eq!(states.toggle(&sref), StructureViewState::expanded());
    let expanded = render_structure(&catalog, &renderer, states.get(&sref), &buf, &sref);
    let rows: Vec<(&str, &str, usize)> = expanded.fields().collect();
    assert_eq!(rows, vec![("A", "0x1", 0), ("B", "0x2", 2), ("C", "0x3", 4)]);
    assert!(!expanded.has_ellipsis());
}
