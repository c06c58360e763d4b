mod common;

use common::{PeBuilder, SCN_CODE};
use mzlayout::error::{DecodeError, MzError};
use mzlayout::regions::{compute_regions, find_region, SectionInfo, SegmentKind, StructureRef};
use mzlayout::structures::{pe, StructureCatalog};
use mzlayout::{Buffer, ImageLayout, PeLayout};
use proptest::prelude::*;

fn assert_partition(regions: &[mzlayout::Region], len: u64) {
    let mut expected = 0;
    for r in regions {
        assert_eq!(r.address, expected, "gap or overlap before {}", r);
        expected = r.end();
    }
    assert_eq!(expected, len);
    assert_eq!(regions.iter().map(|r| r.length).sum::<u64>(), len);
}

/// Non-overlapping sections in shuffled order over a mostly zero buffer.
fn layout() -> impl Strategy<Value = (Vec<u8>, Vec<SectionInfo>)> {
    (
        0u64..0x400,
        prop::collection::vec((0u64..3, 1u64..0x300), 1..7),
        0u64..0x200,
    )
        .prop_flat_map(|(start, extents, tail)| {
            let mut cursor = start;
            let mut sections = Vec::with_capacity(extents.len());
            for (i, (gap, size)) in extents.into_iter().enumerate() {
                cursor += gap * 0x80;
                sections.push(SectionInfo::raw(&format!(".s{}", i), cursor, size));
                cursor += size;
            }
            let len = (cursor + tail) as usize;
            (
                prop::collection::vec(prop_oneof![3 => Just(0u8), 1 => any::<u8>()], len),
                Just(sections).prop_shuffle(),
            )
        })
}

/// A layout plus eight occurrence addresses inside its buffer.
fn layout_with_occurrences() -> impl Strategy<Value = (Vec<u8>, Vec<SectionInfo>, Vec<u64>)> {
    layout().prop_flat_map(|(data, sections)| {
        let len = data.len() as u64;
        (
            Just(data),
            Just(sections),
            prop::collection::vec(0..len, 8),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn layouts_partition_the_buffer((data, sections) in layout()) {
        let regions = compute_regions(&data, &sections, &[]).unwrap();
        assert_partition(&regions, data.len() as u64);

        let section_count = regions.iter().filter(|r| r.is_section()).count();
        prop_assert_eq!(section_count, sections.len());
        prop_assert_eq!(regions[0].segment(), Some(SegmentKind::Header));
        for r in &regions {
            if r.is_section() {
                prop_assert!(!r.suppressible);
            }
        }
    }

    #[test]
    fn occurrences_attach_to_their_region((data, sections, addresses) in layout_with_occurrences()) {
        let refs: Vec<StructureRef> = addresses
            .iter()
            .map(|&a| StructureRef::new(a, pe::IMAGE_SECTION_HEADER))
            .collect();
        let regions = compute_regions(&data, &sections, &refs).unwrap();

        prop_assert_eq!(regions.iter().map(|r| r.children.len()).sum::<usize>(), refs.len());
        for r in &regions {
            for child in &r.children {
                prop_assert!(r.contains(child.address));
            }
        }
        for sref in &refs {
            let region = find_region(&regions, sref.address).unwrap();
            prop_assert!(region.children.contains(sref));
        }
    }

    #[test]
    fn layout_is_independent_of_section_order((data, mut sections) in layout()) {
        let a = compute_regions(&data, &sections, &[]).unwrap();
        sections.reverse();
        let b = compute_regions(&data, &sections, &[]).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[test]
fn zero_filled_segments_are_suppressible() {
    let mut data = vec![0u8; 0x900];
    data[0..2].copy_from_slice(b"MZ");
    let sections = [SectionInfo::raw(".a", 0x200, 0x100), SectionInfo::raw(".b", 0x400, 0x100)];
    let regions = compute_regions(&data, &sections, &[]).unwrap();

    let kinds: Vec<(u64, Option<SegmentKind>, bool)> = regions
        .iter()
        .map(|r| (r.address, r.segment(), r.suppressible))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (0, Some(SegmentKind::Header), false),
            (0x200, None, false),
            (0x300, Some(SegmentKind::Gap), true),
            (0x400, None, false),
            (0x500, Some(SegmentKind::Overlay), true),
        ]
    );
}

#[test]
fn failure_modes() {
    let data = vec![0u8; 0x400];
    assert!(matches!(
        compute_regions(&data, &[], &[]),
        Err(MzError::EmptySectionList)
    ));

    let overlapping = [SectionInfo::raw(".a", 0x100, 0x200), SectionInfo::raw(".b", 0x200, 0x100)];
    assert!(matches!(
        compute_regions(&data, &overlapping, &[]),
        Err(MzError::RegionLayout(_))
    ));

    let sections = [SectionInfo::raw(".a", 0x100, 0x100)];
    let outside = [StructureRef::new(0x400, pe::IMAGE_DOS_HEADER)];
    match compute_regions(&data, &sections, &outside) {
        Err(MzError::Decode(DecodeError::Unmatched { address, type_name })) => {
            assert_eq!(address, 0x400);
            assert_eq!(type_name, pe::IMAGE_DOS_HEADER);
        }
        other => panic!("expected unmatched occurrence, got {:?}", other),
    }
}

#[test]
fn pe_layout_feeds_region_computation() {
    let image = PeBuilder::pe32()
        .section(".text", &[0xC3; 0x30], SCN_CODE)
        .bss(".bss", 0x1000)
        .section(".data", b"values", common::SCN_DATA)
        .overlay(&[0u8; 0x40])
        .build();
    let buf = Buffer::from_vec(image.data.clone());
    let layout = PeLayout::parse(&buf, StructureCatalog::builtin()).unwrap();
    assert_eq!(layout.sections().len(), 3);

    let regions = compute_regions(buf.as_slice(), layout.sections(), layout.structures()).unwrap();
    assert_partition(&regions, buf.len() as u64);

    let names: Vec<&str> = regions.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["header", ".text", ".data", "overlay"]);
    assert!(regions[3].suppressible);

    // every header structure lives in the header segment
    assert_eq!(regions[0].children.len(), 3 + 3);
    assert!(regions[1..].iter().all(|r| r.children.is_empty()));
    assert_eq!(regions[1].address, image.section(".text").raw_offset as u64);
}
