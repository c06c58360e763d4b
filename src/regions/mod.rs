//! Partition of the buffer into sections and synthesized segments.
//!
//! The result of [`compute_regions`] is contiguous, sorted by address and
//! covers exactly `[0, buffer length)`. Bytes before the first section form
//! the `header` segment, bytes after the last form the `overlay`, and any
//! hole between two sections becomes a `gap`.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{DecodeError, MzError, Result};

/// A structure occurrence: a catalog type at a buffer offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StructureRef {
    pub address: u64,
    pub type_name: &'static str,
}

impl StructureRef {
    pub fn new(address: u64, type_name: &'static str) -> Self {
        Self {
            address,
            type_name,
        }
    }
}

/// Section metadata supplied by the format collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionInfo {
    pub name: String,
    pub raw_offset: u64,
    pub raw_size: u64,
    /// Relative to the image base
    pub virtual_address: u64,
    pub virtual_size: u64,
    pub characteristics: u32,
}

impl SectionInfo {
    /// A section with only a raw range, for tests and synthetic layouts.
    pub fn raw(name: &str, raw_offset: u64, raw_size: u64) -> Self {
        Self {
            name: name.to_string(),
            raw_offset,
            raw_size,
            virtual_address: 0,
            virtual_size: 0,
            characteristics: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Header,
    Gap,
    Overlay,
}

impl SegmentKind {
    pub fn name(&self) -> &'static str {
        match self {
            SegmentKind::Header => "header",
            SegmentKind::Gap => "gap",
            SegmentKind::Overlay => "overlay",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RegionKind {
    Section(SectionInfo),
    Segment(SegmentKind),
}

/// A contiguous byte range of the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub address: u64,
    pub length: u64,
    pub kind: RegionKind,
    /// Structures starting inside this region
    pub children: Vec<StructureRef>,
    /// A segment made up entirely of zero bytes; sections are never suppressible
    pub suppressible: bool,
}

impl Region {
    fn new(address: u64, length: u64, kind: RegionKind) -> Self {
        Self {
            address,
            length,
            kind,
            children: Vec::new(),
            suppressible: false,
        }
    }

    pub fn end(&self) -> u64 {
        self.address + self.length
    }

    pub fn contains(&self, address: u64) -> bool {
        self.address <= address && address < self.end()
    }

    pub fn is_section(&self) -> bool {
        matches!(self.kind, RegionKind::Section(_))
    }

    pub fn section(&self) -> Option<&SectionInfo> {
        match &self.kind {
            RegionKind::Section(s) => Some(s),
            RegionKind::Segment(_) => None,
        }
    }

    pub fn segment(&self) -> Option<SegmentKind> {
        match self.kind {
            RegionKind::Segment(k) => Some(k),
            RegionKind::Section(_) => None,
        }
    }

    /// Section name, or the segment kind.
    pub fn name(&self) -> &str {
        match &self.kind {
            RegionKind::Section(s) => &s.name,
            RegionKind::Segment(k) => k.name(),
        }
    }

    /// `section` or `segment`.
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            RegionKind::Section(_) => "section",
            RegionKind::Segment(_) => "segment",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {:08x}-{:08x}",
            self.name(),
            self.kind_label(),
            self.address,
            self.end()
        )
    }
}

/// Partition `data` into regions and attach structure occurrences.
///
/// Sections are clamped to the buffer; sections with no raw bytes inside
/// the buffer occupy no part of the partition and are skipped. Fails with
/// [`MzError::EmptySectionList`] when no section remains, with
/// [`MzError::RegionLayout`] when sections overlap, and with
/// [`DecodeError::Unmatched`] for an occurrence outside every region.
pub fn compute_regions(
    data: &[u8],
    sections: &[SectionInfo],
    structures: &[StructureRef],
) -> Result<Vec<Region>> {
    let len = data.len() as u64;

    let mut sorted: Vec<&SectionInfo> = sections.iter().collect();
    sorted.sort_by_key(|s| (s.raw_offset, s.raw_size));

    let mut regions: Vec<Region> = Vec::with_capacity(sorted.len() + 2);
    for s in sorted {
        let address = s.raw_offset.min(len);
        let length = s.raw_size.min(len - address);
        if length == 0 {
            debug!(section = %s.name, raw_offset = s.raw_offset, "skipping section without raw data");
            continue;
        }
        regions.push(Region::new(address, length, RegionKind::Section(s.clone())));
    }

    let first = regions.first().ok_or(MzError::EmptySectionList)?.address;
    regions.insert(0, Region::new(0, first, RegionKind::Segment(SegmentKind::Header)));

    let last_end = regions.last().map(Region::end).unwrap_or(0);
    if last_end < len {
        regions.push(Region::new(
            last_end,
            len - last_end,
            RegionKind::Segment(SegmentKind::Overlay),
        ));
    }

    let gaps: Vec<Region> = regions
        .windows(2)
        .filter(|pair| pair[0].end() < pair[1].address)
        .map(|pair| {
            Region::new(
                pair[0].end(),
                pair[1].address - pair[0].end(),
                RegionKind::Segment(SegmentKind::Gap),
            )
        })
        .collect();
    regions.extend(gaps);
    regions.sort_by_key(|r| r.address);

    check_partition(&regions, len)?;

    for region in regions.iter_mut() {
        if !region.is_section() {
            region.suppressible = data[region.address as usize..region.end() as usize]
                .iter()
                .all(|&b| b == 0);
        }
    }

    for sref in structures {
        let region = find_region_mut(&mut regions, sref.address).ok_or_else(|| {
            DecodeError::Unmatched {
                address: sref.address,
                type_name: sref.type_name.to_string(),
            }
        })?;
        region.children.push(sref.clone());
    }

    debug!(
        regions = regions.len(),
        structures = structures.len(),
        bytes = len,
        "computed regions"
    );
    Ok(regions)
}

fn check_partition(regions: &[Region], len: u64) -> Result<()> {
    let mut expected = 0u64;
    for r in regions {
        if r.address != expected {
            return Err(MzError::RegionLayout(format!(
                "{} starts at {:#x}, expected {:#x}",
                r.name(),
                r.address,
                expected
            )));
        }
        expected = r.end();
    }
    if expected != len {
        return Err(MzError::RegionLayout(format!(
            "regions end at {:#x}, buffer length is {:#x}",
            expected, len
        )));
    }
    Ok(())
}

/// The non-empty region containing `address`.
pub fn find_region(regions: &[Region], address: u64) -> Option<&Region> {
    let idx = regions.partition_point(|r| r.end() <= address);
    regions.get(idx).filter(|r| r.contains(address))
}

fn find_region_mut(regions: &mut [Region], address: u64) -> Option<&mut Region> {
    let idx = regions.partition_point(|r| r.end() <= address);
    regions.get_mut(idx).filter(|r| r.contains(address))
}
