//! Common test utilities and helpers.
//!
//! Integration tests synthesise their own PE images with [`PeBuilder`]
//! instead of depending on sample binaries.

#![allow(dead_code)]

pub const FILE_ALIGNMENT: u32 = 0x200;
pub const SECTION_ALIGNMENT: u32 = 0x1000;
pub const E_LFANEW: usize = 0x80;
pub const FILE_HEADER_OFFSET: usize = E_LFANEW + 4;
pub const OPTIONAL_HEADER_OFFSET: usize = FILE_HEADER_OFFSET + 20;
pub const IMAGE_BASE_32: u64 = 0x40_0000;
pub const IMAGE_BASE_64: u64 = 0x1_4000_0000;

pub const SCN_CODE: u32 = 0x6000_0020;
pub const SCN_DATA: u32 = 0xC000_0040;
pub const SCN_RDATA: u32 = 0x4000_0040;

fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut [u8], at: usize, v: u64) {
    buf[at..at + 8].copy_from_slice(&v.to_le_bytes());
}

fn align_up(v: usize, to: usize) -> usize {
    v.div_ceil(to) * to
}

#[derive(Debug, Clone)]
pub enum Import {
    Name(&'static str),
    Ordinal(u16),
}

#[derive(Debug, Clone)]
struct SectionPlan {
    name: &'static str,
    data: Vec<u8>,
    virtual_size: Option<u32>,
    raw_size: Option<u32>,
    characteristics: u32,
}

/// Placement of a built section, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltSection {
    pub name: &'static str,
    pub raw_offset: usize,
    pub raw_size: usize,
    pub virtual_address: u32,
}

#[derive(Debug, Clone)]
pub struct BuiltImage {
    pub data: Vec<u8>,
    pub sections: Vec<BuiltSection>,
    pub section_table_offset: usize,
    pub headers_size: usize,
}

impl BuiltImage {
    pub fn section(&self, name: &str) -> &BuiltSection {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("no section {}", name))
    }
}

/// Minimal PE32 / PE32+ image writer.
///
/// Sections follow the headers at file alignment in declaration order,
/// then the import and export sections, then the overlay.
#[derive(Debug, Clone)]
pub struct PeBuilder {
    bits64: bool,
    timestamp: u32,
    sections: Vec<SectionPlan>,
    imports: Vec<(&'static str, Vec<Import>)>,
    exports: Option<(&'static str, Vec<&'static str>)>,
    overlay: Vec<u8>,
}

impl PeBuilder {
    pub fn pe32() -> Self {
        Self {
            bits64: false,
            timestamp: 0x5E46_6B16,
            sections: Vec::new(),
            imports: Vec::new(),
            exports: None,
            overlay: Vec::new(),
        }
    }

    pub fn pe32_plus() -> Self {
        Self {
            bits64: true,
            ..Self::pe32()
        }
    }

    pub fn timestamp(mut self, ts: u32) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn section(mut self, name: &'static str, data: &[u8], characteristics: u32) -> Self {
        self.sections.push(SectionPlan {
            name,
            data: data.to_vec(),
            virtual_size: None,
            raw_size: None,
            characteristics,
        });
        self
    }

    /// Section whose header declares `raw_size` regardless of its data.
    pub fn section_with_raw_size(mut self, name: &'static str, data: &[u8], raw_size: u32) -> Self {
        self.sections.push(SectionPlan {
            name,
            data: data.to_vec(),
            virtual_size: None,
            raw_size: Some(raw_size),
            characteristics: SCN_DATA,
        });
        self
    }

    /// Uninitialized section with no raw bytes.
    pub fn bss(mut self, name: &'static str, virtual_size: u32) -> Self {
        self.sections.push(SectionPlan {
            name,
            data: Vec::new(),
            virtual_size: Some(virtual_size),
            raw_size: Some(0),
            characteristics: 0xC000_0080,
        });
        self
    }

    pub fn import(mut self, dll: &'static str, symbols: Vec<Import>) -> Self {
        self.imports.push((dll, symbols));
        self
    }

    pub fn exports(mut self, dll: &'static str, names: Vec<&'static str>) -> Self {
        self.exports = Some((dll, names));
        self
    }

    pub fn overlay(mut self, data: &[u8]) -> Self {
        self.overlay = data.to_vec();
        self
    }

    fn pointer_size(&self) -> usize {
        if self.bits64 {
            8
        } else {
            4
        }
    }

    fn optional_header_size(&self) -> usize {
        if self.bits64 {
            0xF0
        } else {
            0xE0
        }
    }

    fn import_section(&self, rva: u32) -> Vec<u8> {
        let ptr = self.pointer_size();
        let descriptors = (self.imports.len() + 1) * 20;
        let mut out = vec![0u8; descriptors];

        for (i, (dll, symbols)) in self.imports.iter().enumerate() {
            let thunks = (symbols.len() + 1) * ptr;
            let ilt = out.len();
            out.resize(ilt + thunks, 0);
            let iat = out.len();
            out.resize(iat + thunks, 0);

            let name = out.len();
            out.extend_from_slice(dll.as_bytes());
            out.push(0);

            for (j, symbol) in symbols.iter().enumerate() {
                let value: u64 = match symbol {
                    Import::Ordinal(ord) => (1u64 << (ptr * 8 - 1)) | u64::from(*ord),
                    Import::Name(sym) => {
                        if out.len() % 2 == 1 {
                            out.push(0);
                        }
                        let hint = out.len();
                        out.extend_from_slice(&(j as u16).to_le_bytes());
                        out.extend_from_slice(sym.as_bytes());
                        out.push(0);
                        u64::from(rva) + hint as u64
                    }
                };
                for table in [ilt, iat] {
                    let at = table + j * ptr;
                    if ptr == 8 {
                        put_u64(&mut out, at, value);
                    } else {
                        put_u32(&mut out, at, value as u32);
                    }
                }
            }

            let d = i * 20;
            put_u32(&mut out, d, rva + ilt as u32);
            put_u32(&mut out, d + 12, rva + name as u32);
            put_u32(&mut out, d + 16, rva + iat as u32);
        }
        out
    }

    fn export_section(&self, rva: u32, code_rva: u32) -> Vec<u8> {
        let Some((dll, names)) = &self.exports else {
            return Vec::new();
        };
        let n = names.len();
        let functions = 40;
        let name_ptrs = functions + n * 4;
        let ordinals = name_ptrs + n * 4;
        let mut out = vec![0u8; ordinals + n * 2];

        let dll_name = out.len();
        out.extend_from_slice(dll.as_bytes());
        out.push(0);

        put_u32(&mut out, 4, self.timestamp);
        put_u32(&mut out, 12, rva + dll_name as u32);
        put_u32(&mut out, 16, 1);
        put_u32(&mut out, 20, n as u32);
        put_u32(&mut out, 24, n as u32);
        put_u32(&mut out, 28, rva + functions as u32);
        put_u32(&mut out, 32, rva + name_ptrs as u32);
        put_u32(&mut out, 36, rva + ordinals as u32);

        for (i, name) in names.iter().enumerate() {
            let at = out.len();
            out.extend_from_slice(name.as_bytes());
            out.push(0);
            put_u32(&mut out, functions + i * 4, code_rva + i as u32 * 0x10);
            put_u32(&mut out, name_ptrs + i * 4, rva + at as u32);
            put_u16(&mut out, ordinals + i * 2, i as u16);
        }
        out
    }

    pub fn build(&self) -> BuiltImage {
        let mut plans = self.sections.clone();
        let first_rva = SECTION_ALIGNMENT;
        let next_rva = |count: usize| first_rva + count as u32 * SECTION_ALIGNMENT;

        let mut import_dir = None;
        if !self.imports.is_empty() {
            let rva = next_rva(plans.len());
            let data = self.import_section(rva);
            import_dir = Some((rva, (self.imports.len() + 1) as u32 * 20));
            plans.push(SectionPlan {
                name: ".idata",
                data,
                virtual_size: None,
                raw_size: None,
                characteristics: SCN_DATA,
            });
        }
        let mut export_dir = None;
        if self.exports.is_some() {
            let rva = next_rva(plans.len());
            let data = self.export_section(rva, first_rva);
            export_dir = Some((rva, data.len() as u32));
            plans.push(SectionPlan {
                name: ".edata",
                data,
                virtual_size: None,
                raw_size: None,
                characteristics: SCN_RDATA,
            });
        }

        let opt_size = self.optional_header_size();
        let section_table = OPTIONAL_HEADER_OFFSET + opt_size;
        let headers_size = align_up(section_table + plans.len() * 40, FILE_ALIGNMENT as usize);

        let mut sections = Vec::with_capacity(plans.len());
        let mut raw_offset = headers_size;
        for (i, plan) in plans.iter().enumerate() {
            let raw_size = match plan.raw_size {
                Some(size) => size as usize,
                None => align_up(plan.data.len().max(1), FILE_ALIGNMENT as usize),
            };
            sections.push(BuiltSection {
                name: plan.name,
                raw_offset,
                raw_size,
                virtual_address: next_rva(i),
            });
            raw_offset += align_up(raw_size, FILE_ALIGNMENT as usize);
        }

        let mut data = vec![0u8; raw_offset];

        // DOS header
        data[0..2].copy_from_slice(b"MZ");
        put_u16(&mut data, 2, 0x90);
        put_u16(&mut data, 4, 3);
        put_u32(&mut data, 0x3C, E_LFANEW as u32);
        data[0x40..0x4E].copy_from_slice(b"This program \x00");

        // NT headers
        data[E_LFANEW..E_LFANEW + 4].copy_from_slice(b"PE\0\0");
        let fh = FILE_HEADER_OFFSET;
        put_u16(&mut data, fh, if self.bits64 { 0x8664 } else { 0x14C });
        put_u16(&mut data, fh + 2, plans.len() as u16);
        put_u32(&mut data, fh + 4, self.timestamp);
        put_u16(&mut data, fh + 16, opt_size as u16);
        put_u16(&mut data, fh + 18, if self.bits64 { 0x0022 } else { 0x0102 });

        let oh = OPTIONAL_HEADER_OFFSET;
        put_u16(&mut data, oh, if self.bits64 { 0x20B } else { 0x10B });
        put_u32(&mut data, oh + 16, first_rva);
        put_u32(&mut data, oh + 20, first_rva);
        if self.bits64 {
            put_u64(&mut data, oh + 24, IMAGE_BASE_64);
        } else {
            put_u32(&mut data, oh + 28, IMAGE_BASE_32 as u32);
        }
        put_u32(&mut data, oh + 32, SECTION_ALIGNMENT);
        put_u32(&mut data, oh + 36, FILE_ALIGNMENT);
        put_u32(&mut data, oh + 56, next_rva(plans.len()));
        put_u32(&mut data, oh + 60, headers_size as u32);
        put_u16(&mut data, oh + 68, 3);
        let (count_at, dirs_at) = if self.bits64 { (108, 112) } else { (92, 96) };
        put_u32(&mut data, oh + count_at, 16);
        let dirs = oh + dirs_at;
        if let Some((rva, size)) = export_dir {
            put_u32(&mut data, dirs, rva);
            put_u32(&mut data, dirs + 4, size);
        }
        if let Some((rva, size)) = import_dir {
            put_u32(&mut data, dirs + 8, rva);
            put_u32(&mut data, dirs + 12, size);
        }

        for (i, (plan, built)) in plans.iter().zip(&sections).enumerate() {
            let sh = section_table + i * 40;
            let name = plan.name.as_bytes();
            data[sh..sh + name.len()].copy_from_slice(name);
            let vsize = plan.virtual_size.unwrap_or(plan.data.len() as u32);
            put_u32(&mut data, sh + 8, vsize);
            put_u32(&mut data, sh + 12, built.virtual_address);
            put_u32(&mut data, sh + 16, built.raw_size as u32);
            put_u32(&mut data, sh + 20, built.raw_offset as u32);
            put_u32(&mut data, sh + 36, plan.characteristics);

            let len = plan.data.len().min(built.raw_size);
            data[built.raw_offset..built.raw_offset + len].copy_from_slice(&plan.data[..len]);
        }

        data.extend_from_slice(&self.overlay);
        BuiltImage {
            data,
            sections,
            section_table_offset: section_table,
            headers_size,
        }
    }
}

/// Two-section PE32 with imports, exports and an overlay.
pub fn sample_pe32() -> BuiltImage {
    PeBuilder::pe32()
        .section(".text", b"\x55\x8b\xec\x33\xc0\x5d\xc3", SCN_CODE)
        .section(".data", b"Hello, world!\0\0\0H\0i\0 \0t\0h\0e\0r\0e\0\0\0", SCN_DATA)
        .import(
            "KERNEL32.dll",
            vec![Import::Name("ExitProcess"), Import::Name("GetStdHandle")],
        )
        .import("WS2_32.dll", vec![Import::Ordinal(23)])
        .exports("sample.dll", vec!["Alpha", "Beta"])
        .overlay(b"OVERLAYDATA")
        .build()
}
