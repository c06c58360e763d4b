//! Built-in PE record types and enumerations.

use super::schema::{EnumType, FieldDescriptor as F, StructureType};

pub const IMAGE_DOS_HEADER: &str = "IMAGE_DOS_HEADER";
pub const IMAGE_FILE_HEADER: &str = "IMAGE_FILE_HEADER";
pub const IMAGE_DATA_DIRECTORY: &str = "IMAGE_DATA_DIRECTORY";
pub const IMAGE_OPTIONAL_HEADER32: &str = "IMAGE_OPTIONAL_HEADER32";
pub const IMAGE_OPTIONAL_HEADER64: &str = "IMAGE_OPTIONAL_HEADER64";
pub const IMAGE_SECTION_HEADER: &str = "IMAGE_SECTION_HEADER";
pub const IMAGE_EXPORT_DIRECTORY: &str = "IMAGE_EXPORT_DIRECTORY";
pub const IMAGE_IMPORT_DESCRIPTOR: &str = "IMAGE_IMPORT_DESCRIPTOR";

pub const IMAGE_FILE_MACHINE: &str = "IMAGE_FILE_MACHINE";
pub const HDR_MAGIC: &str = "HDR_MAGIC";
pub const HDR_SUBSYSTEM: &str = "HDR_SUBSYSTEM";
pub const IMAGE_DIRECTORY_ENTRY: &str = "IMAGE_DIRECTORY_ENTRY";

pub const IMAGE_NUMBEROF_DIRECTORY_ENTRIES: usize = 16;

pub static ENUMS: &[EnumType] = &[
    EnumType {
        name: IMAGE_FILE_MACHINE,
        width: 2,
        members: &[
            ("IMAGE_FILE_MACHINE_UNKNOWN", 0x0),
            ("IMAGE_FILE_MACHINE_I386", 0x14c),
            ("IMAGE_FILE_MACHINE_IA64", 0x200),
            ("IMAGE_FILE_MACHINE_AMD64", 0x8664),
        ],
    },
    EnumType {
        name: HDR_MAGIC,
        width: 2,
        members: &[
            ("IMAGE_NT_OPTIONAL_HDR32_MAGIC", 0x10B),
            ("IMAGE_NT_OPTIONAL_HDR64_MAGIC", 0x20B),
            ("IMAGE_ROM_OPTIONAL_HDR_MAGIC", 0x107),
        ],
    },
    EnumType {
        name: HDR_SUBSYSTEM,
        width: 2,
        members: &[
            ("IMAGE_SUBSYSTEM_UNKNOWN", 0),
            ("IMAGE_SUBSYSTEM_NATIVE", 1),
            ("IMAGE_SUBSYSTEM_WINDOWS_GUI", 2),
            ("IMAGE_SUBSYSTEM_WINDOWS_CUI", 3),
            ("IMAGE_SUBSYSTEM_OS2_CUI", 5),
            ("IMAGE_SUBSYSTEM_POSIX_CUI", 7),
            ("IMAGE_SUBSYSTEM_WINDOWS_CE_GUI", 9),
            ("IMAGE_SUBSYSTEM_EFI_APPLICATION", 10),
            ("IMAGE_SUBSYSTEM_EFI_BOOT_SERVICE_DRIVER", 11),
            ("IMAGE_SUBSYSTEM_EFI_RUNTIME_DRIVER", 12),
            ("IMAGE_SUBSYSTEM_EFI_ROM", 13),
            ("IMAGE_SUBSYSTEM_XBOX", 14),
            ("IMAGE_SUBSYSTEM_WINDOWS_BOOT_APPLICATION", 16),
        ],
    },
    EnumType {
        name: IMAGE_DIRECTORY_ENTRY,
        width: 1,
        members: &[
            ("IMAGE_DIRECTORY_ENTRY_EXPORT", 0),
            ("IMAGE_DIRECTORY_ENTRY_IMPORT", 1),
            ("IMAGE_DIRECTORY_ENTRY_RESOURCE", 2),
            ("IMAGE_DIRECTORY_ENTRY_EXCEPTION", 3),
            ("IMAGE_DIRECTORY_ENTRY_SECURITY", 4),
            ("IMAGE_DIRECTORY_ENTRY_BASERELOC", 5),
            ("IMAGE_DIRECTORY_ENTRY_DEBUG", 6),
            ("IMAGE_DIRECTORY_ENTRY_ARCHITECTURE", 7),
            ("IMAGE_DIRECTORY_ENTRY_GLOBALPTR", 8),
            ("IMAGE_DIRECTORY_ENTRY_TLS", 9),
            ("IMAGE_DIRECTORY_ENTRY_LOAD_CONFIG", 10),
            ("IMAGE_DIRECTORY_ENTRY_BOUND_IMPORT", 11),
            ("IMAGE_DIRECTORY_ENTRY_IAT", 12),
            ("IMAGE_DIRECTORY_ENTRY_DELAY_IMPORT", 13),
            ("IMAGE_DIRECTORY_ENTRY_COM_DESCRIPTOR", 14),
        ],
    },
];

// Nested types must be declared before the types that embed them.
pub static TYPES: &[StructureType] = &[
    StructureType {
        name: IMAGE_DOS_HEADER,
        size: 64,
        fields: &[
            F::uint("e_magic", 0, 2),
            F::uint("e_cblp", 2, 2),
            F::uint("e_cp", 4, 2),
            F::uint("e_crlc", 6, 2),
            F::uint("e_cparhdr", 8, 2),
            F::uint("e_minalloc", 10, 2),
            F::uint("e_maxalloc", 12, 2),
            F::uint("e_ss", 14, 2),
            F::uint("e_sp", 16, 2),
            F::uint("e_csum", 18, 2),
            F::uint("e_ip", 20, 2),
            F::uint("e_cs", 22, 2),
            F::uint("e_lfarlc", 24, 2),
            F::uint("e_ovno", 26, 2),
            F::uint_array("e_res", 28, 2, 4),
            F::uint("e_oemid", 36, 2),
            F::uint("e_oeminfo", 38, 2),
            F::uint_array("e_res2", 40, 2, 10),
            F::uint("e_lfanew", 60, 4),
        ],
    },
    StructureType {
        name: IMAGE_FILE_HEADER,
        size: 20,
        fields: &[
            F::enumerated("Machine", 0, 2, IMAGE_FILE_MACHINE),
            F::uint("NumberOfSections", 2, 2),
            F::uint("TimeDateStamp", 4, 4),
            F::uint("PointerToSymbolTable", 8, 4),
            F::uint("NumberOfSymbols", 12, 4),
            F::uint("SizeOfOptionalHeader", 16, 2),
            F::uint("Characteristics", 18, 2),
        ],
    },
    StructureType {
        name: IMAGE_DATA_DIRECTORY,
        size: 8,
        fields: &[F::uint("VirtualAddress", 0, 4), F::uint("Size", 4, 4)],
    },
    StructureType {
        name: IMAGE_OPTIONAL_HEADER32,
        size: 224,
        fields: &[
            F::enumerated("Magic", 0, 2, HDR_MAGIC),
            F::uint("MajorLinkerVersion", 2, 1),
            F::uint("MinorLinkerVersion", 3, 1),
            F::uint("SizeOfCode", 4, 4),
            F::uint("SizeOfInitializedData", 8, 4),
            F::uint("SizeOfUninitializedData", 12, 4),
            F::uint("AddressOfEntryPoint", 16, 4),
            F::uint("BaseOfCode", 20, 4),
            F::uint("BaseOfData", 24, 4),
            F::uint("ImageBase", 28, 4),
            F::uint("SectionAlignment", 32, 4),
            F::uint("FileAlignment", 36, 4),
            F::uint("MajorOperatingSystemVersion", 40, 2),
            F::uint("MinorOperatingSystemVersion", 42, 2),
            F::uint("MajorImageVersion", 44, 2),
            F::uint("MinorImageVersion", 46, 2),
            F::uint("MajorSubsystemVersion", 48, 2),
            F::uint("MinorSubsystemVersion", 50, 2),
            F::uint("Win32VersionValue", 52, 4),
            F::uint("SizeOfImage", 56, 4),
            F::uint("SizeOfHeaders", 60, 4),
            F::uint("CheckSum", 64, 4),
            F::enumerated("Subsystem", 68, 2, HDR_SUBSYSTEM),
            F::uint("DllCharacteristics", 70, 2),
            F::uint("SizeOfStackReserve", 72, 4),
            F::uint("SizeOfStackCommit", 76, 4),
            F::uint("SizeOfHeapReserve", 80, 4),
            F::uint("SizeOfHeapCommit", 84, 4),
            F::uint("LoaderFlags", 88, 4),
            F::uint("NumberOfRvaAndSizes", 92, 4),
            F::nested(
                "DataDirectory",
                96,
                IMAGE_DATA_DIRECTORY,
                8,
                IMAGE_NUMBEROF_DIRECTORY_ENTRIES,
            ),
        ],
    },
    StructureType {
        name: IMAGE_OPTIONAL_HEADER64,
        size: 240,
        fields: &[
            F::enumerated("Magic", 0, 2, HDR_MAGIC),
            F::uint("MajorLinkerVersion", 2, 1),
            F::uint("MinorLinkerVersion", 3, 1),
            F::uint("SizeOfCode", 4, 4),
            F::uint("SizeOfInitializedData", 8, 4),
            F::uint("SizeOfUninitializedData", 12, 4),
            F::uint("AddressOfEntryPoint", 16, 4),
            F::uint("BaseOfCode", 20, 4),
            F::uint("ImageBase", 24, 8),
            F::uint("SectionAlignment", 32, 4),
            F::uint("FileAlignment", 36, 4),
            F::uint("MajorOperatingSystemVersion", 40, 2),
            F::uint("MinorOperatingSystemVersion", 42, 2),
            F::uint("MajorImageVersion", 44, 2),
            F::uint("MinorImageVersion", 46, 2),
            F::uint("MajorSubsystemVersion", 48, 2),
            F::uint("MinorSubsystemVersion", 50, 2),
            F::uint("Win32VersionValue", 52, 4),
            F::uint("SizeOfImage", 56, 4),
            F::uint("SizeOfHeaders", 60, 4),
            F::uint("CheckSum", 64, 4),
            F::enumerated("Subsystem", 68, 2, HDR_SUBSYSTEM),
            F::uint("DllCharacteristics", 70, 2),
            F::uint("SizeOfStackReserve", 72, 8),
            F::uint("SizeOfStackCommit", 80, 8),
            F::uint("SizeOfHeapReserve", 88, 8),
            F::uint("SizeOfHeapCommit", 96, 8),
            F::uint("LoaderFlags", 104, 4),
            F::uint("NumberOfRvaAndSizes", 108, 4),
            F::nested(
                "DataDirectory",
                112,
                IMAGE_DATA_DIRECTORY,
                8,
                IMAGE_NUMBEROF_DIRECTORY_ENTRIES,
            ),
        ],
    },
    StructureType {
        name: IMAGE_SECTION_HEADER,
        size: 40,
        fields: &[
            F::bytes("Name", 0, 8),
            // Misc.VirtualSize; PhysicalAddress shares the slot
            F::uint("VirtualSize", 8, 4),
            F::uint("VirtualAddress", 12, 4),
            F::uint("SizeOfRawData", 16, 4),
            F::uint("PointerToRawData", 20, 4),
            F::uint("PointerToRelocations", 24, 4),
            F::uint("PointerToLinenumbers", 28, 4),
            F::uint("NumberOfRelocations", 32, 2),
            F::uint("NumberOfLinenumbers", 34, 2),
            F::uint("Characteristics", 36, 4),
        ],
    },
    StructureType {
        name: IMAGE_EXPORT_DIRECTORY,
        size: 40,
        fields: &[
            F::uint("Characteristics", 0, 4),
            F::uint("TimeDateStamp", 4, 4),
            F::uint("MajorVersion", 8, 2),
            F::uint("MinorVersion", 10, 2),
            F::uint("Name", 12, 4),
            F::uint("Base", 16, 4),
            F::uint("NumberOfFunctions", 20, 4),
            F::uint("NumberOfNames", 24, 4),
            F::uint("AddressOfFunctions", 28, 4),
            F::uint("AddressOfNames", 32, 4),
            F::uint("AddressOfNameOrdinals", 36, 4),
        ],
    },
    StructureType {
        name: IMAGE_IMPORT_DESCRIPTOR,
        size: 20,
        fields: &[
            F::uint("OriginalFirstThunk", 0, 4),
            F::uint("TimeDateStamp", 4, 4),
            F::uint("ForwarderChain", 8, 4),
            F::uint("Name", 12, 4),
            F::uint("FirstThunk", 16, 4),
        ],
    },
];
