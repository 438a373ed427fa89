use crate::error::TrimError;
use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use goblin::elf::header::{
    et_to_str, EI_CLASS, EI_DATA, ELFCLASS64, ELFDATA2LSB, ELFMAG, ET_DYN, ET_EXEC, SELFMAG,
};
use std::io;

pub use goblin::elf::program_header::PT_NULL;
pub use goblin::elf64::header::SIZEOF_EHDR;
pub use goblin::elf64::program_header::SIZEOF_PHDR;

/// Represents the ELF (Executable and Linkable Format) header for a 64-bit object file.
///
/// This structure corresponds to the standard `Elf64_Ehdr` defined in the ELF specification.
/// It appears at the very beginning of every ELF file and contains metadata describing
/// the file's organization and layout.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Ehdr {
    /// ELF identification bytes (magic number and other information).
    ///
    /// The first 4 bytes should be `0x7F`, `'E'`, `'L'`, `'F'`.
    /// Remaining bytes encode class (32/64-bit), endianness, and version.
    pub e_ident: [u8; 16],

    /// Object file type (e.g. relocatable, executable, shared, core).
    ///
    /// Only `ET_EXEC` (2) and `ET_DYN` (3) have a runtime footprint worth
    /// trimming; everything else is rejected up front.
    pub e_type: u16,

    /// Target architecture (e.g., x86_64, ARM).
    pub e_machine: u16,

    /// ELF version (usually set to `EV_CURRENT` = 1).
    pub e_version: u32,

    /// Virtual address of the program entry point.
    pub e_entry: u64,

    /// File offset of the program header table.
    ///
    /// Points to an array of `Elf64Phdr` entries.
    pub e_phoff: u64,

    /// File offset of the section header table.
    ///
    /// Zeroed (together with `e_shnum` and `e_shstrndx`) when the table no
    /// longer fits inside the trimmed file.
    pub e_shoff: u64,

    /// Processor-specific flags.
    pub e_flags: u32,

    /// Size of this ELF header (usually `64` bytes for ELF64).
    pub e_ehsize: u16,

    /// Size of one entry in the program header table.
    pub e_phentsize: u16,

    /// Number of entries in the program header table.
    pub e_phnum: u16,

    /// Size of one entry in the section header table.
    pub e_shentsize: u16,

    /// Number of entries in the section header table.
    pub e_shnum: u16,

    /// Index of the section header string table.
    pub e_shstrndx: u16,
}

impl Elf64Ehdr {
    pub fn from_reader<R: io::Read>(cur: &mut R) -> io::Result<Elf64Ehdr> {
        let mut e_ident = [0u8; 16];
        cur.read_exact(&mut e_ident)?;

        Ok(Elf64Ehdr {
            e_ident,
            e_type: cur.read_u16::<LE>()?,
            e_machine: cur.read_u16::<LE>()?,
            e_version: cur.read_u32::<LE>()?,
            e_entry: cur.read_u64::<LE>()?,
            e_phoff: cur.read_u64::<LE>()?,
            e_shoff: cur.read_u64::<LE>()?,
            e_flags: cur.read_u32::<LE>()?,
            e_ehsize: cur.read_u16::<LE>()?,
            e_phentsize: cur.read_u16::<LE>()?,
            e_phnum: cur.read_u16::<LE>()?,
            e_shentsize: cur.read_u16::<LE>()?,
            e_shnum: cur.read_u16::<LE>()?,
            e_shstrndx: cur.read_u16::<LE>()?,
        })
    }

    /// Serializes the header in the exact on-disk ELF64 little-endian layout.
    pub fn write_to<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.e_ident)?;
        w.write_u16::<LE>(self.e_type)?;
        w.write_u16::<LE>(self.e_machine)?;
        w.write_u32::<LE>(self.e_version)?;
        w.write_u64::<LE>(self.e_entry)?;
        w.write_u64::<LE>(self.e_phoff)?;
        w.write_u64::<LE>(self.e_shoff)?;
        w.write_u32::<LE>(self.e_flags)?;
        w.write_u16::<LE>(self.e_ehsize)?;
        w.write_u16::<LE>(self.e_phentsize)?;
        w.write_u16::<LE>(self.e_phnum)?;
        w.write_u16::<LE>(self.e_shentsize)?;
        w.write_u16::<LE>(self.e_shnum)?;
        w.write_u16::<LE>(self.e_shstrndx)?;
        Ok(())
    }

    /// Validates the magic bytes, the 64-bit little-endian layout, and the
    /// object type.
    pub fn validate(&self) -> Result<(), TrimError> {
        if self.e_ident[..SELFMAG] != *ELFMAG {
            return Err(TrimError::NotElf);
        }

        if self.e_ident[EI_CLASS] != ELFCLASS64 {
            return Err(TrimError::UnsupportedType(
                "32-bit ELF (only ELF64 is supported)".to_string(),
            ));
        }

        if self.e_ident[EI_DATA] != ELFDATA2LSB {
            return Err(TrimError::UnsupportedType(
                "big-endian ELF (only little-endian is supported)".to_string(),
            ));
        }

        if self.e_type != ET_EXEC && self.e_type != ET_DYN {
            return Err(TrimError::UnsupportedType(format!(
                "{} object (only ET_EXEC and ET_DYN can be trimmed)",
                et_to_str(self.e_type)
            )));
        }

        Ok(())
    }

    /// Returns the file offset one past the last program header entry.
    #[inline]
    pub fn phdr_table_end(&self) -> u64 {
        self.e_phoff
            .saturating_add(self.e_phnum as u64 * self.e_phentsize as u64)
    }
}

/// A single program header (segment descriptor) of a 64-bit ELF file,
/// matching the standard `Elf64_Phdr` layout.
///
/// Segments with `p_type == PT_NULL` occupy a table slot but carry no
/// load-time meaning.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64Phdr {
    /// Segment type (`PT_LOAD`, `PT_DYNAMIC`, `PT_NULL`, ...).
    pub p_type: u32,
    /// Segment permission flags.
    pub p_flags: u32,
    /// File offset of the first byte of the segment.
    pub p_offset: u64,
    /// Virtual address of the segment in memory.
    pub p_vaddr: u64,
    /// Physical address, where relevant.
    pub p_paddr: u64,
    /// Number of bytes of the segment present in the file.
    pub p_filesz: u64,
    /// Number of bytes the segment occupies in memory.
    ///
    /// May exceed `p_filesz`; the loader zero-fills the remainder. Trimming
    /// never touches this field.
    pub p_memsz: u64,
    /// Required alignment of the segment.
    pub p_align: u64,
}

impl Elf64Phdr {
    pub fn from_reader<R: io::Read>(cur: &mut R) -> io::Result<Elf64Phdr> {
        Ok(Elf64Phdr {
            p_type: cur.read_u32::<LE>()?,
            p_flags: cur.read_u32::<LE>()?,
            p_offset: cur.read_u64::<LE>()?,
            p_vaddr: cur.read_u64::<LE>()?,
            p_paddr: cur.read_u64::<LE>()?,
            p_filesz: cur.read_u64::<LE>()?,
            p_memsz: cur.read_u64::<LE>()?,
            p_align: cur.read_u64::<LE>()?,
        })
    }

    pub fn write_to<W: io::Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LE>(self.p_type)?;
        w.write_u32::<LE>(self.p_flags)?;
        w.write_u64::<LE>(self.p_offset)?;
        w.write_u64::<LE>(self.p_vaddr)?;
        w.write_u64::<LE>(self.p_paddr)?;
        w.write_u64::<LE>(self.p_filesz)?;
        w.write_u64::<LE>(self.p_memsz)?;
        w.write_u64::<LE>(self.p_align)?;
        Ok(())
    }

    /// File offset one past the last byte of the segment.
    #[inline]
    pub fn file_end(&self) -> u64 {
        self.p_offset.saturating_add(self.p_filesz)
    }
}
