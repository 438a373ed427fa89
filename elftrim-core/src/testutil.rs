//! In-memory ELF64 image construction for tests.

use crate::elf::{Elf64Ehdr, Elf64Phdr, PT_NULL, SIZEOF_EHDR, SIZEOF_PHDR};
use goblin::elf::header::ET_DYN;
use std::io::Cursor;

/// Filler byte for synthetic segment contents, chosen non-zero so the
/// trailing-zero scan sees real data.
pub const SEGMENT_FILL: u8 = 0xc3;

pub struct ImageBuilder {
    e_type: u16,
    shoff: u64,
    shnum: u16,
    shstrndx: u16,
    phdrs: Vec<Elf64Phdr>,
    pad_to: u64,
}

impl ImageBuilder {
    pub fn new() -> Self {
        ImageBuilder {
            e_type: ET_DYN,
            shoff: 0,
            shnum: 0,
            shstrndx: 0,
            phdrs: Vec::new(),
            pad_to: 0,
        }
    }

    pub fn object_type(mut self, e_type: u16) -> Self {
        self.e_type = e_type;
        self
    }

    pub fn section_table(mut self, shoff: u64, shnum: u16, shstrndx: u16) -> Self {
        self.shoff = shoff;
        self.shnum = shnum;
        self.shstrndx = shstrndx;
        self
    }

    pub fn segment(mut self, p_type: u32, p_offset: u64, p_filesz: u64) -> Self {
        self.phdrs.push(Elf64Phdr {
            p_type,
            p_flags: 5,
            p_offset,
            p_vaddr: 0x40_0000 + p_offset,
            p_paddr: 0x40_0000 + p_offset,
            p_filesz,
            p_memsz: p_filesz,
            p_align: 0x1000,
        });
        self
    }

    pub fn null_segment(self) -> Self {
        self.segment(PT_NULL, 0, 0)
    }

    /// Zero-pads the image out to `len` (simulates trailing padding).
    pub fn pad_to(mut self, len: u64) -> Self {
        self.pad_to = len;
        self
    }

    pub fn header(&self) -> Elf64Ehdr {
        Elf64Ehdr {
            e_ident: [
                0x7f, b'E', b'L', b'F', 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            ],
            e_type: self.e_type,
            e_machine: 0x3e,
            e_version: 1,
            e_entry: 0x40_1000,
            e_phoff: SIZEOF_EHDR as u64,
            e_shoff: self.shoff,
            e_flags: 0,
            e_ehsize: SIZEOF_EHDR as u16,
            e_phentsize: SIZEOF_PHDR as u16,
            e_phnum: self.phdrs.len() as u16,
            e_shentsize: 64,
            e_shnum: self.shnum,
            e_shstrndx: self.shstrndx,
        }
    }

    pub fn build(self) -> Vec<u8> {
        let ehdr = self.header();
        let mut cur = Cursor::new(Vec::new());
        ehdr.write_to(&mut cur).unwrap();
        for phdr in &self.phdrs {
            phdr.write_to(&mut cur).unwrap();
        }
        let mut bytes = cur.into_inner();

        let headers_end = bytes.len() as u64;
        for phdr in &self.phdrs {
            if phdr.p_type == PT_NULL {
                continue;
            }
            let end = phdr.p_offset + phdr.p_filesz;
            if end as usize > bytes.len() {
                bytes.resize(end as usize, 0);
            }
            for pos in phdr.p_offset.max(headers_end)..end {
                bytes[pos as usize] = SEGMENT_FILL;
            }
        }

        if self.pad_to as usize > bytes.len() {
            bytes.resize(self.pad_to as usize, 0);
        }
        bytes
    }

    /// Builds and wraps the image in cursor storage.
    pub fn build_storage(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.build())
    }
}
