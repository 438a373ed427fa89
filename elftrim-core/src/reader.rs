use crate::elf::{Elf64Ehdr, Elf64Phdr, SIZEOF_PHDR};
use crate::error::TrimError;
use std::io::{self, Read, Seek, SeekFrom};

/// Parses the ELF header and the full program header table.
///
/// The table is returned with its shape intact: `PT_NULL` entries keep
/// their slots, and the entry count always equals `e_phnum`. Nothing is
/// mutated; only the read cursor moves.
pub fn read_image<R: Read + Seek>(
    reader: &mut R,
) -> Result<(Elf64Ehdr, Vec<Elf64Phdr>), TrimError> {
    reader
        .seek(SeekFrom::Start(0))
        .map_err(TrimError::SeekFailed)?;

    let ehdr = Elf64Ehdr::from_reader(reader).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => {
            TrimError::MalformedHeader("file is shorter than an ELF64 header")
        }
        _ => TrimError::ReadFailed(err),
    })?;

    ehdr.validate()?;

    if ehdr.e_phoff == 0 || ehdr.e_phnum == 0 {
        return Err(TrimError::NoProgramHeaders);
    }

    if ehdr.e_phentsize as usize != SIZEOF_PHDR {
        return Err(TrimError::MalformedHeader(
            "program header entry size is not the ELF64 standard 56 bytes",
        ));
    }

    // Overflow check before trusting the declared count.
    (ehdr.e_phnum as u64)
        .checked_mul(ehdr.e_phentsize as u64)
        .and_then(|table_size| ehdr.e_phoff.checked_add(table_size))
        .ok_or(TrimError::MalformedHeader(
            "program header table extent overflows a 64-bit offset",
        ))?;

    reader
        .seek(SeekFrom::Start(ehdr.e_phoff))
        .map_err(TrimError::SeekFailed)?;

    let mut phdrs = Vec::with_capacity(ehdr.e_phnum as usize);
    for _ in 0..ehdr.e_phnum {
        let phdr = Elf64Phdr::from_reader(reader).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => TrimError::TruncatedProgramHeaders,
            _ => TrimError::ReadFailed(err),
        })?;
        phdrs.push(phdr);
    }

    log::debug!(
        "parsed ELF64 header: {} program headers at {:#x}, section table at {:#x}",
        ehdr.e_phnum,
        ehdr.e_phoff,
        ehdr.e_shoff
    );

    Ok((ehdr, phdrs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::{PT_NULL, SIZEOF_EHDR};
    use crate::testutil::ImageBuilder;
    use goblin::elf::header::ET_CORE;
    use goblin::elf64::program_header::PT_LOAD;
    use std::io::Cursor;

    #[test]
    fn test_reads_header_and_table() {
        let mut storage = ImageBuilder::new()
            .segment(PT_LOAD, 176, 1024)
            .null_segment()
            .build_storage();

        let (ehdr, phdrs) = read_image(&mut storage).unwrap();
        assert_eq!(ehdr.e_phnum, 2);
        assert_eq!(phdrs.len(), 2);
        assert_eq!(phdrs[0].p_type, PT_LOAD);
        assert_eq!(phdrs[0].file_end(), 1200);
        assert_eq!(phdrs[1].p_type, PT_NULL);
    }

    #[test]
    fn test_short_file_is_malformed() {
        let image = ImageBuilder::new().segment(PT_LOAD, 176, 64).build();
        let mut storage = Cursor::new(image[..SIZEOF_EHDR - 8].to_vec());
        assert!(matches!(
            read_image(&mut storage),
            Err(TrimError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_core_dump_rejected() {
        let mut storage = ImageBuilder::new()
            .object_type(ET_CORE)
            .segment(PT_LOAD, 176, 64)
            .build_storage();
        assert!(matches!(
            read_image(&mut storage),
            Err(TrimError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_missing_program_headers_rejected() {
        let mut storage = ImageBuilder::new().build_storage();
        assert!(matches!(
            read_image(&mut storage),
            Err(TrimError::NoProgramHeaders)
        ));
    }

    #[test]
    fn test_nonstandard_phentsize_rejected() {
        let mut image = ImageBuilder::new().segment(PT_LOAD, 176, 64).build();
        image[54] = 0x40; // e_phentsize = 64
        let mut storage = Cursor::new(image);
        assert!(matches!(
            read_image(&mut storage),
            Err(TrimError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_overflowing_table_extent_rejected() {
        let mut image = ImageBuilder::new().segment(PT_LOAD, 176, 64).build();
        image[32..40].copy_from_slice(&u64::MAX.to_le_bytes()); // e_phoff
        let mut storage = Cursor::new(image);
        assert!(matches!(
            read_image(&mut storage),
            Err(TrimError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_truncated_table_detected() {
        let image = ImageBuilder::new()
            .segment(PT_LOAD, 176, 64)
            .segment(PT_LOAD, 240, 64)
            .build();
        let mut storage = Cursor::new(image[..SIZEOF_EHDR + SIZEOF_PHDR + 10].to_vec());
        assert!(matches!(
            read_image(&mut storage),
            Err(TrimError::TruncatedProgramHeaders)
        ));
    }
}
