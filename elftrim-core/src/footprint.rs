use crate::elf::{Elf64Ehdr, Elf64Phdr, PT_NULL};
use crate::error::TrimError;
use std::io::{Read, Seek, SeekFrom};

/// Buffer size for the backward zero scan. Tuning knob only; results do
/// not depend on it.
pub const ZERO_SCAN_CHUNK: usize = 8 * 1024;

/// Computes the minimal file length that keeps every byte the loader can
/// reference.
///
/// The floor is the larger of the header's own size and the end of the
/// program header table; every non-`PT_NULL` segment then raises it to at
/// least its own file extent. The fold is a plain max, so segment order
/// does not matter.
pub fn file_footprint(ehdr: &Elf64Ehdr, phdrs: &[Elf64Phdr]) -> u64 {
    let mut footprint = u64::max(ehdr.e_ehsize as u64, ehdr.phdr_table_end());
    for phdr in phdrs {
        if phdr.p_type == PT_NULL {
            continue;
        }
        footprint = footprint.max(phdr.file_end());
    }
    footprint
}

/// Walks backward from `baseline` and returns the position one past the
/// last non-zero byte.
///
/// Never reads at or beyond `baseline`. A range that is zero all the way
/// down to offset 0 is fatal: truncating to it would leave an empty file.
pub fn rewind_trailing_zeros<R: Read + Seek>(
    reader: &mut R,
    baseline: u64,
) -> Result<u64, TrimError> {
    let mut buf = [0u8; ZERO_SCAN_CHUNK];
    let mut end = baseline;

    while end > 0 {
        let chunk = u64::min(end, ZERO_SCAN_CHUNK as u64);
        let start = end - chunk;

        let window = &mut buf[..chunk as usize];
        reader
            .seek(SeekFrom::Start(start))
            .map_err(TrimError::SeekFailed)?;
        reader.read_exact(window).map_err(TrimError::ReadFailed)?;

        if let Some(pos) = window.iter().rposition(|&byte| byte != 0) {
            return Ok(start + pos as u64 + 1);
        }
        end = start;
    }

    Err(TrimError::EmptyOrAllZeroFile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ImageBuilder;
    use goblin::elf64::program_header::PT_LOAD;
    use std::io::Cursor;

    #[test]
    fn test_footprint_covers_header_table() {
        // Two entries of 56 bytes starting at offset 64: table ends at 176.
        let builder = ImageBuilder::new().null_segment().null_segment();
        let ehdr = builder.header();
        let phdrs = vec![];
        assert_eq!(file_footprint(&ehdr, &phdrs), 176);
    }

    #[test]
    fn test_footprint_extends_to_last_segment() {
        let mut storage = ImageBuilder::new()
            .segment(PT_LOAD, 176, 1024)
            .null_segment()
            .build_storage();
        let (ehdr, phdrs) = crate::reader::read_image(&mut storage).unwrap();
        assert_eq!(file_footprint(&ehdr, &phdrs), 1200);
    }

    #[test]
    fn test_null_segments_do_not_bind_bytes() {
        let builder = ImageBuilder::new().null_segment();
        let ehdr = builder.header();
        let phdrs = vec![crate::elf::Elf64Phdr {
            p_type: PT_NULL,
            p_flags: 0,
            p_offset: 1 << 40,
            p_vaddr: 0,
            p_paddr: 0,
            p_filesz: 1 << 40,
            p_memsz: 0,
            p_align: 0,
        }];
        // A wild offset in a null slot must not inflate the footprint.
        assert_eq!(file_footprint(&ehdr, &phdrs), 64 + 56);
    }

    #[test]
    fn test_zero_scan_stops_at_last_data_byte() {
        let mut image = ImageBuilder::new().segment(PT_LOAD, 176, 1024).build();
        assert_eq!(image.len(), 1200);
        // Zero the tail of the segment: bytes 1150..1200.
        for byte in &mut image[1150..] {
            *byte = 0;
        }
        let mut storage = Cursor::new(image);
        assert_eq!(rewind_trailing_zeros(&mut storage, 1200).unwrap(), 1150);
    }

    #[test]
    fn test_zero_scan_without_padding_is_identity() {
        let mut storage = ImageBuilder::new()
            .segment(PT_LOAD, 176, 1024)
            .build_storage();
        assert_eq!(rewind_trailing_zeros(&mut storage, 1200).unwrap(), 1200);
    }

    #[test]
    fn test_zero_scan_crosses_chunk_boundaries() {
        // Last data byte far below the baseline, with several full chunks
        // of zeros above it.
        let len = (ZERO_SCAN_CHUNK * 3 + 100) as u64;
        let mut image = vec![0u8; len as usize];
        image[99] = 0x7f;
        let mut storage = Cursor::new(image);
        assert_eq!(rewind_trailing_zeros(&mut storage, len).unwrap(), 100);
    }

    #[test]
    fn test_all_zero_range_is_fatal() {
        let mut storage = Cursor::new(vec![0u8; 4096]);
        assert!(matches!(
            rewind_trailing_zeros(&mut storage, 4096),
            Err(TrimError::EmptyOrAllZeroFile)
        ));
    }

    #[test]
    fn test_scan_never_reads_past_baseline() {
        // Non-zero data above the baseline must be invisible to the scan.
        let mut image = vec![0u8; 2048];
        image[100] = 1;
        image[2000] = 0xff;
        let mut storage = Cursor::new(image);
        assert_eq!(rewind_trailing_zeros(&mut storage, 1024).unwrap(), 101);
    }
}
