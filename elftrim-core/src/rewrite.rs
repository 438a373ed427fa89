use crate::elf::{Elf64Ehdr, Elf64Phdr};

/// Makes the header and segment table consistent with truncation to
/// `new_size`. Pure transformation, no I/O; applying it twice with the
/// same size is a no-op.
///
/// A section header table that would start at or past the new end is
/// dropped outright (offset, count, and string index all zeroed); a
/// dangling reference into reclaimed bytes is worse than none. Segment
/// file extents are clipped the same way, while `p_memsz` stays untouched
/// so the loader keeps zero-filling the unmapped remainder.
pub fn retarget_image(ehdr: &mut Elf64Ehdr, phdrs: &mut [Elf64Phdr], new_size: u64) {
    if ehdr.e_shoff >= new_size {
        if ehdr.e_shnum > 0 {
            log::warn!(
                "section header table at {:#x} falls outside the trimmed file; dropping it",
                ehdr.e_shoff
            );
        }
        ehdr.e_shoff = 0;
        ehdr.e_shnum = 0;
        ehdr.e_shstrndx = 0;
    }

    for phdr in phdrs.iter_mut() {
        if phdr.p_offset >= new_size {
            // Entirely outside: park it as a zero-length descriptor at the
            // new end of file.
            phdr.p_filesz = 0;
            phdr.p_offset = new_size;
        } else if phdr.file_end() > new_size {
            phdr.p_filesz = new_size - phdr.p_offset;
        }
    }
}
