use crate::elf::{Elf64Ehdr, Elf64Phdr};
use crate::error::TrimError;
use crate::storage::Storage;
use std::io::SeekFrom;

/// Writes the rewritten header and program header table back and resizes
/// the storage.
///
/// The applied size is `max(new_size, end of program header table)`; the
/// file must never be cut shorter than the table that was just written
/// into it. Returns the size actually applied.
///
/// The header goes out before the resize. If the resize then fails, the
/// storage is left with the new header at the old length; that state is
/// reported, not repaired.
pub fn commit_image<S: Storage>(
    storage: &mut S,
    ehdr: &Elf64Ehdr,
    phdrs: &[Elf64Phdr],
    new_size: u64,
) -> Result<u64, TrimError> {
    storage
        .seek(SeekFrom::Start(0))
        .map_err(TrimError::SeekFailed)?;
    ehdr.write_to(storage).map_err(TrimError::WriteFailed)?;

    storage
        .seek(SeekFrom::Start(ehdr.e_phoff))
        .map_err(TrimError::SeekFailed)?;
    for phdr in phdrs {
        phdr.write_to(storage).map_err(TrimError::WriteFailed)?;
    }

    let applied = new_size.max(ehdr.phdr_table_end());
    storage.resize(applied).map_err(TrimError::ResizeFailed)?;
    Ok(applied)
}
