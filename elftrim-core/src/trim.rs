use crate::commit::commit_image;
use crate::error::TrimError;
use crate::footprint::{file_footprint, rewind_trailing_zeros};
use crate::reader::read_image;
use crate::rewrite::retarget_image;
use crate::storage::Storage;
use std::fs::OpenOptions;
use std::path::Path;

/// Caller configuration for one trim.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimOptions {
    /// Also discard trailing zero bytes below the structural footprint.
    pub strip_zeros: bool,
}

/// Byte counts for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimStats {
    pub size_before: u64,
    pub size_after: u64,
}

impl TrimStats {
    pub fn bytes_saved(&self) -> u64 {
        self.size_before.saturating_sub(self.size_after)
    }
}

/// Runs the whole pipeline against already-opened storage: parse, compute
/// the footprint, optionally rewind over trailing zeros, rewrite the
/// headers, commit.
pub fn trim_storage<S: Storage>(
    storage: &mut S,
    options: &TrimOptions,
) -> Result<TrimStats, TrimError> {
    let size_before = storage.len().map_err(TrimError::ReadFailed)?;

    let (mut ehdr, mut phdrs) = read_image(storage)?;

    let mut new_size = file_footprint(&ehdr, &phdrs);
    log::debug!("loader footprint: {new_size} of {size_before} bytes");

    if options.strip_zeros {
        let rewound = rewind_trailing_zeros(storage, new_size)?;
        if rewound < new_size {
            log::info!(
                "trailing zero scan dropped another {} bytes",
                new_size - rewound
            );
        }
        new_size = rewound;
    }

    retarget_image(&mut ehdr, &mut phdrs, new_size);
    let size_after = commit_image(storage, &ehdr, &phdrs, new_size)?;

    Ok(TrimStats {
        size_before,
        size_after,
    })
}

/// Trims `path` in place. The file is opened read-write and truncated
/// where it stands.
pub fn trim_in_place<P: AsRef<Path>>(
    path: P,
    options: &TrimOptions,
) -> Result<TrimStats, TrimError> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path.as_ref())
        .map_err(TrimError::ReadFailed)?;
    trim_storage(&mut file, options)
}

/// Copies `source` to `dest` in full, then trims the copy. The source is
/// never opened for writing; its bytes are untouched even when the trim
/// of the copy fails.
pub fn trim_to_output<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    dest: Q,
    options: &TrimOptions,
) -> Result<TrimStats, TrimError> {
    std::fs::copy(source.as_ref(), dest.as_ref()).map_err(TrimError::WriteFailed)?;
    log::debug!(
        "copied {} to {} before trimming",
        source.as_ref().display(),
        dest.as_ref().display()
    );

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(dest.as_ref())
        .map_err(TrimError::ReadFailed)?;
    trim_storage(&mut file, options)
}
