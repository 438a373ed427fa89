use std::fmt;
use std::io;

/// Everything that can go wrong while trimming one file.
///
/// All variants are per-file and non-retryable; a batch driver is expected
/// to report the failure and move on to the next file.
#[derive(Debug)]
pub enum TrimError {
    /// The file does not start with the ELF magic bytes.
    NotElf,
    /// The file is ELF, but not a layout or object type this tool handles.
    UnsupportedType(String),
    /// The header declares no program header table; there is nothing the
    /// loader would map, so there is no safe footprint to compute.
    NoProgramHeaders,
    /// The header record is too short or internally inconsistent.
    MalformedHeader(&'static str),
    /// The program header table extends past the end of the file.
    TruncatedProgramHeaders,
    SeekFailed(io::Error),
    ReadFailed(io::Error),
    WriteFailed(io::Error),
    ResizeFailed(io::Error),
    /// The whole scanned range is zero bytes; truncating would produce an
    /// empty file.
    EmptyOrAllZeroFile,
}

impl fmt::Display for TrimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrimError::NotElf => write!(f, "not an ELF file (bad magic)"),
            TrimError::UnsupportedType(kind) => write!(f, "unsupported input: {kind}"),
            TrimError::NoProgramHeaders => write!(f, "file has no program header table"),
            TrimError::MalformedHeader(detail) => write!(f, "malformed ELF header: {detail}"),
            TrimError::TruncatedProgramHeaders => {
                write!(f, "program header table extends past the end of the file")
            }
            TrimError::SeekFailed(err) => write!(f, "seek failed: {err}"),
            TrimError::ReadFailed(err) => write!(f, "read failed: {err}"),
            TrimError::WriteFailed(err) => write!(f, "write failed: {err}"),
            TrimError::ResizeFailed(err) => write!(f, "resize failed: {err}"),
            TrimError::EmptyOrAllZeroFile => {
                write!(f, "file contains no non-zero bytes; refusing to truncate to nothing")
            }
        }
    }
}

impl std::error::Error for TrimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrimError::SeekFailed(err)
            | TrimError::ReadFailed(err)
            | TrimError::WriteFailed(err)
            | TrimError::ResizeFailed(err) => Some(err),
            _ => None,
        }
    }
}
