//! Error types for image filtering operations.

use std::fmt;

/// Error type for buffer allocation and filter contract violations.
///
/// The filters in this crate never attempt partial progress: a contract
/// violation is reported before any pixel is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// An aligned image was requested with a width that is not a multiple
    /// of 32, so its rows cannot all start on a 32-byte boundary.
    UnalignableWidth {
        /// The offending width in pixels.
        width: usize,
    },
    /// A filter that requires aligned input was given an unaligned image.
    UnalignedInput,
    /// The allocator could not provide an aligned buffer of the requested size.
    Allocation {
        /// The requested size in bytes.
        bytes: usize,
    },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::UnalignableWidth { width } => {
                write!(
                    f,
                    "unalignable width: {} is not a multiple of 32",
                    width
                )
            }
            FilterError::UnalignedInput => {
                write!(f, "image must be aligned for this operation")
            }
            FilterError::Allocation { bytes } => {
                write!(f, "could not allocate {} bytes of aligned memory", bytes)
            }
        }
    }
}

impl std::error::Error for FilterError {}
