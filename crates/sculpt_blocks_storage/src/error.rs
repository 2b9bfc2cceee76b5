use sculpt_blocks_core::Point3i;

use thiserror::Error;

/// Precondition violations reported by the storage types. All of these are "invalid argument" conditions: the call has no
/// effect and can be retried with corrected arguments.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StorageError {
    #[error("channel index {0} is out of range")]
    InvalidChannel(usize),
    #[error("voxel buffer has zero volume")]
    EmptyBuffer,
    #[error("buffer of size {actual:?} cannot be used as a block of size {expected:?}")]
    BlockSizeMismatch { expected: Point3i, actual: Point3i },
    #[error("block size power {0} is out of range")]
    InvalidBlockSize(u32),
}
