use sculpt_blocks_core::{Extent3i, Point3i};
use sculpt_blocks_storage::StorageError;

use thiserror::Error;

/// Boxed error returned by user callbacks, e.g. metadata visitors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum EditError {
    /// A precondition on the arguments failed. Nothing was modified.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] StorageError),
    /// The backend doesn't provide this capability.
    #[error("{0} is not implemented by this backend")]
    NotImplemented(&'static str),
    /// Part of the area isn't loaded. Retry once streaming catches up.
    #[error("area {0:?} is not editable")]
    AreaNotEditable(Extent3i),
    #[error("metadata callback failed at {position:?}")]
    MetadataCallback {
        position: Point3i,
        #[source]
        source: BoxError,
    },
}
