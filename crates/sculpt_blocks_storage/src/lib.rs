//! Voxel storage for sculptable volumes.
//!
//! - `VoxelBuffer`: a dense, multi-channel 3D array of voxels with optional per-voxel metadata
//! - `VoxelDataMap`: an unbounded, sparse volume made of same-sized `VoxelBlock`s
//!
//! Each voxel has up to `MAX_CHANNELS` channels (see `ChannelId`). The signed distance channel stores a quantized float where
//! negative values are inside solid matter; the other channels store unsigned integers.

pub mod block;
pub mod buffer;
pub mod channel;
pub mod error;
pub mod map;
pub mod metadata;

pub use block::VoxelBlock;
pub use buffer::VoxelBuffer;
pub use channel::{ChannelDepth, ChannelFormat, ChannelId, MAX_CHANNELS};
pub use error::StorageError;
pub use map::{VoxelDataMap, VoxelDataMapConfig, MAX_BLOCK_SIZE_PO2};
pub use metadata::VoxelMetadata;

pub use either;

/// A hash map that's fast for small keys like points.
pub type SmallKeyHashMap<K, V> = ahash::AHashMap<K, V>;

pub mod prelude {
    pub use super::{
        ChannelDepth, ChannelFormat, ChannelId, StorageError, VoxelBlock, VoxelBuffer,
        VoxelDataMap, VoxelDataMapConfig, VoxelMetadata, MAX_CHANNELS,
    };
}
