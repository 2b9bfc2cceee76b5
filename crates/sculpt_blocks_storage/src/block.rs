use crate::VoxelBuffer;

use sculpt_blocks_core::prelude::*;

/// A cube of voxels owned by a `VoxelDataMap`, identified by its block coordinate.
#[derive(Clone, Debug)]
pub struct VoxelBlock {
    /// Block coordinate, i.e. the voxel origin shifted right by the block size power.
    pub position: Point3i,
    pub lod_index: u32,
    pub voxels: VoxelBuffer,
    modified: bool,
}

impl VoxelBlock {
    pub fn new(position: Point3i, lod_index: u32, voxels: VoxelBuffer) -> Self {
        Self {
            position,
            lod_index,
            voxels,
            modified: false,
        }
    }

    /// Whether voxels were written since the block was created or last saved. Persistence uses this to skip clean blocks.
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    #[inline]
    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }
}
