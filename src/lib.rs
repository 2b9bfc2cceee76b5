//! Sparse, sculptable voxel volumes based on signed distance fields.
//!
//! This library is organized into several crates:
//! - **core**: lattice point and extent data types
//! - **storage**: multi-channel voxel buffers and the sparse block map
//! - **edit**: the voxel tool, SDF raycasts and floating-chunk separation
//!
//! A typical session loads blocks into a `VoxelDataMap`, edits it through a `VoxelTool` over a `MapBackend`, and remeshes the
//! areas reported to a `PostEditListener`:
//!
//! ```
//! use sculpt_blocks::prelude::*;
//!
//! let mut map = VoxelDataMap::create(4, 0).unwrap();
//! let area = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(32));
//! for bpos in map.block_range(&area).iter_points() {
//!     let buffer = VoxelBuffer::with_format(Point3i::fill(16), map.format());
//!     map.set_block_buffer(bpos, buffer).unwrap();
//! }
//!
//! let mut dirty = Vec::new();
//! let mut tool = VoxelTool::new(MapBackend::with_listener(&mut map, &mut dirty));
//! tool.do_sphere(Point3f::fill(16.0), 6.0);
//! tool.set_mode(Mode::Remove);
//! tool.do_sphere(Point3f::fill(16.0), 3.0);
//!
//! let hit = tool
//!     .raycast(PointN([0.0, 16.0, 16.0]), PointN([1.0, 0.0, 0.0]), 32.0)
//!     .unwrap();
//! assert!(hit.is_some());
//! drop(tool);
//! assert_eq!(dirty.len(), 2);
//! ```

pub use sculpt_blocks_core as core;
pub use sculpt_blocks_edit as edit;
pub use sculpt_blocks_storage as storage;

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::edit::prelude::*;
    pub use super::storage::prelude::*;
}
