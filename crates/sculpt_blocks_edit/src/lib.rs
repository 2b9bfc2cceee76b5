//! Sculpting voxel volumes.
//!
//! - `VoxelTool`: shape edits (points, spheres, boxes), copy/paste, metadata and raycasts over any `EditBackend`
//! - `MapBackend` and `BufferBackend`: backends for a sparse `VoxelDataMap` and a standalone `VoxelBuffer`
//! - `raycast_sdf`: a grid march plus binary search against a signed distance field
//! - `separate_floating_chunks`: detaches disconnected matter and hands it to a physics engine
//!
//! Edits never observe unloaded data. If any part of a shape's bounding box is not editable, the whole edit is skipped.

mod backend;
mod blend;
mod buffer_backend;
mod error;
mod grid_ray_traversal;
mod island_finder;
mod map_backend;
mod raycast;
mod separator;
mod tool;

pub use backend::{EditBackend, MetadataVisitor, NoopListener, PostEditListener};
pub use blend::{blend_texture, sdf_blend, Mode, TextureParams};
pub use buffer_backend::BufferBackend;
pub use error::{BoxError, EditError};
pub use grid_ray_traversal::GridRayTraversal3;
pub use island_finder::{IslandFinder, MAX_LABELS};
pub use map_backend::MapBackend;
pub use raycast::{
    approximate_distance_to_isosurface_binary_search, get_sdf_interpolated, raycast_sdf,
    voxel_raycast, RaycastResult, VoxelRaycastHit, MAX_BINARY_SEARCH_ITERATIONS,
};
pub use separator::{
    find_floating_chunks, separate_floating_chunks, BodyActivationQueue, BodyDescriptor,
    BodyFactory, FloatingChunk, MeshBuilder, SeparatorConfig, VolumeTransform,
};
pub use tool::{VoxelTool, MIN_SDF_SCALE};

pub(crate) use tool::sphere_extent;

pub mod prelude {
    pub use super::{
        BufferBackend, EditBackend, EditError, MapBackend, Mode, PostEditListener,
        RaycastResult, SeparatorConfig, TextureParams, VoxelTool,
    };
}
