//! Editing a sparse `VoxelDataMap`.
//!
//! Edits are only allowed where every intersecting block is loaded, so a streaming system can keep loading blocks in the
//! background without edits tearing across the loaded boundary. Each edit is reported to a `PostEditListener`, which is where a
//! mesher or LOD system learns what to refresh.

use crate::{
    blend_texture, raycast_sdf, sphere_extent, EditBackend, EditError, MetadataVisitor,
    NoopListener, PostEditListener, RaycastResult, TextureParams, MAX_BINARY_SEARCH_ITERATIONS,
};

use sculpt_blocks_core::prelude::*;
use sculpt_blocks_storage::prelude::*;

pub struct MapBackend<'a, L = NoopListener> {
    map: &'a mut VoxelDataMap,
    listener: L,
    raycast_binary_search_iterations: u32,
}

impl<'a> MapBackend<'a> {
    pub fn new(map: &'a mut VoxelDataMap) -> Self {
        Self::with_listener(map, NoopListener)
    }
}

impl<'a, L: PostEditListener> MapBackend<'a, L> {
    pub fn with_listener(map: &'a mut VoxelDataMap, listener: L) -> Self {
        Self {
            map,
            listener,
            raycast_binary_search_iterations: 0,
        }
    }

    pub fn map(&self) -> &VoxelDataMap {
        &*self.map
    }

    pub fn map_mut(&mut self) -> &mut VoxelDataMap {
        &mut *self.map
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    pub fn raycast_binary_search_iterations(&self) -> u32 {
        self.raycast_binary_search_iterations
    }

    /// Clamped to `MAX_BINARY_SEARCH_ITERATIONS`. Zero disables refinement of raycast hits.
    pub fn set_raycast_binary_search_iterations(&mut self, iterations: u32) {
        self.raycast_binary_search_iterations = iterations.min(MAX_BINARY_SEARCH_ITERATIONS);
    }
}

impl<'a, L: PostEditListener> EditBackend for MapBackend<'a, L> {
    #[inline]
    fn get_voxel(&self, pos: Point3i, channel: ChannelId) -> u64 {
        self.map.get_voxel(pos, channel)
    }

    #[inline]
    fn set_voxel(&mut self, value: u64, pos: Point3i, channel: ChannelId) {
        self.map.set_voxel(value, pos, channel)
    }

    #[inline]
    fn get_voxel_f(&self, pos: Point3i, channel: ChannelId) -> f32 {
        self.map.get_voxel_f(pos, channel)
    }

    #[inline]
    fn set_voxel_f(&mut self, value: f32, pos: Point3i, channel: ChannelId) {
        self.map.set_voxel_f(value, pos, channel)
    }

    fn channel_depth(&self, channel: ChannelId) -> ChannelDepth {
        self.map.format().depth(channel)
    }

    fn is_area_editable(&self, area: &Extent3i) -> bool {
        self.map.is_area_fully_loaded(area)
    }

    fn post_edit(&mut self, area: &Extent3i) {
        self.listener.on_post_edit(area);
    }

    fn get_voxel_metadata(&self, pos: Point3i) -> Result<Option<VoxelMetadata>, EditError> {
        Ok(self.map.get_voxel_metadata(pos).cloned())
    }

    fn set_voxel_metadata(
        &mut self,
        pos: Point3i,
        meta: Option<VoxelMetadata>,
    ) -> Result<(), EditError> {
        self.map.set_voxel_metadata(pos, meta);

        Ok(())
    }

    fn for_each_voxel_metadata_in_area(
        &self,
        area: &Extent3i,
        visitor: &mut MetadataVisitor<'_>,
    ) -> Result<(), EditError> {
        self.map
            .for_each_voxel_metadata_in_area(area, |position, meta| {
                visitor(position, meta)
                    .map_err(|source| EditError::MetadataCallback { position, source })
            })
    }

    fn copy(&self, min_pos: Point3i, dst: &mut VoxelBuffer, channels_mask: u8) -> Result<(), EditError> {
        self.map.copy(min_pos, dst, channels_mask)?;

        Ok(())
    }

    fn paste(
        &mut self,
        min_pos: Point3i,
        src: &VoxelBuffer,
        channels_mask: u8,
        mask_value: Option<u64>,
    ) -> Result<(), EditError> {
        self.map
            .paste(min_pos, src, channels_mask, mask_value, false)?;

        Ok(())
    }

    fn raycast(
        &self,
        origin: Point3f,
        direction: Point3f,
        max_distance: f32,
    ) -> Result<Option<RaycastResult>, EditError> {
        let map = &*self.map;

        Ok(raycast_sdf(
            |p| map.get_voxel_f(p, ChannelId::Sdf),
            origin,
            direction,
            max_distance,
            self.raycast_binary_search_iterations,
        ))
    }

    fn paint_texture_sphere(
        &mut self,
        center: Point3f,
        radius: f32,
        params: &TextureParams,
    ) -> Result<(), EditError> {
        for p in sphere_extent(center, radius).iter_points() {
            let strength = params.falloff(Point3f::from(p).distance(&center), radius);
            if strength <= 0.0 {
                continue;
            }
            let (indices, weights) = blend_texture(
                self.map.get_voxel(p, ChannelId::Indices),
                self.map.get_voxel(p, ChannelId::Weights),
                params,
                strength,
            );
            self.map.set_voxel(indices, p, ChannelId::Indices);
            self.map.set_voxel(weights, p, ChannelId::Weights);
        }

        Ok(())
    }
}
