use crate::{EditError, RaycastResult, TextureParams};

use sculpt_blocks_core::prelude::*;
use sculpt_blocks_storage::prelude::*;

/// Visitor for per-voxel metadata. Errors are reported as `EditError::MetadataCallback`.
pub type MetadataVisitor<'a> = dyn FnMut(Point3i, &VoxelMetadata) -> Result<(), crate::BoxError> + 'a;

/// The voxel storage a `VoxelTool` edits.
///
/// Implementors provide raw voxel access, an editability check and a post-edit hook. The shape algorithms in `VoxelTool` are
/// written once against these. The provided methods are optional capabilities that fail with `EditError::NotImplemented` until
/// a backend overrides them.
pub trait EditBackend {
    fn get_voxel(&self, pos: Point3i, channel: ChannelId) -> u64;

    fn set_voxel(&mut self, value: u64, pos: Point3i, channel: ChannelId);

    fn get_voxel_f(&self, pos: Point3i, channel: ChannelId) -> f32;

    fn set_voxel_f(&mut self, value: f32, pos: Point3i, channel: ChannelId);

    fn channel_depth(&self, channel: ChannelId) -> ChannelDepth;

    /// Returns `true` iff every voxel of `area` can be written without observing unloaded data.
    fn is_area_editable(&self, area: &Extent3i) -> bool;

    /// Called once after each edit with the area it covered.
    fn post_edit(&mut self, area: &Extent3i);

    fn get_voxel_metadata(&self, _pos: Point3i) -> Result<Option<VoxelMetadata>, EditError> {
        Err(EditError::NotImplemented("get_voxel_metadata"))
    }

    fn set_voxel_metadata(
        &mut self,
        _pos: Point3i,
        _meta: Option<VoxelMetadata>,
    ) -> Result<(), EditError> {
        Err(EditError::NotImplemented("set_voxel_metadata"))
    }

    fn for_each_voxel_metadata_in_area(
        &self,
        _area: &Extent3i,
        _visitor: &mut MetadataVisitor<'_>,
    ) -> Result<(), EditError> {
        Err(EditError::NotImplemented("for_each_voxel_metadata_in_area"))
    }

    /// Copies the channels in `channels_mask` of the area at `min_pos` with the size of `dst`.
    fn copy(
        &self,
        _min_pos: Point3i,
        _dst: &mut VoxelBuffer,
        _channels_mask: u8,
    ) -> Result<(), EditError> {
        Err(EditError::NotImplemented("copy"))
    }

    /// Writes `src` with its origin at `min_pos`, skipping source voxels equal to `mask_value`.
    fn paste(
        &mut self,
        _min_pos: Point3i,
        _src: &VoxelBuffer,
        _channels_mask: u8,
        _mask_value: Option<u64>,
    ) -> Result<(), EditError> {
        Err(EditError::NotImplemented("paste"))
    }

    fn raycast(
        &self,
        _origin: Point3f,
        _direction: Point3f,
        _max_distance: f32,
    ) -> Result<Option<RaycastResult>, EditError> {
        Err(EditError::NotImplemented("raycast"))
    }

    /// Specialized `Mode::TexturePaint` sphere. Only writes voxels; the tool checks editability and calls `post_edit`.
    fn paint_texture_sphere(
        &mut self,
        _center: Point3f,
        _radius: f32,
        _params: &TextureParams,
    ) -> Result<(), EditError> {
        Err(EditError::NotImplemented("paint_texture_sphere"))
    }
}

/// Receives the area of every edit, e.g. to schedule remeshing.
pub trait PostEditListener {
    fn on_post_edit(&mut self, area: &Extent3i);
}

/// Ignores edits.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl PostEditListener for NoopListener {
    fn on_post_edit(&mut self, _area: &Extent3i) {}
}

/// Collects edited areas in order.
impl PostEditListener for Vec<Extent3i> {
    fn on_post_edit(&mut self, area: &Extent3i) {
        self.push(*area);
    }
}

impl<L: PostEditListener> PostEditListener for &mut L {
    fn on_post_edit(&mut self, area: &Extent3i) {
        (**self).on_post_edit(area)
    }
}
