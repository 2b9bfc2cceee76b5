//! The `VoxelTool` is a cursor for sculpting and painting a voxel volume.
//!
//! It holds the edit state (active channel, paint and eraser values, blend mode, SDF scale) and rasterizes shapes through an
//! `EditBackend`. Every shape edit is all-or-nothing: the shape's whole bounding box must be editable or nothing is written.
//! After writing, the backend's post-edit hook runs exactly once with that bounding box.
//!
//! ```
//! use sculpt_blocks_core::prelude::*;
//! use sculpt_blocks_edit::prelude::*;
//! use sculpt_blocks_storage::prelude::*;
//!
//! let mut map = VoxelDataMap::create(4, 0).unwrap();
//! for bpos in Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::ONES).iter_points() {
//!     map.set_block_buffer(bpos, VoxelBuffer::new(Point3i::fill(16))).unwrap();
//! }
//!
//! let mut tool = VoxelTool::new(MapBackend::new(&mut map));
//! assert!(tool.do_sphere(Point3f::fill(8.0), 4.0));
//!
//! assert!(tool.get_voxel_f(Point3i::fill(8)) < 0.0);
//! assert_eq!(tool.get_voxel_f(Point3i::ZERO), 1.0);
//! ```

use crate::{
    get_sdf_interpolated, sdf_blend, BoxError, EditBackend, EditError, Mode, RaycastResult,
    TextureParams,
};

use sculpt_blocks_core::prelude::*;
use sculpt_blocks_storage::prelude::*;

use core::convert::TryFrom;

/// The smallest allowed SDF scale.
pub const MIN_SDF_SCALE: f32 = 0.00001;

/// The voxels a sphere edit may touch.
pub(crate) fn sphere_extent(center: Point3f, radius: f32) -> Extent3i {
    let radius = radius.max(0.0);

    Extent3i::from_min_and_shape(
        center.trunc_int() - Point3i::fill(radius.floor() as i32),
        Point3i::fill(radius.ceil() as i32 * 2),
    )
}

pub struct VoxelTool<B> {
    backend: B,
    channel: ChannelId,
    value: u64,
    eraser_value: u64,
    mode: Mode,
    sdf_scale: f32,
    texture_params: TextureParams,
}

impl<B: EditBackend> VoxelTool<B> {
    /// Creates a tool on the SDF channel in `Mode::Add`. The SDF scale starts at the quantization scale of the backend's SDF
    /// channel depth.
    pub fn new(backend: B) -> Self {
        let sdf_scale = backend
            .channel_depth(ChannelId::Sdf)
            .sdf_quantization_scale();

        Self {
            backend,
            channel: ChannelId::Sdf,
            value: 0,
            eraser_value: 0,
            mode: Mode::default(),
            sdf_scale,
            texture_params: TextureParams::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    #[inline]
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn set_channel(&mut self, channel: ChannelId) {
        self.channel = channel;
    }

    /// Like `set_channel`, but from a raw channel index. Fails if `index >= MAX_CHANNELS`.
    pub fn set_channel_index(&mut self, index: usize) -> Result<(), EditError> {
        self.channel = ChannelId::try_from(index)?;

        Ok(())
    }

    /// The value painted on non-SDF channels.
    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn set_value(&mut self, value: u64) {
        self.value = value;
    }

    /// The value painted on non-SDF channels in `Mode::Remove`.
    #[inline]
    pub fn eraser_value(&self) -> u64 {
        self.eraser_value
    }

    pub fn set_eraser_value(&mut self, value: u64) {
        self.eraser_value = value;
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    #[inline]
    pub fn sdf_scale(&self) -> f32 {
        self.sdf_scale
    }

    /// Scale applied to shape distances before they're blended into the SDF. Clamped to at least `MIN_SDF_SCALE`.
    pub fn set_sdf_scale(&mut self, scale: f32) {
        self.sdf_scale = scale.max(MIN_SDF_SCALE);
    }

    #[inline]
    pub fn texture_params(&self) -> &TextureParams {
        &self.texture_params
    }

    pub fn set_texture_params(&mut self, params: TextureParams) {
        self.texture_params = params;
    }

    #[inline]
    pub fn is_area_editable(&self, area: &Extent3i) -> bool {
        self.backend.is_area_editable(area)
    }

    #[inline]
    fn paint_value(&self) -> u64 {
        if self.mode == Mode::Remove {
            self.eraser_value
        } else {
            self.value
        }
    }

    // Runs `edit` only if all of `area` is editable, then reports `area` to the backend.
    fn edit_area(&mut self, area: Extent3i, edit: impl FnOnce(&mut Self)) -> bool {
        if !self.backend.is_area_editable(&area) {
            tracing::debug!("Area {:?} not editable", area);
            return false;
        }
        edit(self);
        self.backend.post_edit(&area);

        true
    }

    /// Reads the raw value of the active channel.
    pub fn get_voxel(&self, pos: Point3i) -> u64 {
        self.backend.get_voxel(pos, self.channel)
    }

    pub fn get_voxel_f(&self, pos: Point3i) -> f32 {
        self.backend.get_voxel_f(pos, self.channel)
    }

    /// Trilinear interpolation of the active channel at `pos`.
    pub fn get_voxel_f_interpolated(&self, pos: Point3f) -> f32 {
        let channel = self.channel;

        get_sdf_interpolated(|p| self.backend.get_voxel_f(p, channel), pos)
    }

    /// Writes a raw value to the active channel. Returns `false` if the voxel is not editable.
    pub fn set_voxel(&mut self, pos: Point3i, value: u64) -> bool {
        let channel = self.channel;
        self.edit_area(Extent3i::from_min_and_shape(pos, Point3i::ONES), |tool| {
            tool.backend.set_voxel(value, pos, channel)
        })
    }

    pub fn set_voxel_f(&mut self, pos: Point3i, value: f32) -> bool {
        let channel = self.channel;
        self.edit_area(Extent3i::from_min_and_shape(pos, Point3i::ONES), |tool| {
            tool.backend.set_voxel_f(value, pos, channel)
        })
    }

    /// Makes a single voxel fully solid (or fully empty in `Mode::Remove`) on the SDF channel, or paints it on other channels.
    pub fn do_point(&mut self, pos: Point3i) -> bool {
        let channel = self.channel;
        let mode = self.mode;
        let value = self.paint_value();
        self.edit_area(Extent3i::from_min_and_shape(pos, Point3i::ONES), |tool| {
            if channel == ChannelId::Sdf {
                let sdf = if mode == Mode::Remove { 1.0 } else { -1.0 };
                tool.backend.set_voxel_f(sdf, pos, channel);
            } else {
                tool.backend.set_voxel(value, pos, channel);
            }
        })
    }

    /// On the SDF channel, blends the distance field of a sphere using the current mode. On other channels, paints every voxel
    /// within `radius` of `center`.
    pub fn do_sphere(&mut self, center: Point3f, radius: f32) -> bool {
        let area = sphere_extent(center, radius);
        self.edit_area(area, |tool| {
            if tool.mode == Mode::TexturePaint {
                let params = tool.texture_params;
                match tool.backend.paint_texture_sphere(center, radius, &params) {
                    Ok(()) => return,
                    Err(EditError::NotImplemented(_)) => (),
                    Err(e) => {
                        tracing::warn!("Texture painting failed: {}", e);
                        return;
                    }
                }
            }
            tool.stamp_sphere(&area, center, radius);
        })
    }

    fn stamp_sphere(&mut self, area: &Extent3i, center: Point3f, radius: f32) {
        if self.channel == ChannelId::Sdf {
            if self.mode == Mode::TexturePaint {
                return;
            }
            for p in area.iter_points() {
                let d = self.sdf_scale * (Point3f::from(p).distance(&center) - radius);
                let dst = self.backend.get_voxel_f(p, ChannelId::Sdf);
                self.backend
                    .set_voxel_f(sdf_blend(d, dst, self.mode), p, ChannelId::Sdf);
            }
        } else {
            let value = self.paint_value();
            for p in area.iter_points() {
                if Point3f::from(p).distance(&center) <= radius {
                    self.backend.set_voxel(value, p, self.channel);
                }
            }
        }
    }

    /// Edits the inclusive box between `begin` and `end`, in any order.
    ///
    /// On the SDF channel, the box is blended as a uniformly solid shape, so only membership is exact, not distance.
    pub fn do_box(&mut self, begin: Point3i, end: Point3i) -> bool {
        let area = Extent3i::from_corners(begin, end);
        self.edit_area(area, |tool| {
            if tool.channel == ChannelId::Sdf {
                if tool.mode == Mode::TexturePaint {
                    return;
                }
                for p in area.iter_points() {
                    let dst = tool.backend.get_voxel_f(p, ChannelId::Sdf);
                    tool.backend
                        .set_voxel_f(sdf_blend(-1.0, dst, tool.mode), p, ChannelId::Sdf);
                }
            } else {
                let value = tool.paint_value();
                for p in area.iter_points() {
                    tool.backend.set_voxel(value, p, tool.channel);
                }
            }
        })
    }

    pub fn do_line(&mut self, _begin: Point3i, _end: Point3i) -> Result<(), EditError> {
        Err(EditError::NotImplemented("do_line"))
    }

    pub fn do_circle(
        &mut self,
        _center: Point3i,
        _radius: i32,
        _direction: Point3i,
    ) -> Result<(), EditError> {
        Err(EditError::NotImplemented("do_circle"))
    }

    /// Empties every voxel of the volume where the SDF of `stamp`, placed with its origin at `pos`, is `<= 0`.
    pub fn sdf_stamp_erase(&mut self, stamp: &VoxelBuffer, pos: Point3i) -> bool {
        let area = Extent3i::from_min_and_shape(pos, stamp.size());
        self.edit_area(area, |tool| {
            for p in stamp.extent().iter_points() {
                if stamp.get_voxel_f(p, ChannelId::Sdf) <= 0.0 {
                    tool.backend.set_voxel_f(1.0, p + pos, ChannelId::Sdf);
                }
            }
        })
    }

    fn channels_or_active(&self, channels_mask: u8) -> u8 {
        if channels_mask == 0 {
            self.channel.mask_bit()
        } else {
            channels_mask
        }
    }

    /// Copies the area at `min_pos` with the size of `dst`. A `channels_mask` of 0 copies only the active channel.
    pub fn copy(
        &self,
        min_pos: Point3i,
        dst: &mut VoxelBuffer,
        channels_mask: u8,
    ) -> Result<(), EditError> {
        if dst.is_empty() {
            return Err(StorageError::EmptyBuffer.into());
        }

        self.backend
            .copy(min_pos, dst, self.channels_or_active(channels_mask))
    }

    /// Writes `src` with its origin at `min_pos`. Source voxels equal to `mask_value` are skipped. A `channels_mask` of 0 pastes
    /// only the active channel.
    pub fn paste(
        &mut self,
        min_pos: Point3i,
        src: &VoxelBuffer,
        channels_mask: u8,
        mask_value: Option<u64>,
    ) -> Result<(), EditError> {
        if src.is_empty() {
            return Err(StorageError::EmptyBuffer.into());
        }
        let area = Extent3i::from_min_and_shape(min_pos, src.size());
        if !self.backend.is_area_editable(&area) {
            return Err(EditError::AreaNotEditable(area));
        }

        let channels_mask = self.channels_or_active(channels_mask);
        self.backend
            .paste(min_pos, src, channels_mask, mask_value)?;
        self.backend.post_edit(&area);

        Ok(())
    }

    /// Casts a ray against the SDF. `Ok(None)` means nothing was hit.
    pub fn raycast(
        &self,
        origin: Point3f,
        direction: Point3f,
        max_distance: f32,
    ) -> Result<Option<RaycastResult>, EditError> {
        self.backend.raycast(origin, direction, max_distance)
    }

    pub fn get_voxel_metadata(&self, pos: Point3i) -> Result<Option<VoxelMetadata>, EditError> {
        self.backend.get_voxel_metadata(pos)
    }

    pub fn set_voxel_metadata(
        &mut self,
        pos: Point3i,
        meta: Option<VoxelMetadata>,
    ) -> Result<(), EditError> {
        let area = Extent3i::from_min_and_shape(pos, Point3i::ONES);
        if !self.backend.is_area_editable(&area) {
            return Err(EditError::AreaNotEditable(area));
        }

        self.backend.set_voxel_metadata(pos, meta)
    }

    /// Calls `visitor` on every metadata entry within `area`. The first error from `visitor` stops the iteration and is returned
    /// as `EditError::MetadataCallback`.
    pub fn for_each_voxel_metadata_in_area(
        &self,
        area: &Extent3i,
        mut visitor: impl FnMut(Point3i, &VoxelMetadata) -> Result<(), BoxError>,
    ) -> Result<(), EditError> {
        if !self.backend.is_area_editable(area) {
            return Err(EditError::AreaNotEditable(*area));
        }

        self.backend
            .for_each_voxel_metadata_in_area(area, &mut visitor)
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{BufferBackend, MapBackend};

    use pretty_assertions::assert_eq;
    use utilities::data_sets::{count_solid, fill_solid, loaded_map};

    fn snapshot(map: &VoxelDataMap, area: &Extent3i) -> VoxelBuffer {
        let mut buffer = VoxelBuffer::new(area.shape);
        map.copy(area.minimum, &mut buffer, 0xff).unwrap();

        buffer
    }

    fn map_16() -> VoxelDataMap {
        loaded_map(4, &Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(16)))
    }

    #[test]
    fn sphere_add_on_empty_volume() {
        let mut map = map_16();
        let mut edits = Vec::new();
        let mut tool = VoxelTool::new(MapBackend::with_listener(&mut map, &mut edits));

        assert!(tool.do_sphere(Point3f::fill(8.0), 4.0));

        assert!(tool.get_voxel_f(Point3i::fill(8)) < 0.0);
        assert_eq!(tool.get_voxel_f(Point3i::ZERO), 1.0);
        drop(tool);

        assert_eq!(
            edits,
            vec![Extent3i::from_min_and_shape(Point3i::fill(4), Point3i::fill(8))]
        );
    }

    #[test]
    fn sphere_remove_carves_solid() {
        let mut map = map_16();
        fill_solid(&mut map, &Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(16)));
        let mut tool = VoxelTool::new(MapBackend::new(&mut map));
        tool.set_mode(Mode::Remove);

        assert!(tool.do_sphere(Point3f::fill(8.0), 3.0));

        assert!(tool.get_voxel_f(Point3i::fill(8)) > 0.0);
        assert!(tool.get_voxel_f(Point3i::fill(1)) < 0.0);
    }

    #[test]
    fn edits_on_unloaded_area_change_nothing() {
        // Only the block at the origin is loaded.
        let mut map = map_16();
        map.set_voxel_f(-0.5, Point3i::fill(15), ChannelId::Sdf);
        let area = Extent3i::from_min_and_shape(Point3i::fill(-16), Point3i::fill(48));
        let before = snapshot(&map, &area);
        let block_count = map.block_count();

        let mut edits = Vec::new();
        let mut tool = VoxelTool::new(MapBackend::with_listener(&mut map, &mut edits));
        assert!(!tool.do_sphere(Point3f::fill(15.0), 3.0));
        assert!(!tool.do_box(Point3i::fill(10), Point3i::fill(20)));
        assert!(!tool.do_point(Point3i::fill(-1)));
        assert!(!tool.set_voxel_f(Point3i::fill(16), -1.0));
        drop(tool);

        assert!(edits.is_empty());
        assert_eq!(map.block_count(), block_count);
        assert!(snapshot(&map, &area) == before);
    }

    #[test]
    fn box_is_inclusive_and_sorted() {
        let mut map = map_16();
        let mut tool = VoxelTool::new(MapBackend::new(&mut map));
        tool.set_channel(ChannelId::Type);
        tool.set_value(5);

        assert!(tool.do_box(Point3i::fill(3), Point3i::fill(1)));

        let area = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(16));
        let painted: Vec<_> = area.iter_points().filter(|p| tool.get_voxel(*p) == 5).collect();
        assert_eq!(painted.len(), 27);
        assert!(painted.iter().all(|p| Extent3i::from_min_and_max(Point3i::ONES, Point3i::fill(3)).contains(*p)));
    }

    #[test]
    fn box_on_sdf_blends_constant_solid() {
        let mut map = map_16();
        let mut tool = VoxelTool::new(MapBackend::new(&mut map));

        assert!(tool.do_box(Point3i::fill(2), Point3i::fill(5)));
        assert_eq!(tool.get_voxel_f(Point3i::fill(2)), -1.0);
        assert_eq!(tool.get_voxel_f(Point3i::fill(5)), -1.0);
        assert_eq!(tool.get_voxel_f(Point3i::fill(6)), 1.0);
        drop(tool);

        let area = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(16));
        assert_eq!(count_solid(&map, &area), 64);
    }

    #[test]
    fn point_writes_solid_or_empty_and_paint_values() {
        let mut map = map_16();
        let mut tool = VoxelTool::new(MapBackend::new(&mut map));

        assert!(tool.do_point(Point3i::ONES));
        assert_eq!(tool.get_voxel_f(Point3i::ONES), -1.0);

        tool.set_mode(Mode::Remove);
        assert!(tool.do_point(Point3i::ONES));
        assert_eq!(tool.get_voxel_f(Point3i::ONES), 1.0);

        tool.set_channel(ChannelId::Type);
        tool.set_value(9);
        tool.set_eraser_value(2);
        assert!(tool.do_point(Point3i::ONES));
        assert_eq!(tool.get_voxel(Point3i::ONES), 2);

        tool.set_mode(Mode::Set);
        assert!(tool.do_point(Point3i::ONES));
        assert_eq!(tool.get_voxel(Point3i::ONES), 9);
    }

    #[test]
    fn sphere_paints_non_sdf_channels_by_membership() {
        let mut map = map_16();
        let mut tool = VoxelTool::new(MapBackend::new(&mut map));
        tool.set_channel(ChannelId::Type);
        tool.set_value(3);

        assert!(tool.do_sphere(Point3f::fill(8.0), 2.0));

        assert_eq!(tool.get_voxel(PointN([9, 8, 8])), 3);
        assert_eq!(tool.get_voxel(PointN([9, 9, 9])), 3);
        assert_eq!(tool.get_voxel(PointN([7, 7, 6])), 0);
        assert_eq!(tool.backend().get_voxel_f(Point3i::fill(8), ChannelId::Sdf), 1.0);
    }

    #[test]
    fn invalid_channel_index_is_rejected() {
        let mut map = map_16();
        let mut tool = VoxelTool::new(MapBackend::new(&mut map));

        assert!(matches!(
            tool.set_channel_index(MAX_CHANNELS),
            Err(EditError::InvalidArgument(StorageError::InvalidChannel(_)))
        ));
        assert_eq!(tool.channel(), ChannelId::Sdf);

        tool.set_channel_index(4).unwrap();
        assert_eq!(tool.channel(), ChannelId::Weights);
    }

    #[test]
    fn sdf_scale_is_clamped() {
        let mut map = map_16();
        let mut tool = VoxelTool::new(MapBackend::new(&mut map));
        assert_eq!(tool.sdf_scale(), ChannelDepth::Bits16.sdf_quantization_scale());

        tool.set_sdf_scale(-3.0);
        assert_eq!(tool.sdf_scale(), MIN_SDF_SCALE);
    }

    #[test]
    fn copy_without_mask_uses_active_channel() {
        let mut map = map_16();
        map.set_voxel(7, Point3i::ONES, ChannelId::Type);
        map.set_voxel_f(-1.0, Point3i::ONES, ChannelId::Sdf);
        let mut tool = VoxelTool::new(MapBackend::new(&mut map));
        tool.set_channel(ChannelId::Type);

        let mut dst = VoxelBuffer::new(Point3i::fill(2));
        tool.copy(Point3i::ZERO, &mut dst, 0).unwrap();

        assert_eq!(dst.get_voxel(Point3i::ONES, ChannelId::Type), 7);
        assert_eq!(dst.get_voxel_f(Point3i::ONES, ChannelId::Sdf), 1.0);

        let mut empty = VoxelBuffer::new(Point3i::ZERO);
        assert!(matches!(
            tool.copy(Point3i::ZERO, &mut empty, 0),
            Err(EditError::InvalidArgument(StorageError::EmptyBuffer))
        ));
    }

    #[test]
    fn paste_requires_editable_area() {
        let mut map = map_16();
        let mut tool = VoxelTool::new(MapBackend::new(&mut map));
        let mut src = VoxelBuffer::new(Point3i::fill(4));
        src.fill_f(-1.0, ChannelId::Sdf);

        assert!(matches!(
            tool.paste(Point3i::fill(14), &src, 0, None),
            Err(EditError::AreaNotEditable(_))
        ));
        tool.paste(Point3i::fill(2), &src, 0, None).unwrap();
        assert_eq!(tool.get_voxel_f(Point3i::fill(5)), -1.0);
        assert_eq!(tool.get_voxel_f(Point3i::fill(6)), 1.0);
    }

    #[test]
    fn metadata_callback_errors_are_reported() {
        let mut map = map_16();
        let mut tool = VoxelTool::new(MapBackend::new(&mut map));
        tool.set_voxel_metadata(PointN([1, 2, 3]), Some("chest".into()))
            .unwrap();
        assert_eq!(
            tool.get_voxel_metadata(PointN([1, 2, 3])).unwrap(),
            Some(VoxelMetadata::Text("chest".to_owned()))
        );

        let area = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(16));
        let result = tool.for_each_voxel_metadata_in_area(&area, |_, _| Err("nope".into()));
        match result {
            Err(EditError::MetadataCallback { position, .. }) => {
                assert_eq!(position, PointN([1, 2, 3]))
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut count = 0;
        tool.for_each_voxel_metadata_in_area(&area, |_, _| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 1);

        let unloaded = Extent3i::from_min_and_shape(Point3i::fill(10), Point3i::fill(10));
        assert!(matches!(
            tool.for_each_voxel_metadata_in_area(&unloaded, |_, _| Ok(())),
            Err(EditError::AreaNotEditable(_))
        ));
    }

    #[test]
    fn unsupported_shapes_are_not_implemented() {
        let mut buffer = VoxelBuffer::new(Point3i::fill(4));
        let mut tool = VoxelTool::new(BufferBackend::new(&mut buffer));

        assert!(matches!(
            tool.do_line(Point3i::ZERO, Point3i::ONES),
            Err(EditError::NotImplemented("do_line"))
        ));
        assert!(matches!(
            tool.do_circle(Point3i::ZERO, 2, Point3i::ONES),
            Err(EditError::NotImplemented("do_circle"))
        ));
        assert!(matches!(
            tool.raycast(Point3f::ZERO, PointN([1.0, 0.0, 0.0]), 10.0),
            Err(EditError::NotImplemented("raycast"))
        ));
    }

    #[test]
    fn texture_paint_blends_weights_on_map() {
        let mut map = map_16();
        let mut tool = VoxelTool::new(MapBackend::new(&mut map));
        tool.set_mode(Mode::TexturePaint);
        tool.set_texture_params(TextureParams {
            opacity: 1.0,
            sharpness: 1.0,
            index: 2,
        });

        assert!(tool.do_sphere(Point3f::fill(8.0), 4.0));

        let backend = tool.backend();
        let center = Point3i::fill(8);
        assert_eq!(backend.get_voxel(center, ChannelId::Indices) & 0xf, 2);
        assert_eq!(backend.get_voxel(center, ChannelId::Weights) & 0xf, 15);
        // Outside the brush.
        assert_eq!(backend.get_voxel(Point3i::ONES, ChannelId::Weights), 0);
        // The SDF is untouched.
        assert_eq!(backend.get_voxel_f(center, ChannelId::Sdf), 1.0);
    }

    #[test]
    fn texture_paint_falls_back_to_stamping_on_buffers() {
        let mut buffer = VoxelBuffer::new(Point3i::fill(8));
        let mut tool = VoxelTool::new(BufferBackend::new(&mut buffer));
        tool.set_mode(Mode::TexturePaint);
        tool.set_channel(ChannelId::Type);
        tool.set_value(4);

        assert!(tool.do_sphere(Point3f::fill(4.0), 2.0));
        assert_eq!(tool.get_voxel(Point3i::fill(4)), 4);
    }

    #[test]
    fn buffer_backend_accumulates_dirty_extent() {
        let mut buffer = VoxelBuffer::new(Point3i::fill(8));
        let mut tool = VoxelTool::new(BufferBackend::new(&mut buffer));

        assert!(tool.do_point(Point3i::ONES));
        assert!(tool.do_box(Point3i::fill(3), Point3i::fill(4)));
        assert!(!tool.do_box(Point3i::fill(6), Point3i::fill(8)));

        assert_eq!(
            tool.backend_mut().take_dirty_extent(),
            Some(Extent3i::from_min_and_max(Point3i::ONES, Point3i::fill(4)))
        );
        assert_eq!(tool.backend_mut().take_dirty_extent(), None);
    }

    #[test]
    fn stamp_erase_empties_solid_footprint() {
        let mut map = map_16();
        fill_solid(&mut map, &Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(16)));
        let mut stamp = VoxelBuffer::new(Point3i::fill(3));
        stamp.set_voxel_f(-1.0, Point3i::ONES, ChannelId::Sdf);
        stamp.set_voxel_f(0.0, Point3i::ZERO, ChannelId::Sdf);

        let mut tool = VoxelTool::new(MapBackend::new(&mut map));
        assert!(tool.sdf_stamp_erase(&stamp, Point3i::fill(5)));

        assert_eq!(tool.get_voxel_f(Point3i::fill(6)), 1.0);
        assert_eq!(tool.get_voxel_f(Point3i::fill(5)), 1.0);
        assert_eq!(tool.get_voxel_f(Point3i::fill(7)), -1.0);

        assert!(!tool.sdf_stamp_erase(&stamp, Point3i::fill(15)));
    }

    #[test]
    fn raycast_hits_sphere() {
        let mut map = map_16();
        let mut backend = MapBackend::new(&mut map);
        backend.set_raycast_binary_search_iterations(100);
        assert_eq!(
            backend.raycast_binary_search_iterations(),
            crate::MAX_BINARY_SEARCH_ITERATIONS
        );
        backend.set_raycast_binary_search_iterations(0);
        let mut tool = VoxelTool::new(backend);
        assert!(tool.do_sphere(Point3f::fill(8.0), 4.0));

        let dir = PointN([1.0, 0.0, 0.0]);
        let origin = PointN([0.0, 8.0, 8.0]);
        let hit = tool.raycast(origin, dir, 20.0).unwrap().unwrap();
        assert_eq!(hit.position, PointN([5, 8, 8]));
        assert_eq!(hit.previous_position, PointN([4, 8, 8]));
        assert_eq!(hit.distance, 4.5);

        tool.backend_mut().set_raycast_binary_search_iterations(16);
        let hit = tool.raycast(origin, dir, 20.0).unwrap().unwrap();
        assert!((hit.distance - 4.0).abs() < 0.01, "{}", hit.distance);

        let miss = tool.raycast(origin, PointN([-1.0, 0.0, 0.0]), 20.0).unwrap();
        assert_eq!(miss, None);
    }

    #[test]
    fn interpolated_read_uses_active_channel() {
        let mut map = map_16();
        map.set_voxel_f(-1.0, Point3i::ZERO, ChannelId::Sdf);
        let tool = VoxelTool::new(MapBackend::new(&mut map));

        assert_eq!(tool.get_voxel_f_interpolated(Point3f::ZERO), -1.0);
        assert_eq!(tool.get_voxel_f_interpolated(PointN([0.5, 0.0, 0.0])), 0.0);
    }
}
