//! Editing a single standalone `VoxelBuffer`, e.g. a brush stamp or an extracted chunk.

use crate::{EditBackend, EditError, MetadataVisitor};

use sculpt_blocks_core::prelude::*;
use sculpt_blocks_storage::prelude::*;

/// Edits are allowed anywhere inside the buffer. Reads outside of it return the channel defaults and writes outside of it are
/// dropped. Edited areas accumulate into a dirty extent.
pub struct BufferBackend<'a> {
    buffer: &'a mut VoxelBuffer,
    format: ChannelFormat,
    dirty_extent: Option<Extent3i>,
}

impl<'a> BufferBackend<'a> {
    pub fn new(buffer: &'a mut VoxelBuffer) -> Self {
        let format = buffer.format();

        Self {
            buffer,
            format,
            dirty_extent: None,
        }
    }

    pub fn buffer(&self) -> &VoxelBuffer {
        &*self.buffer
    }

    /// The union of all areas edited since the last call, clipped to the buffer.
    pub fn take_dirty_extent(&mut self) -> Option<Extent3i> {
        self.dirty_extent.take()
    }
}

impl<'a> EditBackend for BufferBackend<'a> {
    fn get_voxel(&self, pos: Point3i, channel: ChannelId) -> u64 {
        if self.buffer.contains(pos) {
            self.buffer.get_voxel(pos, channel)
        } else {
            self.format.default_value(channel)
        }
    }

    fn set_voxel(&mut self, value: u64, pos: Point3i, channel: ChannelId) {
        if self.buffer.contains(pos) {
            self.buffer.set_voxel(value, pos, channel);
        }
    }

    fn get_voxel_f(&self, pos: Point3i, channel: ChannelId) -> f32 {
        self.format
            .depth(channel)
            .decode_f(self.get_voxel(pos, channel))
    }

    fn set_voxel_f(&mut self, value: f32, pos: Point3i, channel: ChannelId) {
        if self.buffer.contains(pos) {
            self.buffer.set_voxel_f(value, pos, channel);
        }
    }

    fn channel_depth(&self, channel: ChannelId) -> ChannelDepth {
        self.buffer.channel_depth(channel)
    }

    fn is_area_editable(&self, area: &Extent3i) -> bool {
        area.is_subset_of(&self.buffer.extent())
    }

    fn post_edit(&mut self, area: &Extent3i) {
        let area = area.intersection(&self.buffer.extent());
        self.dirty_extent = Some(match self.dirty_extent {
            Some(dirty) => dirty.union(&area),
            None => area,
        });
    }

    fn get_voxel_metadata(&self, pos: Point3i) -> Result<Option<VoxelMetadata>, EditError> {
        Ok(self.buffer.get_voxel_metadata(pos).cloned())
    }

    fn set_voxel_metadata(
        &mut self,
        pos: Point3i,
        meta: Option<VoxelMetadata>,
    ) -> Result<(), EditError> {
        if !self.buffer.contains(pos) {
            return Err(EditError::AreaNotEditable(Extent3i::from_min_and_shape(
                pos,
                Point3i::ONES,
            )));
        }
        self.buffer.set_voxel_metadata(pos, meta);

        Ok(())
    }

    fn for_each_voxel_metadata_in_area(
        &self,
        area: &Extent3i,
        visitor: &mut MetadataVisitor<'_>,
    ) -> Result<(), EditError> {
        self.buffer
            .for_each_voxel_metadata_in_area(area, |position, meta| {
                visitor(position, meta)
                    .map_err(|source| EditError::MetadataCallback { position, source })
            })
    }

    fn copy(&self, min_pos: Point3i, dst: &mut VoxelBuffer, channels_mask: u8) -> Result<(), EditError> {
        if dst.is_empty() {
            return Err(StorageError::EmptyBuffer.into());
        }
        let src_extent = Extent3i::from_min_and_shape(min_pos, dst.size());
        let partial = !src_extent.is_subset_of(&self.buffer.extent());
        let dst_format = dst.format();
        for channel in ChannelId::iter_mask(channels_mask) {
            if partial {
                dst.fill(dst_format.default_value(channel), channel);
            }
            dst.copy_channel_from(&*self.buffer, &src_extent, Point3i::ZERO, channel);
        }

        Ok(())
    }

    fn paste(
        &mut self,
        min_pos: Point3i,
        src: &VoxelBuffer,
        channels_mask: u8,
        mask_value: Option<u64>,
    ) -> Result<(), EditError> {
        if src.is_empty() {
            return Err(StorageError::EmptyBuffer.into());
        }
        let src_extent = src.extent();
        for channel in ChannelId::iter_mask(channels_mask) {
            match mask_value {
                Some(mask) => self
                    .buffer
                    .copy_channel_from_masked(src, &src_extent, min_pos, channel, mask),
                None => self
                    .buffer
                    .copy_channel_from(src, &src_extent, min_pos, channel),
            }
        }

        Ok(())
    }
}
