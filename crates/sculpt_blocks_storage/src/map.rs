//! A sparse, unbounded voxel volume made up of same-sized blocks.
//!
//! # Addressing
//!
//! Blocks are keyed by their block coordinate, which is a voxel coordinate arithmetically shifted right by the block size
//! power. Shifting (rather than dividing) keeps block boundaries consistent across zero, so the block containing `[-1, -1, -1]`
//! is `[-1, -1, -1]` and not `[0, 0, 0]`. The voxel origin of a block is `coordinate * block_size`.
//!
//! # Storage
//!
//! Blocks live in a dense arena (`Vec`) and a spatial hash maps block coordinates to arena indices. Removing a block swaps the
//! last arena entry into its slot and fixes up the index, so no other block moves in memory.
//!
//! Voxel access tends to be spatially coherent, so the map remembers the last block it resolved. That hint is only an
//! `(coordinate, index)` pair, never a reference, and it's fixed up whenever the arena changes.
//!
//! # Unloaded Regions
//!
//! Reads from a coordinate with no block return the configured default value of the channel and never create a block. Writes
//! create the owning block on demand, pre-filled with the defaults. Code that must not observe default-filled data (editing,
//! deterministic reads) should gate on `is_area_fully_loaded` first.
//!
//! ```
//! use sculpt_blocks_core::prelude::*;
//! use sculpt_blocks_storage::prelude::*;
//!
//! let mut map = VoxelDataMap::new(VoxelDataMapConfig::default()).unwrap();
//!
//! // Nothing is loaded, so we read the default and no block is created.
//! assert_eq!(map.get_voxel_f(Point3i::fill(-100), ChannelId::Sdf), 1.0);
//! assert_eq!(map.block_count(), 0);
//!
//! map.set_voxel_f(-1.0, Point3i::fill(-1), ChannelId::Sdf);
//! assert_eq!(map.get_voxel_f(Point3i::fill(-1), ChannelId::Sdf), -1.0);
//! assert!(map.has_block(Point3i::fill(-1)));
//!
//! let area = Extent3i::from_min_and_shape(Point3i::fill(-4), Point3i::fill(4));
//! assert!(map.is_area_fully_loaded(&area));
//! ```

use crate::{
    buffer::convert_raw, ChannelFormat, ChannelId, SmallKeyHashMap, StorageError, VoxelBlock,
    VoxelBuffer, VoxelMetadata,
};

use sculpt_blocks_core::prelude::*;

use either::Either;
use std::cell::Cell;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The largest supported block size is `2^MAX_BLOCK_SIZE_PO2`.
pub const MAX_BLOCK_SIZE_PO2: u32 = 8;

/// Parameters for creating a `VoxelDataMap`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct VoxelDataMapConfig {
    /// Blocks have an edge length of `2^block_size_po2` voxels.
    pub block_size_po2: u32,
    /// The level of detail this map stores. Purely informational for the map itself.
    pub lod_index: u32,
    /// Channel depths and the values returned for unloaded voxels.
    pub format: ChannelFormat,
}

impl Default for VoxelDataMapConfig {
    fn default() -> Self {
        Self {
            block_size_po2: 4,
            lod_index: 0,
            format: ChannelFormat::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct BlockRef {
    position: Point3i,
    index: usize,
}

/// Sparse block storage for a voxel volume. Not thread-safe: callers serialize mutation.
#[derive(Debug)]
pub struct VoxelDataMap {
    format: ChannelFormat,
    blocks_map: SmallKeyHashMap<Point3i, usize>,
    blocks: Vec<VoxelBlock>,
    // Hint only. Checked before hashing.
    last_accessed_block: Cell<Option<BlockRef>>,
    block_size_po2: u32,
    block_size_mask: i32,
    lod_index: u32,
}

impl VoxelDataMap {
    pub fn new(config: VoxelDataMapConfig) -> Result<Self, StorageError> {
        if config.block_size_po2 == 0 || config.block_size_po2 > MAX_BLOCK_SIZE_PO2 {
            return Err(StorageError::InvalidBlockSize(config.block_size_po2));
        }

        Ok(Self {
            format: config.format,
            blocks_map: SmallKeyHashMap::default(),
            blocks: Vec::new(),
            last_accessed_block: Cell::new(None),
            block_size_po2: config.block_size_po2,
            block_size_mask: (1 << config.block_size_po2) - 1,
            lod_index: config.lod_index,
        })
    }

    /// Shorthand for a map with the default channel format.
    pub fn create(block_size_po2: u32, lod_index: u32) -> Result<Self, StorageError> {
        Self::new(VoxelDataMapConfig {
            block_size_po2,
            lod_index,
            ..Default::default()
        })
    }

    #[inline]
    pub fn block_size(&self) -> i32 {
        1 << self.block_size_po2
    }

    #[inline]
    pub fn block_size_po2(&self) -> u32 {
        self.block_size_po2
    }

    #[inline]
    pub fn block_size_mask(&self) -> i32 {
        self.block_size_mask
    }

    #[inline]
    pub fn lod_index(&self) -> u32 {
        self.lod_index
    }

    pub fn set_lod_index(&mut self, lod_index: u32) {
        self.lod_index = lod_index;
        for block in self.blocks.iter_mut() {
            block.lod_index = lod_index;
        }
    }

    #[inline]
    pub fn format(&self) -> &ChannelFormat {
        &self.format
    }

    /// Converts voxel coordinates into block coordinates.
    #[inline]
    pub fn voxel_to_block(&self, pos: Point3i) -> Point3i {
        pos >> self.block_size_po2 as i32
    }

    /// Converts voxel coordinates into coordinates local to the containing block.
    #[inline]
    pub fn to_local(&self, pos: Point3i) -> Point3i {
        pos & self.block_size_mask
    }

    /// Converts block coordinates into the voxel coordinates of the block's origin.
    #[inline]
    pub fn block_to_voxel(&self, bpos: Point3i) -> Point3i {
        bpos << self.block_size_po2 as i32
    }

    /// The voxels covered by the block at `bpos`.
    #[inline]
    pub fn block_extent(&self, bpos: Point3i) -> Extent3i {
        Extent3i::from_min_and_shape(self.block_to_voxel(bpos), Point3i::fill(self.block_size()))
    }

    /// The block coordinates of all blocks intersecting `voxels_box`.
    #[inline]
    pub fn block_range(&self, voxels_box: &Extent3i) -> Extent3i {
        *voxels_box >> self.block_size_po2 as i32
    }

    /// Sets the raw value that unloaded voxels of `channel` take. Existing blocks are unaffected.
    pub fn set_default_voxel(&mut self, value: u64, channel: ChannelId) {
        let depth = self.format.depth(channel);
        self.format.defaults[channel.index()] = value & depth.mask();
    }

    #[inline]
    pub fn default_voxel(&self, channel: ChannelId) -> u64 {
        self.format.default_value(channel)
    }

    #[inline]
    fn find_block_index(&self, bpos: Point3i) -> Option<usize> {
        if let Some(last) = self.last_accessed_block.get() {
            if last.position == bpos {
                return Some(last.index);
            }
        }

        let index = *self.blocks_map.get(&bpos)?;
        self.last_accessed_block.set(Some(BlockRef {
            position: bpos,
            index,
        }));

        Some(index)
    }

    fn get_or_create_block_index(&mut self, bpos: Point3i) -> usize {
        if let Some(index) = self.find_block_index(bpos) {
            return index;
        }

        let voxels = VoxelBuffer::with_format(Point3i::fill(self.block_size()), &self.format);
        tracing::trace!(block = ?bpos, "creating default block");

        self.insert_block(VoxelBlock::new(bpos, self.lod_index, voxels))
    }

    fn insert_block(&mut self, block: VoxelBlock) -> usize {
        let index = self.blocks.len();
        let position = block.position;
        self.blocks.push(block);
        self.blocks_map.insert(position, index);
        self.last_accessed_block.set(Some(BlockRef { position, index }));

        index
    }

    #[inline]
    pub fn get_block(&self, bpos: Point3i) -> Option<&VoxelBlock> {
        let index = self.find_block_index(bpos)?;

        Some(&self.blocks[index])
    }

    #[inline]
    pub fn get_block_mut(&mut self, bpos: Point3i) -> Option<&mut VoxelBlock> {
        let index = self.find_block_index(bpos)?;

        Some(&mut self.blocks[index])
    }

    #[inline]
    pub fn has_block(&self, bpos: Point3i) -> bool {
        self.blocks_map.contains_key(&bpos)
    }

    /// Returns `true` iff all 26 neighbors of the block at `bpos` are present.
    pub fn is_block_surrounded(&self, bpos: Point3i) -> bool {
        Point3i::moore_offsets()
            .into_iter()
            .all(|offset| self.has_block(bpos + offset))
    }

    /// Reads the raw value of `channel` at `pos`, or the channel default if the block is not loaded.
    #[inline]
    pub fn get_voxel(&self, pos: Point3i, channel: ChannelId) -> u64 {
        match self.find_block_index(self.voxel_to_block(pos)) {
            Some(index) => self.blocks[index]
                .voxels
                .get_voxel(self.to_local(pos), channel),
            None => self.default_voxel(channel),
        }
    }

    /// Writes the raw `value` of `channel` at `pos`, creating the block if needed.
    #[inline]
    pub fn set_voxel(&mut self, value: u64, pos: Point3i, channel: ChannelId) {
        let index = self.get_or_create_block_index(self.voxel_to_block(pos));
        let local = self.to_local(pos);
        let block = &mut self.blocks[index];
        block.voxels.set_voxel(value, local, channel);
        block.set_modified(true);
    }

    #[inline]
    pub fn get_voxel_f(&self, pos: Point3i, channel: ChannelId) -> f32 {
        match self.find_block_index(self.voxel_to_block(pos)) {
            Some(index) => self.blocks[index]
                .voxels
                .get_voxel_f(self.to_local(pos), channel),
            None => self
                .format
                .depth(channel)
                .decode_f(self.default_voxel(channel)),
        }
    }

    #[inline]
    pub fn set_voxel_f(&mut self, value: f32, pos: Point3i, channel: ChannelId) {
        let index = self.get_or_create_block_index(self.voxel_to_block(pos));
        let local = self.to_local(pos);
        let block = &mut self.blocks[index];
        block.voxels.set_voxel_f(value, local, channel);
        block.set_modified(true);
    }

    /// Gets a copy of all voxels in the area starting at `min_pos` with the same size as `dst_buffer`, for the channels in
    /// `channels_mask`. Unloaded parts of the area are filled with the channel defaults.
    pub fn copy(
        &self,
        min_pos: Point3i,
        dst_buffer: &mut VoxelBuffer,
        channels_mask: u8,
    ) -> Result<(), StorageError> {
        if dst_buffer.is_empty() {
            return Err(StorageError::EmptyBuffer);
        }

        let area = Extent3i::from_min_and_shape(min_pos, dst_buffer.size());
        for bpos in self.block_range(&area).iter_points() {
            let block_extent = self.block_extent(bpos);
            let overlap = area.intersection(&block_extent);

            match self.get_block(bpos) {
                Some(block) => {
                    for channel in ChannelId::iter_mask(channels_mask) {
                        dst_buffer.copy_channel_from(
                            &block.voxels,
                            &(overlap - block_extent.minimum),
                            overlap.minimum - min_pos,
                            channel,
                        );
                    }
                }
                None => {
                    for channel in ChannelId::iter_mask(channels_mask) {
                        let value = convert_raw(
                            channel,
                            self.format.depth(channel),
                            dst_buffer.channel_depth(channel),
                            self.default_voxel(channel),
                        );
                        dst_buffer.fill_area(value, &(overlap - min_pos), channel);
                    }
                }
            }
        }

        Ok(())
    }

    /// Writes all of `src_buffer` into the map with its origin at `min_pos`, for the channels in `channels_mask`.
    ///
    /// Source voxels equal to `mask_value` (if any) are skipped, preserving the value already in the map. If
    /// `create_new_blocks` is `false`, the parts of the area with no loaded block are skipped.
    pub fn paste(
        &mut self,
        min_pos: Point3i,
        src_buffer: &VoxelBuffer,
        channels_mask: u8,
        mask_value: Option<u64>,
        create_new_blocks: bool,
    ) -> Result<(), StorageError> {
        if src_buffer.is_empty() {
            return Err(StorageError::EmptyBuffer);
        }

        let area = Extent3i::from_min_and_shape(min_pos, src_buffer.size());
        for bpos in self.block_range(&area).iter_points() {
            if !create_new_blocks && !self.has_block(bpos) {
                continue;
            }

            let block_extent = self.block_extent(bpos);
            let overlap = area.intersection(&block_extent);
            let src_extent = overlap - min_pos;
            let dst_min = overlap.minimum - block_extent.minimum;

            let index = self.get_or_create_block_index(bpos);
            let block = &mut self.blocks[index];
            for channel in ChannelId::iter_mask(channels_mask) {
                match mask_value {
                    Some(mask) => block.voxels.copy_channel_from_masked(
                        src_buffer,
                        &src_extent,
                        dst_min,
                        channel,
                        mask,
                    ),
                    None => block
                        .voxels
                        .copy_channel_from(src_buffer, &src_extent, dst_min, channel),
                }
            }
            block.set_modified(true);
        }

        Ok(())
    }

    /// Moves `buffer` into the map as the block at `bpos`, replacing any block already there. This is how streamed-in data
    /// enters the map.
    pub fn set_block_buffer(
        &mut self,
        bpos: Point3i,
        buffer: VoxelBuffer,
    ) -> Result<&mut VoxelBlock, StorageError> {
        let expected = Point3i::fill(self.block_size());
        if buffer.size() != expected {
            return Err(StorageError::BlockSizeMismatch {
                expected,
                actual: buffer.size(),
            });
        }

        let index = match self.find_block_index(bpos) {
            Some(index) => {
                self.blocks[index].voxels = buffer;
                index
            }
            None => self.insert_block(VoxelBlock::new(bpos, self.lod_index, buffer)),
        };

        Ok(&mut self.blocks[index])
    }

    /// Removes the block at `bpos`, first passing it to `pre_delete` (e.g. to save it). Returns `false` if there was no block.
    pub fn remove_block(&mut self, bpos: Point3i, pre_delete: impl FnOnce(&mut VoxelBlock)) -> bool {
        let index = match self.blocks_map.remove(&bpos) {
            Some(index) => index,
            None => return false,
        };

        if let Some(last) = self.last_accessed_block.get() {
            if last.position == bpos {
                self.last_accessed_block.set(None);
            }
        }

        pre_delete(&mut self.blocks[index]);
        self.blocks.swap_remove(index);

        // The last block was moved into the vacated slot.
        if let Some(moved) = self.blocks.get(index) {
            let moved_position = moved.position;
            self.blocks_map.insert(moved_position, index);
            if let Some(last) = self.last_accessed_block.get() {
                if last.position == moved_position {
                    self.last_accessed_block.set(Some(BlockRef {
                        position: moved_position,
                        index,
                    }));
                }
            }
        }
        tracing::trace!(block = ?bpos, "removed block");

        true
    }

    /// Removes all blocks without any callback.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.blocks_map.clear();
        self.last_accessed_block.set(None);
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn iter_blocks(&self) -> impl Iterator<Item = &VoxelBlock> {
        self.blocks.iter()
    }

    pub fn for_each_block(&self, f: impl FnMut(&VoxelBlock)) {
        self.blocks.iter().for_each(f);
    }

    pub fn for_each_block_mut(&mut self, f: impl FnMut(&mut VoxelBlock)) {
        self.blocks.iter_mut().for_each(f);
    }

    /// Calls `visitor` for every block position intersecting `voxels_box`. Vacant positions are represented by the voxel extent
    /// they would cover.
    pub fn visit_blocks(
        &self,
        voxels_box: &Extent3i,
        mut visitor: impl FnMut(Either<&VoxelBlock, Extent3i>),
    ) {
        for bpos in self.block_range(voxels_box).iter_points() {
            match self.get_block(bpos) {
                Some(block) => visitor(Either::Left(block)),
                None => visitor(Either::Right(self.block_extent(bpos))),
            }
        }
    }

    /// The smallest voxel extent that bounds all loaded blocks.
    pub fn bounding_extent(&self) -> Option<Extent3i> {
        bounding_extent(self.blocks.iter().flat_map(|block| {
            let extent = self.block_extent(block.position);

            vec![extent.minimum, extent.max()].into_iter()
        }))
    }

    /// Returns `true` iff every block intersecting `voxels_box` is loaded.
    pub fn is_area_fully_loaded(&self, voxels_box: &Extent3i) -> bool {
        if voxels_box.is_empty() {
            return true;
        }

        self.block_range(voxels_box)
            .iter_points()
            .all(|bpos| self.has_block(bpos))
    }

    pub fn get_voxel_metadata(&self, pos: Point3i) -> Option<&VoxelMetadata> {
        self.get_block(self.voxel_to_block(pos))?
            .voxels
            .get_voxel_metadata(self.to_local(pos))
    }

    /// Attaches `meta` to the voxel at `pos` (or clears it if `None`), creating the block if needed.
    pub fn set_voxel_metadata(&mut self, pos: Point3i, meta: Option<VoxelMetadata>) {
        let index = self.get_or_create_block_index(self.voxel_to_block(pos));
        let local = self.to_local(pos);
        let block = &mut self.blocks[index];
        block.voxels.set_voxel_metadata(local, meta);
        block.set_modified(true);
    }

    /// Calls `visitor` with the world position of every metadata entry within `voxels_box`, stopping at the first error.
    pub fn for_each_voxel_metadata_in_area<E>(
        &self,
        voxels_box: &Extent3i,
        mut visitor: impl FnMut(Point3i, &VoxelMetadata) -> Result<(), E>,
    ) -> Result<(), E> {
        for bpos in self.block_range(voxels_box).iter_points() {
            let block = match self.get_block(bpos) {
                Some(block) => block,
                None => continue,
            };
            let origin = self.block_to_voxel(bpos);
            block
                .voxels
                .for_each_voxel_metadata_in_area(&(*voxels_box - origin), |rel_pos, meta| {
                    visitor(rel_pos + origin, meta)
                })?;
        }

        Ok(())
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
