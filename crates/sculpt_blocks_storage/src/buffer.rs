//! A dense, fixed-size, multi-channel cube of voxels.
//!
//! `VoxelBuffer` is addressed in local coordinates, so the voxel at `[0, 0, 0]` is its least corner and `size()` is its least
//! upper bound. It's the storage of every block in a `VoxelDataMap` and also the standalone snapshot type used when copying
//! regions in and out of a map.
//!
//! Channels whose voxels all have the same value are held as a single uniform value and only expanded into a dense array when a
//! differing value is written. Freshly created buffers are entirely uniform, so they cost almost nothing until edited.
//!
//! ```
//! use sculpt_blocks_core::prelude::*;
//! use sculpt_blocks_storage::prelude::*;
//!
//! let mut buffer = VoxelBuffer::new(Point3i::fill(16));
//!
//! // New buffers are empty space.
//! assert_eq!(buffer.get_voxel_f(Point3i::ZERO, ChannelId::Sdf), 1.0);
//!
//! buffer.set_voxel_f(-1.0, PointN([1, 2, 3]), ChannelId::Sdf);
//! assert_eq!(buffer.get_voxel_f(PointN([1, 2, 3]), ChannelId::Sdf), -1.0);
//! assert!(!buffer.is_uniform(ChannelId::Sdf));
//! ```

use crate::{ChannelDepth, ChannelFormat, ChannelId, SmallKeyHashMap, VoxelMetadata};

use sculpt_blocks_core::prelude::*;

#[derive(Clone, Debug, PartialEq)]
enum ChannelValues {
    Uniform(u64),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
}

#[derive(Clone, Debug, PartialEq)]
struct Channel {
    depth: ChannelDepth,
    values: ChannelValues,
}

impl Channel {
    fn uniform(depth: ChannelDepth, value: u64) -> Self {
        Self {
            depth,
            values: ChannelValues::Uniform(value & depth.mask()),
        }
    }

    #[inline]
    fn get(&self, index: usize) -> u64 {
        match &self.values {
            ChannelValues::Uniform(v) => *v,
            ChannelValues::U8(v) => v[index] as u64,
            ChannelValues::U16(v) => v[index] as u64,
            ChannelValues::U32(v) => v[index] as u64,
            ChannelValues::U64(v) => v[index],
        }
    }

    #[inline]
    fn set(&mut self, index: usize, value: u64, len: usize) {
        let value = value & self.depth.mask();
        if let ChannelValues::Uniform(u) = self.values {
            if u == value {
                return;
            }
            self.decompress(len);
        }
        match &mut self.values {
            ChannelValues::Uniform(_) => unreachable!("channel was just decompressed"),
            ChannelValues::U8(v) => v[index] = value as u8,
            ChannelValues::U16(v) => v[index] = value as u16,
            ChannelValues::U32(v) => v[index] = value as u32,
            ChannelValues::U64(v) => v[index] = value,
        }
    }

    fn fill(&mut self, value: u64) {
        self.values = ChannelValues::Uniform(value & self.depth.mask());
    }

    fn decompress(&mut self, len: usize) {
        if let ChannelValues::Uniform(u) = self.values {
            self.values = match self.depth {
                ChannelDepth::Bits8 => ChannelValues::U8(vec![u as u8; len]),
                ChannelDepth::Bits16 => ChannelValues::U16(vec![u as u16; len]),
                ChannelDepth::Bits32 => ChannelValues::U32(vec![u as u32; len]),
                ChannelDepth::Bits64 => ChannelValues::U64(vec![u; len]),
            };
        }
    }

    fn uniform_value(&self) -> Option<u64> {
        match &self.values {
            ChannelValues::Uniform(v) => Some(*v),
            ChannelValues::U8(v) => all_equal(v).map(|x| x as u64),
            ChannelValues::U16(v) => all_equal(v).map(|x| x as u64),
            ChannelValues::U32(v) => all_equal(v).map(|x| x as u64),
            ChannelValues::U64(v) => all_equal(v),
        }
    }
}

fn all_equal<T: Copy + PartialEq>(values: &[T]) -> Option<T> {
    let first = *values.first()?;

    values.iter().all(|v| *v == first).then(|| first)
}

/// Converts a raw value between channels of different depths, preserving the float meaning of the SDF channel.
#[inline]
pub(crate) fn convert_raw(channel: ChannelId, src: ChannelDepth, dst: ChannelDepth, raw: u64) -> u64 {
    if src == dst {
        raw
    } else if channel == ChannelId::Sdf {
        dst.encode_f(src.decode_f(raw))
    } else {
        raw & dst.mask()
    }
}

/// A dense 3D array of voxels with `MAX_CHANNELS` channels and optional per-voxel metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelBuffer {
    size: Point3i,
    channels: Vec<Channel>,
    metadata: SmallKeyHashMap<Point3i, VoxelMetadata>,
}

impl VoxelBuffer {
    /// Creates a buffer of `size` with the default channel format, i.e. empty SDF and zero everywhere else.
    pub fn new(size: Point3i) -> Self {
        Self::with_format(size, &ChannelFormat::default())
    }

    /// Creates a buffer of `size` where every channel has the depth and value given by `format`.
    pub fn with_format(size: Point3i, format: &ChannelFormat) -> Self {
        let channels = ChannelId::ALL
            .iter()
            .map(|c| Channel::uniform(format.depth(*c), format.default_value(*c)))
            .collect();

        Self {
            size: size.join(&Point3i::ZERO),
            channels,
            metadata: SmallKeyHashMap::default(),
        }
    }

    #[inline]
    pub fn size(&self) -> Point3i {
        self.size
    }

    /// The extent of the buffer in its own local coordinates.
    #[inline]
    pub fn extent(&self) -> Extent3i {
        Extent3i::from_min_and_shape(Point3i::ZERO, self.size)
    }

    #[inline]
    pub fn volume(&self) -> usize {
        self.extent().num_points()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    #[inline]
    pub fn contains(&self, pos: Point3i) -> bool {
        self.extent().contains(pos)
    }

    #[inline]
    pub fn channel_depth(&self, channel: ChannelId) -> ChannelDepth {
        self.channels[channel.index()].depth
    }

    /// The depths of all channels, paired with the standard default values.
    pub fn format(&self) -> ChannelFormat {
        ChannelId::ALL.iter().fold(ChannelFormat::default(), |format, c| {
            format.with_depth(*c, self.channel_depth(*c))
        })
    }

    #[inline]
    fn index(&self, pos: Point3i) -> usize {
        debug_assert!(
            self.contains(pos),
            "{:?} is out of bounds of buffer with size {:?}",
            pos,
            self.size
        );

        self.extent().linear_index(pos)
    }

    /// Reads the raw value of `channel` at `pos`.
    #[inline]
    pub fn get_voxel(&self, pos: Point3i, channel: ChannelId) -> u64 {
        self.channels[channel.index()].get(self.index(pos))
    }

    /// Writes the raw `value` of `channel` at `pos`, truncated to the channel depth.
    #[inline]
    pub fn set_voxel(&mut self, value: u64, pos: Point3i, channel: ChannelId) {
        let index = self.index(pos);
        let len = self.volume();
        self.channels[channel.index()].set(index, value, len);
    }

    #[inline]
    pub fn get_voxel_f(&self, pos: Point3i, channel: ChannelId) -> f32 {
        self.channel_depth(channel)
            .decode_f(self.get_voxel(pos, channel))
    }

    #[inline]
    pub fn set_voxel_f(&mut self, value: f32, pos: Point3i, channel: ChannelId) {
        let raw = self.channel_depth(channel).encode_f(value);
        self.set_voxel(raw, pos, channel);
    }

    /// Sets every voxel of `channel` to `value`.
    pub fn fill(&mut self, value: u64, channel: ChannelId) {
        self.channels[channel.index()].fill(value);
    }

    pub fn fill_f(&mut self, value: f32, channel: ChannelId) {
        let raw = self.channel_depth(channel).encode_f(value);
        self.fill(raw, channel);
    }

    /// Sets every voxel of `channel` within `area` to `value`. The area is clipped to the buffer.
    pub fn fill_area(&mut self, value: u64, area: &Extent3i, channel: ChannelId) {
        let area = area.intersection(&self.extent());
        if area.is_empty() {
            return;
        }
        if area == self.extent() {
            self.fill(value, channel);
            return;
        }
        for p in area.iter_points() {
            self.set_voxel(value, p, channel);
        }
    }

    pub fn fill_area_f(&mut self, value: f32, area: &Extent3i, channel: ChannelId) {
        let raw = self.channel_depth(channel).encode_f(value);
        self.fill_area(raw, area, channel);
    }

    /// Returns `true` iff `channel` is currently held as a single value.
    #[inline]
    pub fn is_uniform(&self, channel: ChannelId) -> bool {
        matches!(self.channels[channel.index()].values, ChannelValues::Uniform(_))
    }

    /// Collapses every dense channel whose voxels are all equal back into a uniform value.
    pub fn compress_uniform_channels(&mut self) {
        for channel in self.channels.iter_mut() {
            if let Some(v) = channel.uniform_value() {
                channel.fill(v);
            }
        }
    }

    /// Copies `channel` from `src_extent` of `src` (in `src` local coordinates) so that `src_extent.minimum` lands on
    /// `dst_min` in `self`. Parts of the copy falling outside of either buffer are skipped.
    pub fn copy_channel_from(
        &mut self,
        src: &VoxelBuffer,
        src_extent: &Extent3i,
        dst_min: Point3i,
        channel: ChannelId,
    ) {
        self.copy_channel_from_impl(src, src_extent, dst_min, channel, None);
    }

    /// Like `copy_channel_from`, but voxels whose raw source value equals `mask_value` are skipped, leaving the destination
    /// value in place.
    pub fn copy_channel_from_masked(
        &mut self,
        src: &VoxelBuffer,
        src_extent: &Extent3i,
        dst_min: Point3i,
        channel: ChannelId,
        mask_value: u64,
    ) {
        self.copy_channel_from_impl(src, src_extent, dst_min, channel, Some(mask_value));
    }

    fn copy_channel_from_impl(
        &mut self,
        src: &VoxelBuffer,
        src_extent: &Extent3i,
        dst_min: Point3i,
        channel: ChannelId,
        mask_value: Option<u64>,
    ) {
        let offset = dst_min - src_extent.minimum;
        let src_extent = src_extent
            .intersection(&src.extent())
            .intersection(&(self.extent() - offset));
        if src_extent.is_empty() {
            return;
        }

        let src_depth = src.channel_depth(channel);
        let dst_depth = self.channel_depth(channel);

        let src_channel = &src.channels[channel.index()];
        if let ChannelValues::Uniform(u) = src_channel.values {
            if mask_value != Some(u) {
                let raw = convert_raw(channel, src_depth, dst_depth, u);
                self.fill_area(raw, &(src_extent + offset), channel);
            }
            return;
        }

        for p in src_extent.iter_points() {
            let raw = src_channel.get(src.index(p));
            if mask_value == Some(raw) {
                continue;
            }
            self.set_voxel(convert_raw(channel, src_depth, dst_depth, raw), p + offset, channel);
        }
    }

    /// Copies every channel selected by `channels_mask` from all of `src` into `self`, placing the origin of `src` at `dst_min`.
    pub fn copy_from(&mut self, src: &VoxelBuffer, dst_min: Point3i, channels_mask: u8) {
        let src_extent = src.extent();
        for channel in ChannelId::iter_mask(channels_mask) {
            self.copy_channel_from(src, &src_extent, dst_min, channel);
        }
    }

    pub fn get_voxel_metadata(&self, pos: Point3i) -> Option<&VoxelMetadata> {
        self.metadata.get(&pos)
    }

    /// Attaches `meta` to the voxel at `pos`, or removes any metadata there if `meta` is `None`.
    pub fn set_voxel_metadata(&mut self, pos: Point3i, meta: Option<VoxelMetadata>) {
        debug_assert!(self.contains(pos));
        match meta {
            Some(m) => {
                self.metadata.insert(pos, m);
            }
            None => {
                self.metadata.remove(&pos);
            }
        }
    }

    /// Calls `visitor` on every metadata entry within `area`, stopping at the first error.
    pub fn for_each_voxel_metadata_in_area<E>(
        &self,
        area: &Extent3i,
        mut visitor: impl FnMut(Point3i, &VoxelMetadata) -> Result<(), E>,
    ) -> Result<(), E> {
        for (pos, meta) in self.metadata.iter() {
            if area.contains(*pos) {
                visitor(*pos, meta)?;
            }
        }

        Ok(())
    }

    pub fn clear_voxel_metadata_in_area(&mut self, area: &Extent3i) {
        self.metadata.retain(|pos, _| !area.contains(*pos));
    }

    pub fn metadata_count(&self) -> usize {
        self.metadata.len()
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
