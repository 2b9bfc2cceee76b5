//! Voxel channels and the numeric encodings they use.
//!
//! Every voxel carries up to `MAX_CHANNELS` independent values. Generic channels hold unsigned integers (material IDs, packed
//! texture weights); the signed distance channel holds a fixed-point quantized float. Raw values are always exchanged as
//! `u64` and truncated to the channel's `ChannelDepth`.

use crate::StorageError;

use core::convert::TryFrom;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MAX_CHANNELS: usize = 8;

/// Identifies one semantic layer of per-voxel data.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum ChannelId {
    /// Blocky material type.
    Type = 0,
    /// Signed distance. Negative values are inside solid material.
    Sdf = 1,
    Color = 2,
    /// Four packed 4-bit texture indices.
    Indices = 3,
    /// Four packed 4-bit texture weights, parallel to `Indices`.
    Weights = 4,
    Data5 = 5,
    Data6 = 6,
    Data7 = 7,
}

impl ChannelId {
    pub const ALL: [ChannelId; MAX_CHANNELS] = [
        ChannelId::Type,
        ChannelId::Sdf,
        ChannelId::Color,
        ChannelId::Indices,
        ChannelId::Weights,
        ChannelId::Data5,
        ChannelId::Data6,
        ChannelId::Data7,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The bit for this channel in a channel mask.
    #[inline]
    pub fn mask_bit(self) -> u8 {
        1 << self as u8
    }

    /// Iterate over the channels selected by `mask`, in index order.
    pub fn iter_mask(mask: u8) -> impl Iterator<Item = ChannelId> {
        Self::ALL
            .iter()
            .copied()
            .filter(move |c| mask & c.mask_bit() != 0)
    }
}

impl TryFrom<usize> for ChannelId {
    type Error = StorageError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(StorageError::InvalidChannel(index))
    }
}

/// The number of bits stored per voxel in a channel.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum ChannelDepth {
    Bits8,
    Bits16,
    Bits32,
    Bits64,
}

impl Default for ChannelDepth {
    fn default() -> Self {
        ChannelDepth::Bits16
    }
}

impl ChannelDepth {
    /// Default depth for each channel: 8 bits for the blocky type channel, 16 bits for everything else.
    pub fn default_for(channel: ChannelId) -> Self {
        match channel {
            ChannelId::Type => ChannelDepth::Bits8,
            _ => ChannelDepth::Bits16,
        }
    }

    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            ChannelDepth::Bits8 => 8,
            ChannelDepth::Bits16 => 16,
            ChannelDepth::Bits32 => 32,
            ChannelDepth::Bits64 => 64,
        }
    }

    /// Mask that truncates a raw `u64` to this depth.
    #[inline]
    pub fn mask(self) -> u64 {
        match self {
            ChannelDepth::Bits64 => u64::MAX,
            _ => (1u64 << self.bits()) - 1,
        }
    }

    /// Encodes `value` as a raw voxel. 8 and 16 bit channels store signed-normalized fixed point, so `value` is clamped to
    /// `[-1, 1]`. Quantization rounds down, so a value that is negative by any amount never encodes as zero.
    #[inline]
    pub fn encode_f(self, value: f32) -> u64 {
        match self {
            ChannelDepth::Bits8 => snorm_encode(value, 0x7f, 0xff),
            ChannelDepth::Bits16 => snorm_encode(value, 0x7fff, 0xffff),
            ChannelDepth::Bits32 => value.to_bits() as u64,
            ChannelDepth::Bits64 => (value as f64).to_bits(),
        }
    }

    /// Decodes a raw voxel produced by `encode_f`.
    #[inline]
    pub fn decode_f(self, raw: u64) -> f32 {
        match self {
            ChannelDepth::Bits8 => snorm_decode(raw, 0x7f),
            ChannelDepth::Bits16 => snorm_decode(raw, 0x7fff),
            ChannelDepth::Bits32 => f32::from_bits(raw as u32),
            ChannelDepth::Bits64 => f64::from_bits(raw) as f32,
        }
    }

    /// The scale applied to distances before they are written to an SDF channel of this depth, so that the useful range of
    /// the fixed-point encoding covers a few voxels around the surface.
    #[inline]
    pub fn sdf_quantization_scale(self) -> f32 {
        match self {
            ChannelDepth::Bits8 => 0.1,
            ChannelDepth::Bits16 => 0.002,
            _ => 1.0,
        }
    }
}

#[inline]
fn snorm_encode(value: f32, half: u64, max: u64) -> u64 {
    let scaled = (half as f32 * value + half as f32).floor();

    scaled.max(0.0).min(max as f32) as u64
}

#[inline]
fn snorm_decode(raw: u64, half: u64) -> f32 {
    (raw as f32 - half as f32) / half as f32
}

/// Depths and default values for all channels of a volume.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ChannelFormat {
    pub depths: [ChannelDepth; MAX_CHANNELS],
    /// Raw value of each channel wherever nothing has been written.
    pub defaults: [u64; MAX_CHANNELS],
}

impl Default for ChannelFormat {
    fn default() -> Self {
        let mut depths = [ChannelDepth::default(); MAX_CHANNELS];
        for c in ChannelId::ALL.iter() {
            depths[c.index()] = ChannelDepth::default_for(*c);
        }
        let mut defaults = [0; MAX_CHANNELS];
        // Volumes start out empty.
        defaults[ChannelId::Sdf.index()] = depths[ChannelId::Sdf.index()].encode_f(1.0);

        Self { depths, defaults }
    }
}

impl ChannelFormat {
    #[inline]
    pub fn depth(&self, channel: ChannelId) -> ChannelDepth {
        self.depths[channel.index()]
    }

    #[inline]
    pub fn default_value(&self, channel: ChannelId) -> u64 {
        self.defaults[channel.index()]
    }

    /// Changes the depth of `channel`, re-encoding its float default so it keeps the same meaning.
    pub fn with_depth(mut self, channel: ChannelId, depth: ChannelDepth) -> Self {
        let old = self.depth(channel);
        let default_f = old.decode_f(self.default_value(channel));
        self.depths[channel.index()] = depth;
        self.defaults[channel.index()] = if channel == ChannelId::Sdf {
            depth.encode_f(default_f)
        } else {
            self.default_value(channel) & depth.mask()
        };

        self
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
