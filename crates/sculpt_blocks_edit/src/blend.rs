//! How edits combine with the voxels already in a volume.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The blend mode of a `VoxelTool`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Mode {
    /// Union of the shape with existing matter.
    Add,
    /// Subtracts the shape from existing matter.
    Remove,
    /// Overwrites existing voxels with the shape.
    Set,
    /// Blends texture indices and weights, leaving the SDF untouched.
    TexturePaint,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Add
    }
}

/// Combines a shape's local signed distance `src` with the existing value `dst`.
///
/// Remove is not the inverse of Add: removing a shape and adding it back only restores voxels that were inside the shape to
/// begin with.
#[inline]
pub fn sdf_blend(src: f32, dst: f32, mode: Mode) -> f32 {
    match mode {
        Mode::Add => src.min(dst),
        Mode::Remove => (-src).max(dst),
        Mode::Set => src,
        Mode::TexturePaint => dst,
    }
}

/// Parameters for `Mode::TexturePaint`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct TextureParams {
    /// Maximum weight gained at the center of the brush, in `[0, 1]`.
    pub opacity: f32,
    /// Exponent of the radial falloff. Higher is a harder brush.
    pub sharpness: f32,
    /// The 4-bit texture index to paint.
    pub index: u8,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            sharpness: 2.0,
            index: 0,
        }
    }
}

impl TextureParams {
    /// Brush strength at `distance` from the center of a brush of `radius`.
    #[inline]
    pub fn falloff(&self, distance: f32, radius: f32) -> f32 {
        if radius <= 0.0 || distance >= radius {
            return 0.0;
        }
        let t = 1.0 - distance / radius;

        (self.opacity * t.powf(self.sharpness)).max(0.0).min(1.0)
    }
}

const TEXTURE_SLOTS: usize = 4;
const MAX_WEIGHT: f32 = 15.0;

#[inline]
fn unpack_nibbles(packed: u64) -> [u8; TEXTURE_SLOTS] {
    let mut out = [0; TEXTURE_SLOTS];
    for (i, n) in out.iter_mut().enumerate() {
        *n = ((packed >> (4 * i)) & 0xf) as u8;
    }

    out
}

#[inline]
fn pack_nibbles(nibbles: [u8; TEXTURE_SLOTS]) -> u64 {
    nibbles
        .iter()
        .enumerate()
        .fold(0, |acc, (i, n)| acc | (((*n & 0xf) as u64) << (4 * i)))
}

/// Paints `params.index` with `strength` into a voxel's packed texture `indices` and `weights` (4 slots of 4 bits each).
///
/// If the texture isn't in any slot yet, it replaces the slot with the lowest weight. The painted slot moves toward full
/// weight while the others fade by the same fraction. Returns the new `(indices, weights)`.
pub fn blend_texture(indices: u64, weights: u64, params: &TextureParams, strength: f32) -> (u64, u64) {
    let index = params.index & 0xf;
    let mut slot_indices = unpack_nibbles(indices);
    let slot_weights = unpack_nibbles(weights);
    let mut new_weights = [0.0f32; TEXTURE_SLOTS];
    for i in 0..TEXTURE_SLOTS {
        new_weights[i] = slot_weights[i] as f32;
    }

    let slot = match slot_indices.iter().position(|i| *i == index) {
        Some(slot) => slot,
        None => {
            let lightest = (0..TEXTURE_SLOTS)
                .min_by_key(|i| slot_weights[*i])
                .unwrap_or(0);
            slot_indices[lightest] = index;
            new_weights[lightest] = 0.0;
            lightest
        }
    };

    let s = strength.max(0.0).min(1.0);
    for (i, w) in new_weights.iter_mut().enumerate() {
        if i == slot {
            *w += (MAX_WEIGHT - *w) * s;
        } else {
            *w *= 1.0 - s;
        }
    }

    let mut packed_weights = [0; TEXTURE_SLOTS];
    for i in 0..TEXTURE_SLOTS {
        packed_weights[i] = new_weights[i].round() as u8;
    }

    (pack_nibbles(slot_indices), pack_nibbles(packed_weights))
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

    use rand::Rng;

    #[test]
    fn blend_laws_hold() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let s: f32 = rng.gen_range(-1.0..1.0);
            let d: f32 = rng.gen_range(-1.0..1.0);
            assert_eq!(sdf_blend(s, d, Mode::Add), s.min(d));
            assert_eq!(sdf_blend(s, d, Mode::Remove), (-s).max(d));
            assert_eq!(sdf_blend(s, d, Mode::Set), s);
            assert_eq!(sdf_blend(s, d, Mode::TexturePaint), d);
        }
    }

    #[test]
    fn remove_then_add_does_not_restore_solid() {
        // Fully solid start, and a shape whose surface passes through this voxel.
        let original = -1.0;
        let shape = 0.25;

        let removed = sdf_blend(shape, original, Mode::Remove);
        let restored = sdf_blend(shape, removed, Mode::Add);

        assert_eq!(removed, -0.25);
        assert_eq!(restored, -0.25);
        assert_ne!(restored, original);
    }

    #[test]
    fn remove_is_a_relative_complement() {
        // Deep inside the shape becomes empty, far outside keeps existing matter.
        assert!(sdf_blend(-1.0, -1.0, Mode::Remove) > 0.0);
        assert!(sdf_blend(1.0, -1.0, Mode::Remove) < 0.0);
    }

    #[test]
    fn falloff_is_strongest_at_center() {
        let params = TextureParams::default();
        assert_eq!(params.falloff(0.0, 4.0), 1.0);
        assert!(params.falloff(2.0, 4.0) < params.falloff(1.0, 4.0));
        assert_eq!(params.falloff(4.0, 4.0), 0.0);
        assert_eq!(params.falloff(1.0, 0.0), 0.0);
    }

    #[test]
    fn painting_new_texture_takes_lightest_slot() {
        let params = TextureParams {
            index: 3,
            ..Default::default()
        };
        // Slots hold textures 1, 2, 4, 5 with weights 15, 0, 0, 0.
        let indices = 0x5421;
        let weights = 0x000f;

        let (indices, weights) = blend_texture(indices, weights, &params, 1.0);

        assert_eq!(indices, 0x5431);
        assert_eq!(weights, 0x00f0);
    }

    #[test]
    fn partial_paint_fades_other_slots() {
        let params = TextureParams::default();
        let (indices, weights) = blend_texture(0x3210, 0x000f, &params, 0.0);
        assert_eq!((indices, weights), (0x3210, 0x000f));

        let params = TextureParams {
            index: 1,
            ..Default::default()
        };
        let (_, weights) = blend_texture(0x3210, 0x000f, &params, 0.5);
        let slot0 = weights & 0xf;
        let slot1 = (weights >> 4) & 0xf;
        assert_eq!(slot0, 8);
        assert_eq!(slot1, 8);
    }
}
