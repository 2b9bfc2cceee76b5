//! Raycasts against signed distance fields.
//!
//! A raycast runs in two phases. First the ray marches through the voxel grid until it finds a solid voxel (SDF < 0). Then,
//! optionally, a binary search over the trilinearly interpolated SDF refines the distance to the actual isosurface between the
//! last empty voxel and the solid one.

use crate::GridRayTraversal3;

use sculpt_blocks_core::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The upper bound on binary search iterations when refining a raycast hit.
pub const MAX_BINARY_SEARCH_ITERATIONS: u32 = 16;

/// Marching cubes surfaces are centered between lattice points, so the grid phase of a raycast runs on a ray offset by this
/// much on each axis.
const GRID_OFFSET: f32 = 0.5;

/// The outcome of a raycast that hit something.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct RaycastResult {
    /// The first solid voxel along the ray.
    pub position: Point3i,
    /// The voxel visited just before `position`, usually empty. Equal to `position` if the ray started inside matter.
    pub previous_position: Point3i,
    /// Distance along the ray to the surface.
    pub distance: f32,
}

/// The grid-phase hit of `voxel_raycast`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelRaycastHit {
    pub position: Point3i,
    pub previous_position: Point3i,
    /// Distance along the ray where it entered `position`.
    pub distance: f32,
    /// Distance along the ray where it entered `previous_position`.
    pub previous_distance: f32,
}

/// Visits voxels along the ray from `origin` in unit `direction`, starting with the voxel containing `origin`, until
/// `predicate` returns `true` or the ray travels farther than `max_distance`. An infinite `max_distance` or a non-finite ray
/// never hits.
pub fn voxel_raycast(
    origin: Point3f,
    direction: Point3f,
    max_distance: f32,
    mut predicate: impl FnMut(Point3i) -> bool,
) -> Option<VoxelRaycastHit> {
    let finite = |p: Point3f| p.0.iter().all(|c| c.is_finite());
    if direction == Point3f::ZERO || !max_distance.is_finite() || !finite(direction) || !finite(origin) {
        return None;
    }

    let mut traversal = GridRayTraversal3::new(origin, direction);
    let mut previous_position = traversal.current_voxel();
    let mut previous_distance = 0.0;
    loop {
        let distance = traversal.current_t();
        if distance > max_distance {
            return None;
        }
        let position = traversal.current_voxel();
        if predicate(position) {
            return Some(VoxelRaycastHit {
                position,
                previous_position,
                distance,
                previous_distance,
            });
        }
        previous_position = position;
        previous_distance = distance;
        traversal.step();
    }
}

/// Trilinear interpolation of `sdf` over the 8 lattice points around `pos`.
pub fn get_sdf_interpolated(sdf: impl Fn(Point3i) -> f32, pos: Point3f) -> f32 {
    let c = pos.floor_int();
    let f = pos.fract();

    let s000 = sdf(c);
    let s100 = sdf(c + PointN([1, 0, 0]));
    let s010 = sdf(c + PointN([0, 1, 0]));
    let s110 = sdf(c + PointN([1, 1, 0]));
    let s001 = sdf(c + PointN([0, 0, 1]));
    let s101 = sdf(c + PointN([1, 0, 1]));
    let s011 = sdf(c + PointN([0, 1, 1]));
    let s111 = sdf(c + PointN([1, 1, 1]));

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

    let s00 = lerp(s000, s100, f.x());
    let s10 = lerp(s010, s110, f.x());
    let s01 = lerp(s001, s101, f.x());
    let s11 = lerp(s011, s111, f.x());

    let s0 = lerp(s00, s10, f.y());
    let s1 = lerp(s01, s11, f.y());

    lerp(s0, s1, f.z())
}

/// Searches for the zero crossing of the interpolated `sdf` on the segment of the ray starting at `pos0` and ending `d1` units
/// along `dir`. Returns the distance from `pos0` whose sample is closest to the surface.
///
/// The segment usually comes from a grid-phase hit, so it may not contain the crossing. Before searching, the start is pulled
/// back while it's inside matter and the end pushed forward while it's outside, by up to 4 half-voxel steps each. If the ends
/// still don't straddle the surface, the closer of the two is returned without bisecting.
pub fn approximate_distance_to_isosurface_binary_search(
    sdf: impl Fn(Point3i) -> f32,
    pos0: Point3f,
    dir: Point3f,
    mut d1: f32,
    iterations: u32,
) -> f32 {
    let sample = |d: f32| get_sdf_interpolated(&sdf, pos0 + dir * d);

    let mut d0 = 0.0;
    let mut sdf0 = sample(d0);
    for _ in 0..4 {
        if sdf0 >= 0.0 {
            break;
        }
        d0 -= 0.5;
        sdf0 = sample(d0);
    }

    let mut sdf1 = sample(d1);
    for _ in 0..4 {
        if sdf1 <= 0.0 {
            break;
        }
        d1 += 0.5;
        sdf1 = sample(d1);
    }

    if (sdf0 > 0.0) != (sdf1 > 0.0) {
        for _ in 0..iterations {
            let dm = 0.5 * (d0 + d1);
            let sdf_mid = sample(dm);
            if (sdf_mid > 0.0) != (sdf0 > 0.0) {
                sdf1 = sdf_mid;
                d1 = dm;
            } else {
                sdf0 = sdf_mid;
                d0 = dm;
            }
        }
    }

    if sdf0.abs() < sdf1.abs() {
        d0
    } else {
        d1
    }
}

/// Casts a ray against the surface of `sdf` (negative inside matter).
///
/// `direction` need not be normalized. Up to `binary_search_iterations` (clamped to `MAX_BINARY_SEARCH_ITERATIONS`) steps
/// refine the distance of a hit; zero keeps the grid-phase distance.
pub fn raycast_sdf(
    sdf: impl Fn(Point3i) -> f32,
    origin: Point3f,
    direction: Point3f,
    max_distance: f32,
    binary_search_iterations: u32,
) -> Option<RaycastResult> {
    let dir = direction.normalized();
    let hit = voxel_raycast(
        origin + Point3f::fill(GRID_OFFSET),
        dir,
        max_distance,
        |p| sdf(p) < 0.0,
    )?;

    let iterations = binary_search_iterations.min(MAX_BINARY_SEARCH_ITERATIONS);
    let distance = if iterations > 0 {
        hit.previous_distance
            + approximate_distance_to_isosurface_binary_search(
                &sdf,
                origin + dir * hit.previous_distance,
                dir,
                hit.distance - hit.previous_distance,
                iterations,
            )
    } else {
        hit.distance
    };

    Some(RaycastResult {
        position: hit.position,
        previous_position: hit.previous_position,
        distance,
    })
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

    // Solid where x > `wall_x`, with a linear distance field.
    fn wall(wall_x: f32) -> impl Fn(Point3i) -> f32 {
        move |p: Point3i| wall_x - p.x() as f32
    }

    #[test]
    fn interpolation_reproduces_lattice_values() {
        let sdf = |p: Point3i| (p.x() * 100 + p.y() * 10 + p.z()) as f32;
        for p in Extent3i::from_min_and_shape(Point3i::fill(-2), Point3i::fill(4)).iter_points() {
            assert_eq!(get_sdf_interpolated(sdf, Point3f::from(p)), sdf(p));
        }
    }

    #[test]
    fn interpolation_is_linear_between_lattice_points() {
        let sdf = wall(0.0);
        assert_eq!(get_sdf_interpolated(&sdf, PointN([0.25, 3.5, -1.5])), -0.25);
        assert_eq!(get_sdf_interpolated(&sdf, PointN([-2.75, 0.0, 0.0])), 2.75);

        let corner = |p: Point3i| if p == Point3i::ZERO { 1.0 } else { 0.0 };
        assert_eq!(get_sdf_interpolated(corner, Point3f::fill(0.5)), 0.125);
    }

    #[test]
    fn empty_volume_has_no_hit() {
        let empty = |_: Point3i| 1.0;
        assert_eq!(
            raycast_sdf(empty, Point3f::ZERO, PointN([1.0, 1.0, 0.0]), 50.0, 8),
            None
        );
    }

    #[test]
    fn zero_direction_has_no_hit() {
        assert_eq!(
            raycast_sdf(wall(0.0), Point3f::ZERO, Point3f::ZERO, 10.0, 0),
            None
        );
    }

    #[test]
    fn unbounded_or_non_finite_ray_has_no_hit() {
        let empty = |_: Point3i| 1.0;
        let x = PointN([1.0, 0.0, 0.0]);
        assert_eq!(raycast_sdf(empty, Point3f::ZERO, x, f32::INFINITY, 0), None);
        assert_eq!(raycast_sdf(empty, Point3f::ZERO, x, f32::NAN, 0), None);
        assert_eq!(raycast_sdf(wall(4.5), Point3f::ZERO, x, f32::INFINITY, 0), None);
        assert_eq!(
            raycast_sdf(wall(4.5), Point3f::ZERO, PointN([f32::NAN, 0.0, 0.0]), 10.0, 0),
            None
        );
        assert_eq!(
            raycast_sdf(wall(4.5), PointN([f32::INFINITY, 0.0, 0.0]), x, 10.0, 0),
            None
        );
    }

    #[test]
    fn hit_beyond_max_distance_is_ignored() {
        assert_eq!(
            raycast_sdf(wall(20.5), Point3f::ZERO, PointN([1.0, 0.0, 0.0]), 10.0, 0),
            None
        );
    }

    #[test]
    fn grid_phase_finds_first_solid_voxel() {
        let hit = raycast_sdf(wall(4.5), Point3f::ZERO, PointN([1.0, 0.0, 0.0]), 10.0, 0).unwrap();
        assert_eq!(hit.position, PointN([5, 0, 0]));
        assert_eq!(hit.previous_position, PointN([4, 0, 0]));
        assert_eq!(hit.distance, 4.5);
    }

    #[test]
    fn binary_search_converges_on_isosurface() {
        let hit = raycast_sdf(wall(4.3), Point3f::ZERO, PointN([1.0, 0.0, 0.0]), 10.0, 16).unwrap();
        assert_eq!(hit.position, PointN([5, 0, 0]));
        assert!((hit.distance - 4.3).abs() < 0.01, "{}", hit.distance);
    }

    #[test]
    fn binary_search_without_crossing_returns_closest_end() {
        let empty = |_: Point3i| 1.0;
        let d = approximate_distance_to_isosurface_binary_search(
            empty,
            Point3f::ZERO,
            PointN([1.0, 0.0, 0.0]),
            1.0,
            16,
        );
        // Both ends sample 1.0, so the far end wins the tie.
        assert_eq!(d, 3.0);
    }
}
