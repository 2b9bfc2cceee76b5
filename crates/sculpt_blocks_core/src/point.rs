use core::ops::{Add, BitAnd, Div, Mul, Neg, Shl, Shr, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point on the voxel lattice, or in the continuous space around it. Just a primitive array of type `N`.
///
/// ```
/// use sculpt_blocks_core::prelude::*;
///
/// let p1 = PointN([1, 2, 3]);
/// let p2 = PointN([3, 4, 5]);
///
/// assert_eq!(p1 + p2, PointN([4, 6, 8]));
/// assert_eq!(p1 - p2, PointN([-2, -2, -2]));
/// assert_eq!(p1 * 2, PointN([2, 4, 6]));
/// assert_eq!(p1.meet(&PointN([2, 0, 4])), PointN([1, 0, 3]));
/// ```
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct PointN<N>(pub N);

/// A 3-dimensional point with scalar type `T`.
pub type Point3<T> = PointN<[T; 3]>;
/// Voxel coordinates.
pub type Point3i = PointN<[i32; 3]>;
/// Continuous coordinates, measured in voxels.
pub type Point3f = PointN<[f32; 3]>;

impl<T: Copy> Point3<T> {
    /// A point with every component equal to `value`.
    #[inline]
    pub fn fill(value: T) -> Self {
        PointN([value; 3])
    }

    #[inline]
    pub fn x(&self) -> T {
        self.0[0]
    }

    #[inline]
    pub fn y(&self) -> T {
        self.0[1]
    }

    #[inline]
    pub fn z(&self) -> T {
        self.0[2]
    }

    #[inline]
    fn map(self, f: impl Fn(T) -> T) -> Self {
        PointN([f(self.0[0]), f(self.0[1]), f(self.0[2])])
    }

    #[inline]
    fn zip(self, other: Self, f: impl Fn(T, T) -> T) -> Self {
        PointN([
            f(self.0[0], other.0[0]),
            f(self.0[1], other.0[1]),
            f(self.0[2], other.0[2]),
        ])
    }
}

impl Point3i {
    pub const ZERO: Self = PointN([0; 3]);
    pub const ONES: Self = PointN([1; 3]);

    /// Component-wise minimum.
    #[inline]
    pub fn meet(&self, other: &Self) -> Self {
        self.zip(*other, i32::min)
    }

    /// Component-wise maximum.
    #[inline]
    pub fn join(&self, other: &Self) -> Self {
        self.zip(*other, i32::max)
    }

    /// The product of the components, widened so large shapes don't overflow.
    #[inline]
    pub fn volume(&self) -> i64 {
        self.x() as i64 * self.y() as i64 * self.z() as i64
    }

    /// The 26 neighbors of the origin, in row-major order.
    pub fn moore_offsets() -> Vec<Self> {
        let mut offsets = Vec::with_capacity(26);
        for z in -1..=1 {
            for y in -1..=1 {
                for x in -1..=1 {
                    if (x, y, z) != (0, 0, 0) {
                        offsets.push(PointN([x, y, z]));
                    }
                }
            }
        }

        offsets
    }
}

impl Point3f {
    pub const ZERO: Self = PointN([0.0; 3]);

    #[inline]
    pub fn floor(&self) -> Self {
        self.map(f32::floor)
    }

    /// The fractional part of each component, always in `[0, 1)`.
    #[inline]
    pub fn fract(&self) -> Self {
        *self - self.floor()
    }

    /// The voxel containing this point, i.e. each component rounded towards negative infinity.
    #[inline]
    pub fn floor_int(&self) -> Point3i {
        let f = self.floor();

        PointN([f.x() as i32, f.y() as i32, f.z() as i32])
    }

    /// Truncates each component towards zero.
    #[inline]
    pub fn trunc_int(&self) -> Point3i {
        PointN([self.x() as i32, self.y() as i32, self.z() as i32])
    }

    #[inline]
    fn dot(&self, other: &Self) -> f32 {
        self.x() * other.x() + self.y() * other.y() + self.z() * other.z()
    }

    #[inline]
    fn norm(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// The unit vector in the same direction, or zero if `self` is zero.
    #[inline]
    pub fn normalized(&self) -> Self {
        let n = self.norm();
        if n > 0.0 {
            *self / n
        } else {
            *self
        }
    }

    #[inline]
    pub fn distance(&self, other: &Self) -> f32 {
        (*self - *other).norm()
    }
}

impl From<Point3i> for Point3f {
    #[inline]
    fn from(p: Point3i) -> Self {
        PointN([p.x() as f32, p.y() as f32, p.z() as f32])
    }
}

impl<T: Copy + Add<Output = T>> Add for Point3<T> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a + b)
    }
}

impl<T: Copy + Sub<Output = T>> Sub for Point3<T> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a - b)
    }
}

impl<T: Copy + Neg<Output = T>> Neg for Point3<T> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        self.map(|c| -c)
    }
}

impl<T: Copy + Mul<Output = T>> Mul<T> for Point3<T> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: T) -> Self {
        self.map(|c| c * rhs)
    }
}

impl Div<f32> for Point3f {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f32) -> Self {
        self.map(|c| c / rhs)
    }
}

// Shifts are arithmetic. Block addressing depends on negative coordinates rounding towards negative infinity.

impl Shr<i32> for Point3i {
    type Output = Self;

    #[inline]
    fn shr(self, rhs: i32) -> Self {
        self.map(|c| c >> rhs)
    }
}

impl Shl<i32> for Point3i {
    type Output = Self;

    #[inline]
    fn shl(self, rhs: i32) -> Self {
        self.map(|c| c << rhs)
    }
}

impl BitAnd<i32> for Point3i {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: i32) -> Self {
        self.map(|c| c & rhs)
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

    use pretty_assertions::assert_eq;
    use rand::Rng;

    #[test]
    fn shift_round_trip_is_identity_for_block_coordinates() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let b = PointN([
                rng.gen_range(-100_000..100_000),
                rng.gen_range(-100_000..100_000),
                rng.gen_range(-100_000..100_000),
            ]);
            assert_eq!((b << 4) >> 4, b);
        }
    }

    #[test]
    fn right_shift_floors_negative_coordinates() {
        assert_eq!(Point3i::fill(-1) >> 4, Point3i::fill(-1));
        assert_eq!(Point3i::fill(-16) >> 4, Point3i::fill(-1));
        assert_eq!(Point3i::fill(-17) >> 4, Point3i::fill(-2));
        assert_eq!(Point3i::fill(15) >> 4, Point3i::ZERO);
    }

    #[test]
    fn fract_and_floor_int_for_negative_points() {
        let p = PointN([-0.25, 1.5, -2.0]);
        assert_eq!(p.fract(), PointN([0.75, 0.5, 0.0]));
        assert_eq!(p.floor_int(), PointN([-1, 1, -2]));
        assert_eq!(p.trunc_int(), PointN([0, 1, -2]));
    }

    #[test]
    fn normalizing_zero_gives_zero() {
        assert_eq!(Point3f::ZERO.normalized(), Point3f::ZERO);
        assert_eq!(PointN([0.0, 3.0, 4.0]).normalized(), PointN([0.0, 0.6, 0.8]));
    }

    #[test]
    fn moore_offsets_exclude_center() {
        let offsets = Point3i::moore_offsets();
        assert_eq!(offsets.len(), 26);
        assert!(!offsets.contains(&Point3i::ZERO));
    }
}
