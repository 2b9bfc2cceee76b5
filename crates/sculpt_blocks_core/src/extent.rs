use crate::{Point3, Point3i, PointN};

use core::ops::{Add, Range, Shr, Sub};
use itertools::{iproduct, ConsTuples, Product};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned box given by its minimum point and its shape. In each dimension it covers the half-open interval
/// `[minimum, minimum + shape)`.
///
/// Integer extents are the unit of every region-level query on a volume: editability checks, edit notifications and area
/// copies all take an `Extent3i`. An extent with zero volume denotes "no region."
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ExtentN<N> {
    /// The least point contained in the extent.
    pub minimum: PointN<N>,
    /// The length of each dimension.
    pub shape: PointN<N>,
}

/// A box of voxels.
pub type Extent3i = ExtentN<[i32; 3]>;

impl<N> ExtentN<N> {
    #[inline]
    pub fn from_min_and_shape(minimum: PointN<N>, shape: PointN<N>) -> Self {
        Self { minimum, shape }
    }
}

impl Extent3i {
    /// Negative shapes are clamped to zero.
    #[inline]
    fn from_min_and_lub(minimum: Point3i, least_upper_bound: Point3i) -> Self {
        let shape = (least_upper_bound - minimum).join(&Point3i::ZERO);

        Self { minimum, shape }
    }

    /// The extent with inclusive corners `minimum` and `max`.
    #[inline]
    pub fn from_min_and_max(minimum: Point3i, max: Point3i) -> Self {
        Self::from_min_and_lub(minimum, max + Point3i::ONES)
    }

    /// The extent with inclusive corners `p1` and `p2`, which don't need to be sorted.
    #[inline]
    pub fn from_corners(p1: Point3i, p2: Point3i) -> Self {
        Self::from_min_and_max(p1.meet(&p2), p1.join(&p2))
    }

    /// The least point `p` for which all points `q` in the extent satisfy `q < p` on every axis.
    #[inline]
    fn least_upper_bound(&self) -> Point3i {
        self.minimum + self.shape
    }

    /// The greatest point in the extent.
    #[inline]
    pub fn max(&self) -> Point3i {
        self.least_upper_bound() - Point3i::ONES
    }

    #[inline]
    pub fn volume(&self) -> i64 {
        self.shape.join(&Point3i::ZERO).volume()
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.volume() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    #[inline]
    pub fn contains(&self, p: Point3i) -> bool {
        let lub = self.least_upper_bound();

        (0..3).all(|i| self.minimum.0[i] <= p.0[i] && p.0[i] < lub.0[i])
    }

    #[inline]
    pub fn intersection(&self, other: &Self) -> Self {
        Self::from_min_and_lub(
            self.minimum.join(&other.minimum),
            self.least_upper_bound().meet(&other.least_upper_bound()),
        )
    }

    /// Empty extents are subsets of everything.
    #[inline]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.is_empty() || self.intersection(other) == *self
    }

    /// The smallest extent containing both `self` and `other`. Empty extents are ignored.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        Self::from_min_and_lub(
            self.minimum.meet(&other.minimum),
            self.least_upper_bound().join(&other.least_upper_bound()),
        )
    }

    /// Grows the extent by `pad_amount` on every side.
    #[inline]
    pub fn padded(&self, pad_amount: i32) -> Self {
        Self::from_min_and_shape(
            self.minimum - Point3i::fill(pad_amount),
            self.shape + Point3i::fill(2 * pad_amount),
        )
    }

    /// Calls `f` on up to 6 disjoint extents that together cover exactly the points of `self` not in `other`.
    pub fn difference(&self, other: &Self, mut f: impl FnMut(Extent3i)) {
        let inner = self.intersection(other);
        if inner.is_empty() {
            if !self.is_empty() {
                f(*self);
            }
            return;
        }

        // Cut a slab off each side of `rest` per axis, then shrink `rest` to `inner` along that axis.
        let mut rest = *self;
        for axis in 0..3 {
            let rest_lub = rest.least_upper_bound().0[axis];
            let inner_min = inner.minimum.0[axis];
            let inner_lub = inner.least_upper_bound().0[axis];

            if inner_min > rest.minimum.0[axis] {
                let mut below = rest;
                below.shape.0[axis] = inner_min - rest.minimum.0[axis];
                f(below);
            }
            if rest_lub > inner_lub {
                let mut above = rest;
                above.minimum.0[axis] = inner_lub;
                above.shape.0[axis] = rest_lub - inner_lub;
                f(above);
            }

            rest.minimum.0[axis] = inner_min;
            rest.shape.0[axis] = inner_lub - inner_min;
        }
    }

    /// Iterates over all points in the extent with X varying fastest, then Y, then Z.
    ///
    /// ```
    /// # use sculpt_blocks_core::prelude::*;
    /// let extent = Extent3i::from_min_and_shape(PointN([0, 0, 0]), PointN([2, 2, 1]));
    /// let points = extent.iter_points().collect::<Vec<_>>();
    /// assert_eq!(points, vec![
    ///     PointN([0, 0, 0]), PointN([1, 0, 0]), PointN([0, 1, 0]), PointN([1, 1, 0])
    /// ]);
    /// ```
    #[inline]
    pub fn iter_points(&self) -> Extent3PointIter {
        let lub = self.least_upper_bound();

        Extent3PointIter {
            // The last range of the product varies fastest.
            zyx: iproduct!(
                self.minimum.z()..lub.z(),
                self.minimum.y()..lub.y(),
                self.minimum.x()..lub.x()
            ),
        }
    }

    /// The position of `p` in `iter_points` order. `p` must be contained in the extent.
    #[inline]
    pub fn linear_index(&self, p: Point3i) -> usize {
        debug_assert!(self.contains(p));
        let local = p - self.minimum;
        let (sx, sy) = (self.shape.x() as usize, self.shape.y() as usize);

        local.x() as usize + sx * (local.y() as usize + sy * local.z() as usize)
    }
}

type ZyxProduct = Product<Product<Range<i32>, Range<i32>>, Range<i32>>;

/// An iterator over all points in an `Extent3i`.
pub struct Extent3PointIter {
    zyx: ConsTuples<ZyxProduct, ((i32, i32), i32)>,
}

impl Iterator for Extent3PointIter {
    type Item = Point3i;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.zyx.next().map(|(z, y, x)| PointN([x, y, z]))
    }
}

impl<T> Add<Point3<T>> for ExtentN<[T; 3]>
where
    Point3<T>: Add<Output = Point3<T>>,
{
    type Output = Self;

    #[inline]
    fn add(self, rhs: Point3<T>) -> Self {
        Self::from_min_and_shape(self.minimum + rhs, self.shape)
    }
}

impl<T> Sub<Point3<T>> for ExtentN<[T; 3]>
where
    Point3<T>: Sub<Output = Point3<T>>,
{
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Point3<T>) -> Self {
        Self::from_min_and_shape(self.minimum - rhs, self.shape)
    }
}

/// The smallest extent of the coarser lattice (scaled down by `2^rhs`) that covers every point of `self`.
impl Shr<i32> for Extent3i {
    type Output = Self;

    #[inline]
    fn shr(self, rhs: i32) -> Self {
        if self.is_empty() {
            return Self::from_min_and_shape(self.minimum >> rhs, Point3i::ZERO);
        }

        Self::from_min_and_max(self.minimum >> rhs, self.max() >> rhs)
    }
}

/// The smallest extent containing all `points`, or `None` if there are none.
pub fn bounding_extent(mut points: impl Iterator<Item = Point3i>) -> Option<Extent3i> {
    let first = points.next()?;
    let (min, max) = points.fold((first, first), |(min, max), p| (min.meet(&p), max.join(&p)));

    Some(Extent3i::from_min_and_max(min, max))
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
