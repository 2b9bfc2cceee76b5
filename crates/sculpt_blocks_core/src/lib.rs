//! Integer lattice math for voxel volumes.
//!
//! - `PointN`: a point on (or around) the lattice, most importantly `Point3i` and `Point3f`
//! - `ExtentN`: an axis-aligned box, most importantly `Extent3i`

pub mod extent;
pub mod point;

pub use extent::{bounding_extent, Extent3PointIter, Extent3i, ExtentN};
pub use point::{Point3, Point3f, Point3i, PointN};

pub mod prelude {
    pub use super::{bounding_extent, Extent3i, ExtentN, Point3, Point3f, Point3i, PointN};
}
