//! Connected-component labeling of solid voxels.

use sculpt_blocks_core::prelude::*;

/// Labels are stored in one byte per voxel, and 0 means "no label."
pub const MAX_LABELS: u8 = u8::MAX;

/// Labels 6-connected regions of a predicate, reusing its scratch space across scans.
#[derive(Default)]
pub struct IslandFinder {
    spans: Vec<Span>,
}

impl IslandFinder {
    /// Assigns labels `1..=n` to the 6-connected components of voxels in `extent` satisfying `is_solid`, writing one label per
    /// voxel into `labels` (indexed by `extent.linear_index`). Voxels that are not solid get 0. Returns `n`.
    ///
    /// At most `MAX_LABELS` components are labeled; any further components are left at 0.
    pub fn scan_3d(
        &mut self,
        extent: &Extent3i,
        is_solid: impl Fn(Point3i) -> bool,
        labels: &mut [u8],
    ) -> u8 {
        assert_eq!(labels.len(), extent.num_points());

        for l in labels.iter_mut() {
            *l = 0;
        }

        let mut label_count = 0;
        for p in extent.iter_points() {
            if labels[extent.linear_index(p)] != 0 || !is_solid(p) {
                continue;
            }
            if label_count == MAX_LABELS {
                tracing::warn!(
                    "Found more than {} islands in {:?}, the rest stay unlabeled",
                    MAX_LABELS,
                    extent
                );
                break;
            }
            label_count += 1;

            let label = label_count;
            self.flood_fill(extent, p, |q| {
                let i = extent.linear_index(q);
                if labels[i] == 0 && is_solid(q) {
                    labels[i] = label;
                    true
                } else {
                    false
                }
            });
        }

        label_count
    }

    /// Visits the 6-connected region around `seed` where `visitor` returns `true`. `visitor` must mark the points it accepts so
    /// it returns `false` when it sees them again.
    ///
    /// Fills whole runs along X at a time, then scans the 4 parallel runs in Y and Z for more of the region.
    fn flood_fill(&mut self, bounds: &Extent3i, seed: Point3i, mut visitor: impl FnMut(Point3i) -> bool) {
        if !visitor(seed) {
            return;
        }

        let bounds_max = bounds.max();

        self.spans.clear();
        self.spans.push(Span {
            x_min: seed.x(),
            x_max: seed.x(),
            y: seed.y(),
            z: seed.z(),
            grow_left: true,
            grow_right: true,
        });

        while let Some(span) = self.spans.pop() {
            let mut x_min = span.x_min;
            if span.grow_left {
                while x_min > bounds.minimum.x() && visitor(PointN([x_min - 1, span.y, span.z])) {
                    x_min -= 1;
                }
            }
            let mut x_max = span.x_max;
            if span.grow_right {
                while x_max < bounds_max.x() && visitor(PointN([x_max + 1, span.y, span.z])) {
                    x_max += 1;
                }
            }

            for (dy, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)].iter() {
                let y = span.y + dy;
                let z = span.z + dz;
                if y < bounds.minimum.y() || y > bounds_max.y() || z < bounds.minimum.z() || z > bounds_max.z() {
                    continue;
                }

                let mut run_start = None;
                for x in x_min..=x_max {
                    if visitor(PointN([x, y, z])) {
                        if run_start.is_none() {
                            run_start = Some(x);
                        }
                    } else if let Some(start) = run_start.take() {
                        self.spans.push(Span {
                            x_min: start,
                            x_max: x - 1,
                            y,
                            z,
                            grow_left: start == x_min,
                            grow_right: false,
                        });
                    }
                }
                if let Some(start) = run_start {
                    self.spans.push(Span {
                        x_min: start,
                        x_max,
                        y,
                        z,
                        grow_left: start == x_min,
                        grow_right: true,
                    });
                }
            }
        }
    }
}

// A run of filled voxels along X. Only the ends touching the parent run's ends may extend further.
#[derive(Clone, Copy, Debug)]
struct Span {
    x_min: i32,
    x_max: i32,
    y: i32,
    z: i32,
    grow_left: bool,
    grow_right: bool,
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
    use sculpt_blocks_storage::prelude::*;
    use utilities::{data_sets::sphere_sdf_buffer, test::label_slice};

    fn scan(extent: &Extent3i, is_solid: impl Fn(Point3i) -> bool) -> (u8, Vec<u8>) {
        let mut labels = vec![0; extent.num_points()];
        let count = IslandFinder::default().scan_3d(extent, is_solid, &mut labels);

        (count, labels)
    }

    #[test]
    fn separate_boxes_get_separate_labels() {
        let extent = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(10));
        let a = Extent3i::from_min_and_max(Point3i::fill(1), Point3i::fill(3));
        let b = Extent3i::from_min_and_max(Point3i::fill(5), Point3i::fill(8));

        let (count, labels) = scan(&extent, |p| a.contains(p) || b.contains(p));

        assert_eq!(count, 2);
        let label_a = labels[extent.linear_index(Point3i::fill(2))];
        let label_b = labels[extent.linear_index(Point3i::fill(6))];
        assert_ne!(label_a, label_b);
        for p in extent.iter_points() {
            let l = labels[extent.linear_index(p)];
            if a.contains(p) {
                assert_eq!(l, label_a);
            } else if b.contains(p) {
                assert_eq!(l, label_b);
            } else {
                assert_eq!(l, 0);
            }
        }
    }

    #[test]
    fn diagonal_neighbors_are_not_connected() {
        let extent = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(4));
        let (count, _) = scan(&extent, |p| p == Point3i::fill(1) || p == Point3i::fill(2));
        assert_eq!(count, 2);
    }

    #[test]
    fn winding_shape_is_one_island() {
        // A comb: a spine along Y at x = 0 with teeth along X at every other Y, plus a bridge along Z.
        let extent = Extent3i::from_min_and_shape(PointN([-2, -2, -2]), PointN([12, 12, 6]));
        let is_solid = |p: Point3i| {
            let spine = p.x() == 0 && p.z() == 0 && (0..9).contains(&p.y());
            let tooth = p.y() % 2 == 0 && p.z() == 0 && (0..9).contains(&p.x()) && (0..9).contains(&p.y());
            let bridge = p.x() == 8 && p.y() == 8 && (0..3).contains(&p.z());
            spine || tooth || bridge
        };

        let (count, labels) = scan(&extent, is_solid);

        assert_eq!(count, 1);
        for p in extent.iter_points() {
            assert_eq!(labels[extent.linear_index(p)] == 1, is_solid(p));
        }
    }

    #[test]
    fn sphere_is_one_island() {
        let (sphere, _radius) = sphere_sdf_buffer(32);
        let extent = sphere.extent();

        let (count, labels) = scan(&extent, |p| sphere.get_voxel_f(p, ChannelId::Sdf) < 0.0);

        assert_eq!(count, 1);
        let labeled = labels.iter().filter(|l| **l == 1).count();
        let slice = label_slice(&extent, &labels, 16);
        assert!(labeled > 0);
        assert_eq!(slice.lines().count(), 32);
        assert!(slice.contains('1'));
    }

    #[test]
    fn labels_stop_at_max() {
        // 8^3 = 512 isolated voxels.
        let extent = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(16));
        let is_solid = |p: Point3i| p.x() % 2 == 0 && p.y() % 2 == 0 && p.z() % 2 == 0;

        let (count, labels) = scan(&extent, is_solid);

        assert_eq!(count, MAX_LABELS);
        let labeled = labels.iter().filter(|l| **l != 0).count();
        assert_eq!(labeled, MAX_LABELS as usize);
    }
}
