use sculpt_blocks_core::prelude::*;

/// Grid traversal algorithm by Amanatides and Woo. Visits every voxel intersecting the given ray, in order, along with the ray
/// parameter at which the ray entered each voxel.
pub struct GridRayTraversal3 {
    current_voxel: Point3i,
    // Either -1, 0 or +1 in each axis.
    step: [i32; 3],
    // How much `t` grows while crossing one voxel along each axis.
    t_delta: [f32; 3],
    // The value of `t` at the next boundary crossing on each axis.
    t_max: [f32; 3],
    // The value of `t` when the ray entered `current_voxel`.
    t_current: f32,
}

impl GridRayTraversal3 {
    /// Initialize the traversal, beginning at the `start` position and moving along `velocity`. Axes with zero velocity are
    /// never stepped. If `velocity` has unit length, `t` is the distance traveled.
    pub fn new(start: Point3f, velocity: Point3f) -> Self {
        let current_voxel = start.floor_int();
        let mut step = [0; 3];
        let mut t_delta = [f32::INFINITY; 3];
        let mut t_max = [f32::INFINITY; 3];

        for axis in 0..3 {
            let v = velocity.0[axis];
            if v == 0.0 {
                continue;
            }
            // For a positive velocity the next boundary is the far side of the current voxel, for negative it's the near side.
            let (s, next_bound) = if v > 0.0 {
                (1, (current_voxel.0[axis] + 1) as f32)
            } else {
                (-1, current_voxel.0[axis] as f32)
            };
            step[axis] = s;
            t_delta[axis] = 1.0 / v.abs();
            t_max[axis] = (next_bound - start.0[axis]) / v;
        }

        Self {
            current_voxel,
            step,
            t_delta,
            t_max,
            t_current: 0.0,
        }
    }

    /// Move to the next voxel along the ray, crossing whichever boundary comes first. Ties go to the highest axis.
    #[inline]
    pub fn step(&mut self) {
        let [tx, ty, tz] = self.t_max;
        let axis = match (tx < ty, tx < tz, ty < tz) {
            (true, true, _) => 0,
            (false, _, true) => 1,
            _ => 2,
        };

        self.t_current = self.t_max[axis];
        self.current_voxel.0[axis] += self.step[axis];
        self.t_max[axis] += self.t_delta[axis];
    }

    /// The current voxel position. Changes on every call of `step`.
    #[inline]
    pub fn current_voxel(&self) -> Point3i {
        self.current_voxel
    }

    /// The ray parameter where the ray entered the current voxel. Zero for the starting voxel.
    #[inline]
    pub fn current_t(&self) -> f32 {
        self.t_current
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

    fn walk(start: Point3f, velocity: Point3f, steps: usize) -> Vec<(Point3i, f32)> {
        let mut traversal = GridRayTraversal3::new(start, velocity);
        let mut visited = Vec::with_capacity(steps);
        for _ in 0..steps {
            visited.push((traversal.current_voxel(), traversal.current_t()));
            traversal.step();
        }

        visited
    }

    #[test]
    fn axis_aligned_ray_enters_at_half_voxel_offsets() {
        let visited = walk(Point3f::fill(0.5), PointN([1.0, 0.0, 0.0]), 4);

        assert_eq!(
            visited,
            vec![
                (PointN([0, 0, 0]), 0.0),
                (PointN([1, 0, 0]), 0.5),
                (PointN([2, 0, 0]), 1.5),
                (PointN([3, 0, 0]), 2.5),
            ]
        );
    }

    #[test]
    fn diagonal_ray_visits_face_adjacent_voxels() {
        let voxels: Vec<Point3i> = walk(Point3f::fill(0.5), PointN([1.0, -2.0, 3.0]), 10)
            .into_iter()
            .map(|(v, _)| v)
            .collect();

        assert_eq!(
            voxels,
            vec![
                PointN([0, 0, 0]),
                PointN([0, 0, 1]),
                PointN([0, -1, 1]),
                PointN([0, -1, 2]),
                PointN([1, -1, 2]),
                PointN([1, -2, 2]),
                PointN([1, -2, 3]),
                PointN([1, -2, 4]),
                PointN([1, -3, 4]),
                PointN([2, -3, 4]),
            ]
        );
        for pair in voxels.windows(2) {
            let d = pair[1] - pair[0];
            assert_eq!(d.x().abs() + d.y().abs() + d.z().abs(), 1);
        }
    }

    #[test]
    fn negative_start_floors_into_correct_voxel() {
        let visited = walk(PointN([-0.5, 0.25, 0.25]), PointN([-1.0, 0.0, 0.0]), 2);

        assert_eq!(visited, vec![(PointN([-1, 0, 0]), 0.0), (PointN([-2, 0, 0]), 0.5)]);
    }
}
