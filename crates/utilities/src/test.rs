use sculpt_blocks_core::prelude::*;

/// Renders the Z = `z` slice of a label grid laid out in `extent.iter_points()` order. Unlabeled voxels print as `.`, labels as
/// base-36 digits (`#` past 35). Rows go from max Y down so the picture matches a Y-up view.
pub fn label_slice(extent: &Extent3i, labels: &[u8], z: i32) -> String {
    let mut out = String::new();
    let min = extent.minimum;
    let max = extent.max();
    for y in (min.y()..=max.y()).rev() {
        for x in min.x()..=max.x() {
            let label = labels[extent.linear_index(PointN([x, y, z]))];
            let c = match label {
                0 => '.',
                l => std::char::from_digit(l as u32, 36).unwrap_or('#'),
            };
            out.push(c);
        }
        out.push('\n');
    }

    out
}
