use sculpt_blocks_core::prelude::*;
use sculpt_blocks_storage::prelude::*;

/// A cube buffer of `edge_length` voxels whose SDF channel holds a sphere centered in the buffer. Returns the buffer and the
/// sphere radius.
pub fn sphere_sdf_buffer(edge_length: i32) -> (VoxelBuffer, i32) {
    let radius = edge_length / 2 - 1;
    let center = Point3f::fill(edge_length as f32 / 2.0);
    let mut buffer = VoxelBuffer::new(Point3i::fill(edge_length));
    for p in buffer.extent().iter_points() {
        let d = (Point3f::from(p).distance(&center) - radius as f32) / radius as f32;
        buffer.set_voxel_f(d, p, ChannelId::Sdf);
    }

    (buffer, radius)
}

/// A map with block size `2^block_size_po2` where every block intersecting `area` is loaded and empty.
pub fn loaded_map(block_size_po2: u32, area: &Extent3i) -> VoxelDataMap {
    let mut map = VoxelDataMap::create(block_size_po2, 0).unwrap();
    let block_shape = Point3i::fill(map.block_size());
    for bpos in map.block_range(area).iter_points() {
        let buffer = VoxelBuffer::with_format(block_shape, map.format());
        map.set_block_buffer(bpos, buffer).unwrap();
    }

    map
}

/// Writes a solid box into the SDF channel of `map`: -1 inside `solid`, untouched elsewhere.
pub fn fill_solid(map: &mut VoxelDataMap, solid: &Extent3i) {
    for p in solid.iter_points() {
        map.set_voxel_f(-1.0, p, ChannelId::Sdf);
    }
}

/// Counts voxels of `area` whose SDF is negative.
pub fn count_solid(map: &VoxelDataMap, area: &Extent3i) -> usize {
    area.iter_points()
        .filter(|p| map.get_voxel_f(*p, ChannelId::Sdf) < 0.0)
        .count()
}
