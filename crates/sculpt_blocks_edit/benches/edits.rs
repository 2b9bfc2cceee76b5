use sculpt_blocks_core::prelude::*;
use sculpt_blocks_edit::prelude::*;
use sculpt_blocks_edit::{
    separate_floating_chunks, BodyActivationQueue, BodyDescriptor, BodyFactory, BoxError,
    MeshBuilder, VolumeTransform,
};
use sculpt_blocks_storage::prelude::*;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use utilities::data_sets::{fill_solid, loaded_map};

fn sphere_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("sphere_add");
    for radius in RADII.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(radius), radius, |b, &radius| {
            b.iter_with_setup(
                || set_up_map(radius),
                |mut map| {
                    let mut tool = VoxelTool::new(MapBackend::new(&mut map));
                    black_box(tool.do_sphere(Point3f::ZERO, radius as f32));
                },
            );
        });
    }
    group.finish();
}

fn sphere_texture_paint(c: &mut Criterion) {
    let mut group = c.benchmark_group("sphere_texture_paint");
    for radius in RADII.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(radius), radius, |b, &radius| {
            b.iter_with_setup(
                || set_up_map(radius),
                |mut map| {
                    let mut tool = VoxelTool::new(MapBackend::new(&mut map));
                    tool.set_mode(Mode::TexturePaint);
                    black_box(tool.do_sphere(Point3f::ZERO, radius as f32));
                },
            );
        });
    }
    group.finish();
}

fn box_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("box_remove");
    for radius in RADII.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(radius), radius, |b, &radius| {
            b.iter_with_setup(
                || {
                    let mut map = set_up_map(radius);
                    fill_solid(&mut map, &edit_extent(radius));
                    map
                },
                |mut map| {
                    let mut tool = VoxelTool::new(MapBackend::new(&mut map));
                    tool.set_mode(Mode::Remove);
                    black_box(tool.do_box(Point3i::fill(-radius), Point3i::fill(radius - 1)));
                },
            );
        });
    }
    group.finish();
}

fn separate_cubes(c: &mut Criterion) {
    let mut group = c.benchmark_group("separate_cubes");
    for radius in RADII.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(radius), radius, |b, &radius| {
            b.iter_with_setup(
                || {
                    let mut map = set_up_map(radius + 4);
                    // A grid of small floating cubes.
                    let cells = Extent3i::from_min_and_shape(
                        Point3i::fill(-radius / 4),
                        Point3i::fill(radius / 2),
                    );
                    for cell in cells.iter_points() {
                        let cube =
                            Extent3i::from_min_and_shape(cell * 4 + Point3i::ONES, Point3i::fill(2));
                        fill_solid(&mut map, &cube);
                    }
                    map
                },
                |mut map| {
                    let mut tool = VoxelTool::new(MapBackend::new(&mut map));
                    let mut activation = BodyActivationQueue::default();
                    let bodies = separate_floating_chunks(
                        &mut tool,
                        &edit_extent(radius),
                        &VolumeTransform::default(),
                        &SeparatorConfig::default(),
                        &mut NullMesher,
                        &mut NullPhysics,
                        &mut activation,
                    )
                    .unwrap();
                    black_box(bodies);
                },
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    sphere_add,
    sphere_texture_paint,
    box_remove,
    separate_cubes
);
criterion_main!(benches);

const RADII: [i32; 3] = [8, 16, 32];

fn edit_extent(radius: i32) -> Extent3i {
    Extent3i::from_min_and_shape(Point3i::fill(-radius), Point3i::fill(2 * radius))
}

fn set_up_map(radius: i32) -> VoxelDataMap {
    loaded_map(4, &edit_extent(radius).padded(2))
}

struct NullMesher;

impl MeshBuilder for NullMesher {
    type Mesh = ();

    fn build_mesh(&mut self, _voxels: &VoxelBuffer) -> Option<()> {
        Some(())
    }
}

struct NullPhysics;

impl BodyFactory<()> for NullPhysics {
    type Shape = ();
    type Body = ();

    fn create_convex_shape(&mut self, _mesh: &()) -> Result<(), BoxError> {
        Ok(())
    }

    fn spawn_kinematic_body(&mut self, _desc: BodyDescriptor<(), ()>) {}

    fn set_dynamic(&mut self, _body: &()) {}
}
