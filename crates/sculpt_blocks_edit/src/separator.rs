//! Detaching floating chunks of matter from a volume.
//!
//! After an edit, some pieces of terrain may no longer be connected to anything. Within a search box, every connected region of
//! solid voxels that doesn't touch the box's border is considered floating. Each one is extracted into its own padded buffer,
//! erased from the volume, and handed to a mesher and physics engine to become a rigid body.
//!
//! Regions touching the border are assumed to be attached to the rest of the world, so the search box must be larger than the
//! pieces you expect to fall off.

use crate::{BoxError, EditBackend, EditError, IslandFinder, VoxelTool};

use sculpt_blocks_core::prelude::*;
use sculpt_blocks_storage::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct SeparatorConfig {
    /// Empty voxels added around each chunk so its mesh is closed.
    pub padding: i32,
    /// Seconds a new body stays kinematic before it starts simulating.
    pub settle_delay: f32,
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        Self {
            padding: 2,
            settle_delay: 0.2,
        }
    }
}

/// A connected region of matter that was not attached to the border of the search box.
#[derive(Clone, Debug)]
pub struct FloatingChunk {
    /// A copy of all channels around the region, with everything but the region itself emptied on the SDF channel.
    pub voxels: VoxelBuffer,
    /// Volume coordinates of `voxels`' origin.
    pub world_pos: Point3i,
    pub label: u8,
    /// Tight bounds of the region relative to the search box.
    pub local_bounds: Extent3i,
}

/// Finds the floating chunks within `world_box` without modifying the volume.
///
/// `world_box` padded by `config.padding` must be editable, otherwise this returns `EditError::AreaNotEditable`.
pub fn find_floating_chunks<B: EditBackend>(
    tool: &VoxelTool<B>,
    world_box: &Extent3i,
    config: &SeparatorConfig,
) -> Result<Vec<FloatingChunk>, EditError> {
    let padded_box = world_box.padded(config.padding);
    if !tool.is_area_editable(&padded_box) {
        tracing::debug!("Area {:?} not editable, not separating chunks", padded_box);
        return Err(EditError::AreaNotEditable(padded_box));
    }

    let source = {
        let span = tracing::info_span!("copy");
        let _trace_guard = span.enter();

        let mut source = VoxelBuffer::new(world_box.shape);
        tool.copy(world_box.minimum, &mut source, ChannelId::Sdf.mask_bit())?;

        source
    };
    let local_extent = source.extent();

    let mut labels = vec![0; local_extent.num_points()];
    let label_count = {
        let span = tracing::info_span!("ccl_scan");
        let _trace_guard = span.enter();

        IslandFinder::default().scan_3d(
            &local_extent,
            |p| source.get_voxel_f(p, ChannelId::Sdf) < 0.0,
            &mut labels,
        )
    };

    let floating_bounds = {
        let span = tracing::info_span!("bounds");
        let _trace_guard = span.enter();

        let mut bounds: Vec<Option<(Point3i, Point3i)>> = vec![None; label_count as usize + 1];
        for p in local_extent.iter_points() {
            let label = labels[local_extent.linear_index(p)];
            if label == 0 {
                continue;
            }
            let b = &mut bounds[label as usize];
            *b = Some(match *b {
                Some((min, max)) => (min.meet(&p), max.join(&p)),
                None => (p, p),
            });
        }

        let local_max = local_extent.max();
        bounds
            .into_iter()
            .enumerate()
            .filter_map(|(label, b)| b.map(|(min, max)| (label as u8, min, max)))
            .filter(|(_, min, max)| {
                // Touching the border means attached to whatever lies outside.
                (0..3).all(|i| min.0[i] > 0 && max.0[i] < local_max.0[i])
            })
            .collect::<Vec<_>>()
    };

    let span = tracing::info_span!("extraction");
    let _trace_guard = span.enter();

    let mut chunks = Vec::with_capacity(floating_bounds.len());
    for (label, min, max) in floating_bounds.into_iter() {
        let inner = Extent3i::from_min_and_max(min, max);
        let extraction = inner.padded(config.padding);
        let world_pos = world_box.minimum + extraction.minimum;

        let mut voxels = VoxelBuffer::new(extraction.shape);
        tool.copy(world_pos, &mut voxels, u8::MAX)?;

        extraction.difference(&inner, |border| {
            voxels.fill_area_f(1.0, &(border - extraction.minimum), ChannelId::Sdf)
        });
        for p in inner.iter_points() {
            let other = labels[local_extent.linear_index(p)];
            if other != 0 && other != label {
                voxels.set_voxel_f(1.0, p - extraction.minimum, ChannelId::Sdf);
            }
        }

        chunks.push(FloatingChunk {
            voxels,
            world_pos,
            label,
            local_bounds: inner,
        });
    }
    tracing::debug!("Found {} floating chunks in {:?}", chunks.len(), world_box);

    Ok(chunks)
}

/// Maps volume coordinates into the world: `world = translation + voxel * scale`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct VolumeTransform {
    pub translation: Point3f,
    pub scale: f32,
}

impl Default for VolumeTransform {
    fn default() -> Self {
        Self {
            translation: Point3f::ZERO,
            scale: 1.0,
        }
    }
}

impl VolumeTransform {
    #[inline]
    pub fn transform_point(&self, voxel: Point3f) -> Point3f {
        self.translation + voxel * self.scale
    }
}

/// Turns an extracted chunk into a renderable mesh.
pub trait MeshBuilder {
    type Mesh;

    /// Returns `None` if the chunk produces no geometry.
    fn build_mesh(&mut self, voxels: &VoxelBuffer) -> Option<Self::Mesh>;
}

/// Everything needed to create the rigid body of a floating chunk.
#[derive(Clone, Debug)]
pub struct BodyDescriptor<M, S> {
    pub mesh: M,
    pub shape: S,
    /// World position of the body's origin, the center of the chunk.
    pub position: Point3f,
    pub scale: f32,
    /// Where the mesh and collision shape sit relative to the body, in voxels.
    pub mesh_offset: Point3f,
}

/// The physics engine side of chunk separation.
pub trait BodyFactory<M> {
    type Shape;
    type Body: Clone;

    fn create_convex_shape(&mut self, mesh: &M) -> Result<Self::Shape, BoxError>;

    /// Adds a body that does not move on its own yet.
    fn spawn_kinematic_body(&mut self, desc: BodyDescriptor<M, Self::Shape>) -> Self::Body;

    /// Lets `body` be moved by the simulation.
    fn set_dynamic(&mut self, body: &Self::Body);
}

/// Bodies waiting to be switched from kinematic to dynamic, each with its own remaining delay in seconds.
pub struct BodyActivationQueue<T> {
    pending: Vec<(T, f32)>,
}

impl<T> Default for BodyActivationQueue<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> BodyActivationQueue<T> {
    pub fn push(&mut self, body: T, delay: f32) {
        self.pending.push((body, delay));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advances time by `dt` seconds and removes the bodies whose delay has run out, in the order they were pushed.
    pub fn tick(&mut self, dt: f32) -> Vec<T> {
        for (_, delay) in self.pending.iter_mut() {
            *delay -= dt;
        }
        let (due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|(_, delay)| *delay <= 0.0);
        self.pending = pending;

        due.into_iter().map(|(body, _)| body).collect()
    }

    /// Like `tick`, and also makes the due bodies dynamic.
    pub fn activate_due<M, F>(&mut self, dt: f32, factory: &mut F)
    where
        F: BodyFactory<M, Body = T>,
    {
        for body in self.tick(dt) {
            factory.set_dynamic(&body);
        }
    }
}

/// Finds the floating chunks within `world_box`, erases them from the volume and spawns a kinematic body for each. The new
/// bodies are queued in `activation` to become dynamic after `config.settle_delay`.
///
/// Chunks without a mesh or whose collision shape fails are erased but get no body. Chunks that could not be erased stay in the
/// volume and get no body either. Returns the spawned bodies.
pub fn separate_floating_chunks<B, MB, BF>(
    tool: &mut VoxelTool<B>,
    world_box: &Extent3i,
    transform: &VolumeTransform,
    config: &SeparatorConfig,
    mesher: &mut MB,
    bodies: &mut BF,
    activation: &mut BodyActivationQueue<BF::Body>,
) -> Result<Vec<BF::Body>, EditError>
where
    B: EditBackend,
    MB: MeshBuilder,
    BF: BodyFactory<MB::Mesh>,
{
    let mut chunks = find_floating_chunks(tool, world_box, config)?;

    {
        let span = tracing::info_span!("erasing");
        let _trace_guard = span.enter();

        chunks.retain(|chunk| {
            let erased = tool.sdf_stamp_erase(&chunk.voxels, chunk.world_pos);
            if !erased {
                tracing::warn!(
                    "Could not erase floating chunk {} at {:?}, leaving it in place",
                    chunk.label,
                    chunk.world_pos
                );
            }

            erased
        });
    }

    let span = tracing::info_span!("instancing");
    let _trace_guard = span.enter();

    let mut spawned = Vec::with_capacity(chunks.len());
    for chunk in chunks.iter() {
        let mesh = match mesher.build_mesh(&chunk.voxels) {
            Some(mesh) => mesh,
            None => {
                tracing::warn!("Floating chunk {} at {:?} has no mesh", chunk.label, chunk.world_pos);
                continue;
            }
        };
        let shape = match bodies.create_convex_shape(&mesh) {
            Ok(shape) => shape,
            Err(e) => {
                tracing::warn!(
                    "Could not create a collision shape for floating chunk {} at {:?}: {}",
                    chunk.label,
                    chunk.world_pos,
                    e
                );
                continue;
            }
        };

        let half_size = Point3f::from(chunk.voxels.size()) * 0.5;
        let body = bodies.spawn_kinematic_body(BodyDescriptor {
            mesh,
            shape,
            position: transform.transform_point(Point3f::from(chunk.world_pos) + half_size),
            scale: transform.scale,
            mesh_offset: -half_size,
        });
        activation.push(body.clone(), config.settle_delay);
        spawned.push(body);
    }

    Ok(spawned)
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
