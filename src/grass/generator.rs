//! Per-frame blade generation over the visible chunks of a tile.
//!
//! Every visible chunk expands into a `per_chunk x per_chunk` jittered grid
//! of blades. Placement, facing and size come from an integer hash of the
//! blade's stable id, so an unchanged layout produces identical blades every
//! frame. Wind response and view offsetting integrate over time through the
//! persistent [`BladeFrameState`] of each blade.

use std::f32::consts::TAU;

use rayon::prelude::*;

use crate::compute::AppendBuffer;
use crate::core::types::{Mat3, Quat, Result, Vec2, Vec3};
use crate::math::hash_2d;
use crate::terrain::TerrainBuffer;
use crate::wind::WindSignals;
use super::config::GrassRendererData;
use super::culling::ChunkLayout;
use super::instance::{BladeFrameState, GpuGrassChunk, GrassInstance};

/// Hermite step of `x` across `range`; a degenerate range is a hard step.
fn smoothstep(range: [f32; 2], x: f32) -> f32 {
    let [lo, hi] = range;
    if hi <= lo {
        return if x >= hi { 1.0 } else { 0.0 };
    }
    let t = ((x - lo) / (hi - lo)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp_range(range: Vec2, t: f32) -> f32 {
    range.x + (range.y - range.x) * t
}

/// Frame inputs shared by every blade.
#[derive(Clone, Copy)]
pub struct BladeInputs<'a> {
    pub time: f32,
    pub camera_position: Vec3,
    pub wind: WindSignals<'a>,
    pub terrain: Option<&'a TerrainBuffer>,
}

/// Builds the instance list of one tile from its visible chunks.
pub struct InstanceGenerator {
    layout: ChunkLayout,
    instances: AppendBuffer<GrassInstance>,
    states: Vec<BladeFrameState>,
    visible: Vec<bool>,
}

impl InstanceGenerator {
    pub fn new(layout: ChunkLayout) -> Result<Self> {
        let capacity = layout.blade_capacity();
        let instances = AppendBuffer::with_capacity(capacity)?;
        log::info!(
            "Grass generator: {} chunks x {} blades, {:.1} MB instances",
            layout.chunk_count(),
            layout.blades_per_chunk(),
            (capacity * std::mem::size_of::<GrassInstance>()) as f64 / (1024.0 * 1024.0)
        );
        Ok(Self {
            layout,
            instances,
            states: vec![BladeFrameState::default(); capacity],
            visible: vec![false; layout.chunk_count() as usize],
        })
    }

    /// Regenerate the instance list for `chunks` and return its count.
    /// Blade state of chunks outside the list is left as it was.
    pub fn generate(
        &mut self,
        chunks: &AppendBuffer<GpuGrassChunk>,
        data: &GrassRendererData,
        inputs: &BladeInputs<'_>,
    ) -> u32 {
        self.instances.reset();
        self.visible.fill(false);
        for chunk in chunks.iter() {
            if let Some(flag) = self.visible.get_mut(chunk.index as usize) {
                *flag = true;
            }
        }

        let layout = &self.layout;
        let visible = &self.visible;
        let instances = &self.instances;
        self.states
            .par_chunks_mut(layout.blades_per_chunk() as usize)
            .enumerate()
            .filter(|(index, _)| visible[*index])
            .for_each(|(index, states)| {
                let index = index as u32;
                let center = layout.chunk_center(index);
                for (b, state) in states.iter_mut().enumerate() {
                    let b = b as u32;
                    let (gx, gy) = (b % layout.per_chunk, b / layout.per_chunk);
                    let id = layout.blade_id(index, gx, gy);
                    if let Some(instance) = build_blade(layout, center, gx, gy, id, state, data, inputs) {
                        instances.append(instance);
                    }
                }
            });

        if self.instances.dropped() > 0 {
            log::warn!(
                "Grass instance overflow: {} blades dropped (capacity {})",
                self.instances.dropped(),
                self.instances.capacity()
            );
        }
        self.instances.copy_count()
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    /// Instances appended by the last generate
    pub fn instances(&self) -> &AppendBuffer<GrassInstance> {
        &self.instances
    }

    /// Persistent blade state, indexed by blade id
    pub fn states(&self) -> &[BladeFrameState] {
        &self.states
    }
}

#[allow(clippy::too_many_arguments)]
fn build_blade(
    layout: &ChunkLayout,
    chunk_center: Vec3,
    gx: u32,
    gy: u32,
    id: u32,
    state: &mut BladeFrameState,
    data: &GrassRendererData,
    inputs: &BladeInputs<'_>,
) -> Option<GrassInstance> {
    let rand = |k: i32| hash_2d(id as i32, k, data.seed);

    let cell = layout.chunk_size / layout.per_chunk as f32;
    let start = -0.5 * layout.chunk_size;
    let jitter = Vec2::new(rand(0) * 2.0 - 1.0, rand(1) * 2.0 - 1.0) * data.offset_strength;
    let x = chunk_center.x + start + (gx as f32 + 0.5) * cell + jitter.x;
    let z = chunk_center.z + start + (gy as f32 + 0.5) * cell + jitter.y;

    let (y, up) = match inputs.terrain {
        Some(terrain) => {
            if !terrain.contains(x, z) {
                return None;
            }
            (terrain.height_at(x, z), terrain.normal_at(x, z))
        }
        None => (chunk_center.y, Vec3::Y),
    };
    let position = Vec3::new(x, y, z);

    let angle = data.default_angle * TAU + (rand(2) - 0.5) * TAU * data.facing_randomness;
    let facing = Vec2::new(angle.cos(), angle.sin());
    let width = lerp_range(data.width_range(), rand(3));
    let height = lerp_range(data.height_range(), rand(4));
    let phase = rand(5) * TAU;

    // Integrate wind into the blade's persistent state
    let sample = inputs.wind.sample(position).combined();
    let wind = Vec2::from_array(state.wind) * data.wind_dissipation + sample * data.wind_effect;
    state.wind = wind.to_array();

    let facing3 = Vec3::new(facing.x, 0.0, facing.y);
    let right = up.cross(facing3).normalize_or(Vec3::X);
    let forward = right.cross(up);

    if data.apply_view_offset {
        let view = (position - inputs.camera_position).normalize_or_zero();
        let view_xz = Vec2::new(view.x, view.z).normalize_or_zero();
        let right_xz = Vec2::new(right.x, right.z).normalize_or_zero();
        let alignment = right_xz.dot(view_xz);
        let side = smoothstep(data.side_view_range, alignment.abs());
        let top = smoothstep(data.top_view_range, view.y.abs());

        let target_rotation = side * data.side_view_rot_offset * alignment.signum();
        let target_tilt = top * data.top_view_rot_offset;
        let smoothing = data.offset_frame_smoothing;
        state.view_rotation += (target_rotation - state.view_rotation) * smoothing;
        state.view_tilt += (target_tilt - state.view_tilt) * smoothing;
    }

    let turn = Quat::from_axis_angle(up, state.view_rotation * TAU);
    let right = turn * right;
    let forward = turn * forward;
    let tilt = Quat::from_axis_angle(right, state.view_tilt * TAU);
    let basis = Mat3::from_cols(right, tilt * up, tilt * forward);

    // Bend curve in blade space: x along forward, y along up, unit height
    let response = 1.0 / (1.0 + data.stiffness);
    let push = wind.dot(facing) * response;
    let lean = (data.tilt + push).clamp(-1.0, 1.0);
    let end = Vec2::new(lean, (1.0 - lean * lean).sqrt());
    let flutter = (inputs.time * TAU * data.flutter + phase).sin() * wind.length() * response;
    let normal = Vec2::new(end.y, -end.x);
    let mid = end * data.bend_pos + normal * (data.bend + flutter);

    Some(GrassInstance {
        position: position.to_array(),
        rotation: basis.to_cols_array_2d(),
        bezier_mid: mid.to_array(),
        bezier_end: end.to_array(),
        wind_factor: [wind.x, wind.y, flutter],
        width,
        height,
    })
}
