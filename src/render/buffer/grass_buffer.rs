//! GPU buffers consumed by the grass draw

use wgpu::util::{DeviceExt, DrawIndirectArgs};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::grass::instance::GrassInstance;
use crate::render::draw::GrassMesh;

const INDIRECT_ARGS_SIZE: u64 = std::mem::size_of::<DrawIndirectArgs>() as u64;

/// Mesh topology, instance storage and the indirect-args buffer for one
/// grass renderer, bound as a single group for the vertex stage:
/// binding 0 = triangle indices, 1 = UVs, 2 = instances.
pub struct GrassDrawBuffers {
    triangles: wgpu::Buffer,
    uvs: wgpu::Buffer,
    instances: wgpu::Buffer,
    indirect: wgpu::Buffer,
    staging: wgpu::Buffer,
    capacity: u32,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GrassDrawBuffers {
    /// Allocate buffers for up to `capacity` instances
    pub fn new(device: &wgpu::Device, mesh: &GrassMesh, capacity: u32) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::config("grass draw buffers need a non-zero instance capacity"));
        }

        let triangles = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grass_triangles"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let uvs = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grass_uvs"),
            contents: bytemuck::cast_slice(&mesh.uv_data()),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let instances = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_instances"),
            size: capacity as u64 * std::mem::size_of::<GrassInstance>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let indirect = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_indirect_args"),
            size: INDIRECT_ARGS_SIZE,
            usage: wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grass_indirect_staging"),
            size: INDIRECT_ARGS_SIZE,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grass_draw_bind_group_layout"),
            entries: &[storage_entry(0), storage_entry(1), storage_entry(2)],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grass_draw_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: triangles.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: uvs.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: instances.as_entire_binding(),
                },
            ],
        });

        log::info!(
            "Grass draw buffers: {} instances ({:.1} MB), {} mesh indices",
            capacity,
            (capacity as u64 * std::mem::size_of::<GrassInstance>() as u64) as f64 / (1024.0 * 1024.0),
            mesh.index_count()
        );

        Ok(Self {
            triangles,
            uvs,
            instances,
            indirect,
            staging,
            capacity,
            bind_group_layout,
            bind_group,
        })
    }

    /// Upload this frame's instances and draw arguments. Instances beyond
    /// capacity are not uploaded and the instance count is clamped.
    pub fn upload(&self, queue: &wgpu::Queue, instances: &[GrassInstance], args: DrawIndirectArgs) {
        let count = instances.len().min(self.capacity as usize);
        if count < instances.len() {
            log::warn!(
                "Grass upload truncated: {} instances, capacity {}",
                instances.len(),
                self.capacity
            );
        }
        if count > 0 {
            queue.write_buffer(&self.instances, 0, bytemuck::cast_slice(&instances[..count]));
        }
        let args = DrawIndirectArgs {
            instance_count: args.instance_count.min(count as u32),
            ..args
        };
        queue.write_buffer(&self.indirect, 0, args.as_bytes());
    }

    /// Record the indirect draw. The caller has set the pipeline and any
    /// other bind groups.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, group: u32) {
        pass.set_bind_group(group, &self.bind_group, &[]);
        pass.draw_indirect(&self.indirect, 0);
    }

    /// Read the indirect arguments back from the GPU (blocking).
    pub fn read_args(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<[u32; 4]> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("grass_args_readback"),
        });
        encoder.copy_buffer_to_buffer(&self.indirect, 0, &self.staging, 0, INDIRECT_ARGS_SIZE);
        queue.submit(Some(encoder.finish()));

        let slice = self.staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait { submission_index: None, timeout: None })
            .map_err(|e| Error::Gpu(format!("poll before args readback failed: {}", e)))?;

        rx.recv()
            .map_err(|e| Error::Gpu(e.to_string()))?
            .map_err(|e| Error::Gpu(e.to_string()))?;
        let data = slice.get_mapped_range();
        let words: &[u32] = bytemuck::cast_slice(&data[..INDIRECT_ARGS_SIZE as usize]);
        let args = [words[0], words[1], words[2], words[3]];
        drop(data);
        self.staging.unmap();
        Ok(args)
    }

    /// Maximum instances per draw
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn triangle_buffer(&self) -> &wgpu::Buffer {
        &self.triangles
    }

    pub fn uv_buffer(&self) -> &wgpu::Buffer {
        &self.uvs
    }

    pub fn instance_buffer(&self) -> &wgpu::Buffer {
        &self.instances
    }

    pub fn indirect_buffer(&self) -> &wgpu::Buffer {
        &self.indirect
    }
}
