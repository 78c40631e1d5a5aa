//! Indirect draw emission for generated grass.
//!
//! The grass vertex stage is vertex-pulled: it reads the mesh's triangle
//! index and UV for `vertex_index`, and the blade transform for
//! `instance_index`, so the draw is non-indexed with one vertex per mesh
//! index.

use wgpu::util::DrawIndirectArgs;

use crate::compute::AppendBuffer;
use crate::core::error::Error;
use crate::core::types::{Result, Vec2};
use crate::grass::instance::GrassInstance;

/// Blade mesh topology: triangle indices into `uvs`. Positions are
/// reconstructed in the vertex stage from the UV and the blade's curve.
#[derive(Clone, Debug, PartialEq)]
pub struct GrassMesh {
    pub indices: Vec<u32>,
    pub uvs: Vec<Vec2>,
}

impl GrassMesh {
    /// Validate and wrap mesh data
    pub fn new(indices: Vec<u32>, uvs: Vec<Vec2>) -> Result<Self> {
        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(Error::config(format!(
                "grass mesh needs a non-empty triangle list, got {} indices",
                indices.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= uvs.len()) {
            return Err(Error::config(format!(
                "grass mesh index {} out of range for {} vertices",
                bad,
                uvs.len()
            )));
        }
        Ok(Self { indices, uvs })
    }

    /// Tapered blade strip: `segments` vertex rows joined by quads, closed
    /// by a tip triangle.
    pub fn blade(segments: u32) -> Result<Self> {
        if segments == 0 {
            return Err(Error::config("grass blade needs at least one segment"));
        }
        let mut uvs = Vec::with_capacity(segments as usize * 2 + 1);
        for s in 0..segments {
            let v = s as f32 / segments as f32;
            uvs.push(Vec2::new(0.0, v));
            uvs.push(Vec2::new(1.0, v));
        }
        uvs.push(Vec2::new(0.5, 1.0));

        let mut indices = Vec::with_capacity(segments as usize * 6 + 3);
        for s in 0..segments - 1 {
            let (l0, r0, l1, r1) = (2 * s, 2 * s + 1, 2 * s + 2, 2 * s + 3);
            indices.extend_from_slice(&[l0, r0, l1, r0, r1, l1]);
        }
        let base = 2 * (segments - 1);
        indices.extend_from_slice(&[base, base + 1, 2 * segments]);

        Self::new(indices, uvs)
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// UVs in GPU layout
    pub fn uv_data(&self) -> Vec<[f32; 2]> {
        self.uvs.iter().map(|uv| uv.to_array()).collect()
    }
}

/// Turns the generated instance list into one indirect draw.
pub struct IndirectDrawEmitter {
    mesh: GrassMesh,
    instances: Vec<GrassInstance>,
    args: DrawIndirectArgs,
}

impl IndirectDrawEmitter {
    pub fn new(mesh: GrassMesh) -> Self {
        Self {
            mesh,
            instances: Vec::new(),
            args: DrawIndirectArgs {
                vertex_count: 0,
                instance_count: 0,
                first_vertex: 0,
                first_instance: 0,
            },
        }
    }

    /// Stage the generated instances and build the draw arguments:
    /// `index_count` vertices times the appended instance count.
    pub fn emit(&mut self, generated: &AppendBuffer<GrassInstance>) -> DrawIndirectArgs {
        generated.copy_to(&mut self.instances);
        self.args = DrawIndirectArgs {
            vertex_count: self.mesh.index_count(),
            instance_count: self.instances.len() as u32,
            first_vertex: 0,
            first_instance: 0,
        };
        self.args
    }

    /// Record an empty draw (nothing visible this frame)
    pub fn clear(&mut self) {
        self.instances.clear();
        self.args.instance_count = 0;
    }

    pub fn mesh(&self) -> &GrassMesh {
        &self.mesh
    }

    /// Instances staged by the last emit
    pub fn instances(&self) -> &[GrassInstance] {
        &self.instances
    }

    /// Arguments of the last emit
    pub fn args(&self) -> DrawIndirectArgs {
        self.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blade_topology() {
        let mesh = GrassMesh::blade(3).unwrap();
        assert_eq!(mesh.uvs.len(), 7);
        assert_eq!(mesh.index_count(), 15);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.uvs.len()));
        assert_eq!(*mesh.indices.last().unwrap(), 6);

        let single = GrassMesh::blade(1).unwrap();
        assert_eq!(single.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_mesh_validation() {
        assert!(GrassMesh::blade(0).is_err());
        assert!(GrassMesh::new(vec![0, 1], vec![Vec2::ZERO; 3]).is_err());
        assert!(GrassMesh::new(vec![0, 1, 5], vec![Vec2::ZERO; 3]).is_err());
    }

    #[test]
    fn test_emit_counts() {
        let mut emitter = IndirectDrawEmitter::new(GrassMesh::blade(4).unwrap());
        let mut generated = AppendBuffer::with_capacity(8).unwrap();
        for _ in 0..5 {
            generated.append(GrassInstance::default());
        }
        let args = emitter.emit(&generated);
        assert_eq!(args.vertex_count, 3 * 6 + 3);
        assert_eq!(args.instance_count, 5);
        assert_eq!(args.first_vertex, 0);
        assert_eq!(emitter.instances().len(), 5);

        generated.reset();
        let args = emitter.emit(&generated);
        assert_eq!(args.instance_count, 0);
        assert!(emitter.instances().is_empty());
    }
}
