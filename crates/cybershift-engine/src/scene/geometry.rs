use std::collections::HashSet;
use std::f32::consts::{FRAC_PI_2, TAU};
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a geometry's vertex data; GPU buffers are cached per id.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2  // uv
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Indexed triangle mesh with a matching line-list index set for wireframes.
#[derive(Debug)]
pub struct Geometry {
    id: GeometryId,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    edges: Vec<u32>,
    /// Set for planes; raycasts use it to turn hits into UVs.
    plane_size: Option<(f32, f32)>,
}

impl Geometry {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let edges = wireframe_indices(&indices);
        Self {
            id: GeometryId(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed)),
            vertices,
            indices,
            edges,
            plane_size: None,
        }
    }

    /// Plane in the XY plane facing +Z, centred on the origin.
    ///
    /// Vertices run row by row from the top-left; `uv` is `(0, 1)` at the top-left
    /// and `(1, 0)` at the bottom-right.
    pub fn plane(width: f32, height: f32, segments_x: u32, segments_y: u32) -> Self {
        let gx = segments_x.max(1);
        let gy = segments_y.max(1);
        let (half_w, half_h) = (width * 0.5, height * 0.5);

        let mut vertices = Vec::with_capacity(((gx + 1) * (gy + 1)) as usize);
        for iy in 0..=gy {
            let y = iy as f32 / gy as f32 * height - half_h;
            for ix in 0..=gx {
                let x = ix as f32 / gx as f32 * width - half_w;
                vertices.push(Vertex {
                    position: [x, -y, 0.0],
                    normal: [0.0, 0.0, 1.0],
                    uv: [ix as f32 / gx as f32, 1.0 - iy as f32 / gy as f32],
                });
            }
        }

        let mut indices = Vec::with_capacity((gx * gy * 6) as usize);
        let row = gx + 1;
        for iy in 0..gy {
            for ix in 0..gx {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = (ix + 1) + row * (iy + 1);
                let d = (ix + 1) + row * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        let mut g = Self::new(vertices, indices);
        g.plane_size = Some((width, height));
        g
    }

    /// Capsule along +Y: a cylinder of `length` capped by two hemispheres of `radius`.
    pub fn capsule(radius: f32, length: f32, cap_segments: u32, radial_segments: u32) -> Self {
        let caps = cap_segments.max(1);
        let radial = radial_segments.max(3);
        let half = length * 0.5;

        // Profile from the bottom pole to the top pole: (ring radius, y, normal angle).
        let mut profile = Vec::with_capacity((caps * 2 + 2) as usize);
        for i in 0..=caps {
            let a = -FRAC_PI_2 + FRAC_PI_2 * i as f32 / caps as f32;
            profile.push((radius * a.cos(), -half + radius * a.sin(), a));
        }
        for i in 0..=caps {
            let a = FRAC_PI_2 * i as f32 / caps as f32;
            profile.push((radius * a.cos(), half + radius * a.sin(), a));
        }

        let rings = profile.len() as u32;
        let mut vertices = Vec::with_capacity((rings * (radial + 1)) as usize);
        for (k, &(rho, y, a)) in profile.iter().enumerate() {
            let v = k as f32 / (rings - 1) as f32;
            for j in 0..=radial {
                let theta = TAU * j as f32 / radial as f32;
                let (s, c) = theta.sin_cos();
                vertices.push(Vertex {
                    position: [rho * c, y, rho * s],
                    normal: [a.cos() * c, a.sin(), a.cos() * s],
                    uv: [j as f32 / radial as f32, v],
                });
            }
        }

        let mut indices = Vec::with_capacity(((rings - 1) * radial * 6) as usize);
        let row = radial + 1;
        for k in 0..rings - 1 {
            for j in 0..radial {
                let a = k * row + j;
                let b = k * row + j + 1;
                let c = (k + 1) * row + j + 1;
                let d = (k + 1) * row + j;
                // Counter-clockwise seen from outside.
                indices.extend_from_slice(&[a, d, c, a, c, b]);
            }
        }

        Self::new(vertices, indices)
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Line-list indices covering every triangle edge once.
    pub fn edges(&self) -> &[u32] {
        &self.edges
    }

    pub fn plane_size(&self) -> Option<(f32, f32)> {
        self.plane_size
    }
}

/// Unique undirected edges of a triangle list, as a line list.
pub fn wireframe_indices(triangles: &[u32]) -> Vec<u32> {
    let mut seen = HashSet::with_capacity(triangles.len());
    let mut lines = Vec::with_capacity(triangles.len() * 2);
    for tri in triangles.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let key = (a.min(b), a.max(b));
            if a != b && seen.insert(key) {
                lines.extend_from_slice(&[a, b]);
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    // ── plane ─────────────────────────────────────────────────────────────

    #[test]
    fn plane_counts_and_corner_uvs() {
        let g = Geometry::plane(14.0, 10.0, 80, 60);
        assert_eq!(g.vertices().len(), 81 * 61);
        assert_eq!(g.indices().len(), 80 * 60 * 6);

        let first = g.vertices()[0];
        assert_eq!(first.position, [-7.0, 5.0, 0.0]);
        assert_eq!(first.uv, [0.0, 1.0]);

        let last = g.vertices()[g.vertices().len() - 1];
        assert_eq!(last.position, [7.0, -5.0, 0.0]);
        assert_eq!(last.uv, [1.0, 0.0]);
        assert_eq!(g.plane_size(), Some((14.0, 10.0)));
    }

    #[test]
    fn plane_triangles_face_positive_z() {
        let g = Geometry::plane(2.0, 2.0, 1, 1);
        let v = |i: u32| Vec3::from(g.vertices()[i as usize].position);
        for tri in g.indices().chunks_exact(3) {
            let n = (v(tri[1]) - v(tri[0])).cross(v(tri[2]) - v(tri[0]));
            assert!(n.z > 0.0);
        }
    }

    // ── capsule ───────────────────────────────────────────────────────────

    #[test]
    fn capsule_spans_length_plus_caps() {
        let g = Geometry::capsule(0.8, 2.0, 8, 16);
        let ys: Vec<f32> = g.vertices().iter().map(|v| v.position[1]).collect();
        let max = ys.iter().cloned().fold(f32::MIN, f32::max);
        let min = ys.iter().cloned().fold(f32::MAX, f32::min);
        assert!((max - 1.8).abs() < 1e-5);
        assert!((min + 1.8).abs() < 1e-5);
    }

    #[test]
    fn capsule_triangles_wind_outward() {
        let g = Geometry::capsule(1.0, 1.0, 4, 12);
        let v = |i: u32| Vec3::from(g.vertices()[i as usize].position);
        let mut outward = 0;
        let mut total = 0;
        for tri in g.indices().chunks_exact(3) {
            let n = (v(tri[1]) - v(tri[0])).cross(v(tri[2]) - v(tri[0]));
            if n.length_squared() < 1e-12 {
                continue; // degenerate at the poles
            }
            let centroid = (v(tri[0]) + v(tri[1]) + v(tri[2])) / 3.0;
            total += 1;
            if n.dot(centroid) > 0.0 {
                outward += 1;
            }
        }
        assert_eq!(outward, total);
    }

    // ── wireframe ─────────────────────────────────────────────────────────

    #[test]
    fn shared_edges_are_emitted_once() {
        // Two triangles sharing the 1-2 edge: 5 unique edges.
        let lines = wireframe_indices(&[0, 1, 2, 2, 1, 3]);
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn geometry_ids_are_unique() {
        let a = Geometry::plane(1.0, 1.0, 1, 1);
        let b = Geometry::plane(1.0, 1.0, 1, 1);
        assert_ne!(a.id(), b.id());
    }
}
