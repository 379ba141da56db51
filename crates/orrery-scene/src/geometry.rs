//! CPU-side geometry: spheres, the asteroid icosahedron, line loops and point sets.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};

/// Indexed triangle mesh. Front faces wind counter-clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// `v` grows downward, matching image row order.
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    /// Radius of the bounding sphere around the local origin.
    pub bounding_radius: f32,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Latitude/longitude sphere with `width_segments` around and
/// `height_segments` from pole to pole.
///
/// The seam column is duplicated so UVs wrap cleanly, and pole vertices get
/// their `u` shifted half a segment so each pole triangle samples its own
/// column.
pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let row_len = (width_segments + 1) as usize;
    let capacity = row_len * (height_segments + 1) as usize;
    let mut positions = Vec::with_capacity(capacity);
    let mut normals = Vec::with_capacity(capacity);
    let mut uvs = Vec::with_capacity(capacity);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };

        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let (sin_phi, cos_phi) = (v * PI).sin_cos();
            let (sin_theta, cos_theta) = (u * TAU).sin_cos();
            let normal = Vec3::new(-cos_theta * sin_phi, cos_phi, sin_theta * sin_phi);

            positions.push((normal * radius).to_array());
            normals.push(normal.normalize_or_zero().to_array());
            uvs.push([u + u_offset, v]);
        }
    }

    let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
    let at = |ix: u32, iy: u32| iy * (width_segments + 1) + ix;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = at(ix + 1, iy);
            let b = at(ix, iy);
            let c = at(ix, iy + 1);
            let d = at(ix + 1, iy + 1);
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    MeshData {
        positions,
        normals,
        uvs,
        indices,
        bounding_radius: radius,
    }
}

/// Flat-shaded icosahedron (20 faces, no subdivision).
pub fn icosahedron(radius: f32) -> MeshData {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let corners: [Vec3; 12] = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ];
    const FACES: [[usize; 3]; 20] = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    let mut positions = Vec::with_capacity(60);
    let mut normals = Vec::with_capacity(60);
    let mut uvs = Vec::with_capacity(60);
    for face in FACES {
        let [a, b, c] = face.map(|i| corners[i].normalize() * radius);
        let normal = (b - a).cross(c - a).normalize_or_zero();
        for p in [a, b, c] {
            let dir = p / radius;
            let u = dir.z.atan2(dir.x) / TAU + 0.5;
            let v = 0.5 - dir.y.clamp(-1.0, 1.0).asin() / PI;
            positions.push(p.to_array());
            normals.push(normal.to_array());
            uvs.push([u, v]);
        }
    }

    MeshData {
        indices: (0..positions.len() as u32).collect(),
        positions,
        normals,
        uvs,
        bounding_radius: radius,
    }
}

/// Closed circle in the XZ plane sampled at `segments + 1` points.
///
/// The last point repeats the first.
pub fn circle_points(radius: f32, segments: u32) -> Vec<Vec3> {
    (0..=segments)
        .map(|i| {
            let angle = i as f32 / segments as f32 * TAU;
            Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
        })
        .collect()
}

/// Per-point attributes of a point sprite set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<Vec3>,
    /// Linear RGB.
    pub colors: Vec<Vec3>,
    pub sizes: Vec<f32>,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// One mesh drawn many times with per-instance transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct InstancedMesh {
    pub mesh: MeshData,
    pub instances: Vec<Mat4>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_vertex_and_index_counts() {
        let mesh = uv_sphere(2.0, 16, 8);
        assert_eq!(mesh.vertex_count(), 17 * 9);
        // Pole rows contribute one triangle per segment, the rest two.
        assert_eq!(mesh.triangle_count(), 16 * (8 * 2 - 2));
        let n = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn test_sphere_vertices_on_radius() {
        let mesh = uv_sphere(9.0, 32, 32);
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            let p = Vec3::from_array(*p);
            assert!((p.length() - 9.0).abs() < 1e-4, "vertex off the sphere: {p}");
            assert!((p.normalize() - Vec3::from_array(*n)).length() < 1e-4);
        }
    }

    #[test]
    fn test_sphere_faces_point_outward() {
        let mesh = uv_sphere(1.0, 12, 6);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(mesh.positions[i as usize]));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "triangle winds inward");
        }
    }

    #[test]
    fn test_sphere_top_row_maps_to_image_top() {
        let mesh = uv_sphere(1.0, 8, 4);
        assert!(mesh.positions[0][1] > 0.99);
        assert_eq!(mesh.uvs[0][1], 0.0);
    }

    #[test]
    fn test_icosahedron_is_flat_shaded() {
        let mesh = icosahedron(1.2);
        assert_eq!(mesh.triangle_count(), 20);
        assert_eq!(mesh.vertex_count(), 60);
        for tri in mesh.normals.chunks(3) {
            assert_eq!(tri[0], tri[1]);
            assert_eq!(tri[1], tri[2]);
        }
        for p in &mesh.positions {
            assert!((Vec3::from_array(*p).length() - 1.2).abs() < 1e-5);
        }
    }

    #[test]
    fn test_icosahedron_faces_point_outward() {
        let mesh = icosahedron(1.0);
        for (tri, n) in mesh.positions.chunks(3).zip(mesh.normals.chunks(3)) {
            let centroid = (Vec3::from_array(tri[0]) + Vec3::from_array(tri[1]) + Vec3::from_array(tri[2])) / 3.0;
            assert!(Vec3::from_array(n[0]).dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_circle_points_close_the_loop() {
        let points = circle_points(52.8, 256);
        assert_eq!(points.len(), 257);
        assert!((points[0] - points[256]).length() < 1e-3);
        for p in &points {
            assert!(p.y == 0.0);
            assert!((p.length() - 52.8).abs() < 1e-3);
        }
    }
}
