//! Vertex formats and GPU buffers for each kind of scene geometry.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use orrery_scene::{Geometry, MeshData, PointCloud};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl SceneVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SceneVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Per-instance model matrix, one column per attribute.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct InstanceTransform {
    pub columns: [[f32; 4]; 4],
}

impl InstanceTransform {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
            3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceTransform>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
}

impl LineVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// One point sprite. Each instance expands to a camera-facing quad.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub size: f32,
}

impl PointInstance {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Vertices of a point sprite quad, drawn as two triangles.
pub const POINT_QUAD_VERTICES: u32 = 6;

pub fn mesh_vertices(mesh: &MeshData) -> Vec<SceneVertex> {
    mesh.positions
        .iter()
        .zip(&mesh.normals)
        .zip(&mesh.uvs)
        .map(|((&position, &normal), &uv)| SceneVertex {
            position,
            normal,
            uv,
        })
        .collect()
}

/// Line strip vertices for a closed loop; the first point is repeated at the
/// end unless the input already closes itself.
pub fn line_vertices(points: &[Vec3]) -> Vec<LineVertex> {
    let mut vertices: Vec<LineVertex> = points
        .iter()
        .map(|p| LineVertex {
            position: p.to_array(),
        })
        .collect();
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if points.len() > 1 && first.distance_squared(*last) > 1e-8 {
            vertices.push(LineVertex {
                position: first.to_array(),
            });
        }
    }
    vertices
}

pub fn point_instances(cloud: &PointCloud) -> Vec<PointInstance> {
    cloud
        .positions
        .iter()
        .zip(&cloud.colors)
        .zip(&cloud.sizes)
        .map(|((position, color), &size)| PointInstance {
            position: position.to_array(),
            color: color.to_array(),
            size,
        })
        .collect()
}

/// Buffers for one entity's geometry.
pub enum GpuGeometry {
    Indexed {
        vertex_buffer: wgpu::Buffer,
        index_buffer: wgpu::Buffer,
        index_count: u32,
    },
    Instanced {
        vertex_buffer: wgpu::Buffer,
        index_buffer: wgpu::Buffer,
        index_count: u32,
        instance_buffer: wgpu::Buffer,
        instance_count: u32,
    },
    LineStrip {
        vertex_buffer: wgpu::Buffer,
        vertex_count: u32,
    },
    Points {
        instance_buffer: wgpu::Buffer,
        instance_count: u32,
    },
}

impl GpuGeometry {
    pub fn upload(device: &wgpu::Device, label: &str, geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Mesh(mesh) => {
                let (vertex_buffer, index_buffer) = mesh_buffers(device, label, mesh);
                Self::Indexed {
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as u32,
                }
            }
            Geometry::Instanced(instanced) => {
                let (vertex_buffer, index_buffer) = mesh_buffers(device, label, &instanced.mesh);
                let transforms: Vec<InstanceTransform> = instanced
                    .instances
                    .iter()
                    .map(|m| InstanceTransform {
                        columns: m.to_cols_array_2d(),
                    })
                    .collect();
                Self::Instanced {
                    vertex_buffer,
                    index_buffer,
                    index_count: instanced.mesh.indices.len() as u32,
                    instance_buffer: buffer(device, &format!("{label}-instances"), &transforms),
                    instance_count: transforms.len() as u32,
                }
            }
            Geometry::LineLoop(points) => {
                let vertices = line_vertices(points);
                Self::LineStrip {
                    vertex_buffer: buffer(device, &format!("{label}-vertices"), &vertices),
                    vertex_count: vertices.len() as u32,
                }
            }
            Geometry::Points(cloud) => {
                let instances = point_instances(cloud);
                Self::Points {
                    instance_buffer: buffer(device, &format!("{label}-points"), &instances),
                    instance_count: instances.len() as u32,
                }
            }
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        match self {
            Self::Indexed {
                vertex_buffer,
                index_buffer,
                index_count,
            } => {
                pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..*index_count, 0, 0..1);
            }
            Self::Instanced {
                vertex_buffer,
                index_buffer,
                index_count,
                instance_buffer,
                instance_count,
            } => {
                pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, instance_buffer.slice(..));
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..*index_count, 0, 0..*instance_count);
            }
            Self::LineStrip {
                vertex_buffer,
                vertex_count,
            } => {
                pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                pass.draw(0..*vertex_count, 0..1);
            }
            Self::Points {
                instance_buffer,
                instance_count,
            } => {
                pass.set_vertex_buffer(0, instance_buffer.slice(..));
                pass.draw(0..POINT_QUAD_VERTICES, 0..*instance_count);
            }
        }
    }
}

fn mesh_buffers(device: &wgpu::Device, label: &str, mesh: &MeshData) -> (wgpu::Buffer, wgpu::Buffer) {
    let vertex_buffer = buffer(device, &format!("{label}-vertices"), &mesh_vertices(mesh));
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label}-indices")),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    (vertex_buffer, index_buffer)
}

/// Vertex buffer; empty inputs still get a minimal allocation.
fn buffer<T: Pod>(device: &wgpu::Device, label: &str, data: &[T]) -> wgpu::Buffer {
    if data.is_empty() {
        return device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<T>().max(4) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX,
            mapped_at_creation: false,
        });
    }
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::VERTEX,
    })
}
