//! Mesh assets and surface sampling.
//!
//! A [`MeshAsset`] owns an interleaved vertex buffer described by a
//! [`VertexLayout`]. Layouts differ between assets; only a float3 position
//! channel is mandatory. Decoration placement additionally needs normals, and
//! decodes them once into a typed `(position, normal)` array that every
//! segment sharing the asset reuses.

use std::sync::OnceLock;

use glam::Vec3;
use rand::Rng;

use crate::error::MeshError;

/// What a vertex element carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexSemantic {
    Position,
    Normal,
    TexCoord,
    Color,
    Tangent,
}

/// Storage type of a vertex element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Float2,
    Float3,
    Float4,
}

impl ElementKind {
    /// Size in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementKind::Float2 => 8,
            ElementKind::Float3 => 12,
            ElementKind::Float4 => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexElement {
    pub semantic: VertexSemantic,
    pub kind: ElementKind,
    /// Byte offset from the start of the vertex.
    pub offset: usize,
}

/// Describes how one vertex is laid out in a raw buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    elements: Vec<VertexElement>,
    stride: usize,
}

impl VertexLayout {
    pub fn new(elements: Vec<VertexElement>, stride: usize) -> Self {
        Self { elements, stride }
    }

    /// Tightly packed layout with channels in the given order.
    pub fn interleaved(channels: &[(VertexSemantic, ElementKind)]) -> Self {
        let mut offset = 0;
        let elements = channels
            .iter()
            .map(|&(semantic, kind)| {
                let element = VertexElement {
                    semantic,
                    kind,
                    offset,
                };
                offset += kind.size();
                element
            })
            .collect();
        Self {
            elements,
            stride: offset,
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    /// Byte offset of the first element matching both semantic and kind.
    pub fn offset_of(&self, semantic: VertexSemantic, kind: ElementKind) -> Option<usize> {
        self.elements
            .iter()
            .find(|e| e.semantic == semantic && e.kind == kind)
            .map(|e| e.offset)
    }
}

/// Untyped interleaved vertex data plus the layout that explains it.
#[derive(Debug, Clone)]
pub struct RawVertexBuffer {
    pub layout: VertexLayout,
    pub data: Vec<u8>,
}

impl RawVertexBuffer {
    pub fn new(layout: VertexLayout, data: Vec<u8>) -> Self {
        Self { layout, data }
    }

    /// Pack `floats` (already interleaved in layout order) into a byte buffer.
    pub fn from_floats(layout: VertexLayout, floats: &[f32]) -> Self {
        Self {
            layout,
            data: bytemuck::cast_slice(floats).to_vec(),
        }
    }

    fn vertex_count(&self) -> usize {
        match self.layout.stride {
            0 => 0,
            stride => self.data.len() / stride,
        }
    }

    /// Caller guarantees `vertex < vertex_count()` and that the element fits in the stride.
    fn read_vec3(&self, vertex: usize, offset: usize) -> Vec3 {
        let start = vertex * self.layout.stride + offset;
        let raw: [f32; 3] = bytemuck::pod_read_unaligned(&self.data[start..start + 12]);
        Vec3::from_array(raw)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// One decoded surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub position: Vec3,
    pub normal: Vec3,
}

/// An immutable mesh shared by every segment or obstacle that uses it.
#[derive(Debug)]
pub struct MeshAsset {
    name: String,
    buffer: RawVertexBuffer,
    indices: Vec<u32>,
    bounds: Aabb,
    position_offset: usize,
    samples: OnceLock<Result<Vec<SurfaceSample>, MeshError>>,
}

impl MeshAsset {
    /// Validate a raw buffer and wrap it as an asset.
    ///
    /// An empty index list means the vertices form a plain triangle list.
    pub fn new(
        name: impl Into<String>,
        buffer: RawVertexBuffer,
        indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        let name = name.into();
        let stride = buffer.layout.stride;
        if stride == 0 {
            return Err(MeshError::ZeroStride { mesh: name });
        }
        if buffer.data.len() % stride != 0 {
            return Err(MeshError::RaggedBuffer {
                mesh: name,
                len: buffer.data.len(),
                stride,
            });
        }
        let count = buffer.vertex_count();
        if count == 0 {
            return Err(MeshError::Empty { mesh: name });
        }
        if let Some(bad) = buffer
            .layout
            .elements
            .iter()
            .find(|e| e.offset + e.kind.size() > stride)
        {
            return Err(MeshError::ElementOutOfBounds {
                mesh: name,
                semantic: bad.semantic,
                offset: bad.offset,
                stride,
            });
        }
        let Some(position_offset) = buffer
            .layout
            .offset_of(VertexSemantic::Position, ElementKind::Float3)
        else {
            return Err(MeshError::MissingChannel {
                mesh: name,
                semantic: VertexSemantic::Position,
            });
        };
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= count) {
            return Err(MeshError::IndexOutOfRange {
                mesh: name,
                index,
                count,
            });
        }

        let bounds = Aabb::from_points((0..count).map(|i| buffer.read_vec3(i, position_offset)))
            .unwrap_or(Aabb {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            });

        Ok(Self {
            name,
            buffer,
            indices,
            bounds,
            position_offset,
            samples: OnceLock::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Always at least one.
    pub fn vertex_count(&self) -> usize {
        self.buffer.vertex_count()
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.buffer.layout
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn bounding_size(&self) -> Vec3 {
        self.bounds.size()
    }

    /// Vertex positions only. Works for every valid asset, normals or not.
    pub fn positions(&self) -> Vec<Vec3> {
        (0..self.vertex_count())
            .map(|i| self.buffer.read_vec3(i, self.position_offset))
            .collect()
    }

    /// Triangles as index triples. Trailing indices that do not form a full triangle are dropped.
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        if self.indices.is_empty() {
            let count = self.vertex_count() as u32;
            (0..count / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]).collect()
        } else {
            self.indices
                .chunks_exact(3)
                .map(|tri| [tri[0], tri[1], tri[2]])
                .collect()
        }
    }

    /// Typed view over `(position, normal)` pairs, decoded on first call and cached.
    pub fn decode(&self) -> Result<VertexView<'_>, MeshError> {
        match self.samples.get_or_init(|| self.decode_samples()) {
            Ok(samples) => Ok(VertexView { samples }),
            Err(err) => Err(err.clone()),
        }
    }

    fn decode_samples(&self) -> Result<Vec<SurfaceSample>, MeshError> {
        let normal_offset = self
            .buffer
            .layout
            .offset_of(VertexSemantic::Normal, ElementKind::Float3)
            .ok_or_else(|| MeshError::MissingChannel {
                mesh: self.name.clone(),
                semantic: VertexSemantic::Normal,
            })?;

        Ok((0..self.vertex_count())
            .map(|i| SurfaceSample {
                position: self.buffer.read_vec3(i, self.position_offset),
                normal: self.buffer.read_vec3(i, normal_offset),
            })
            .collect())
    }
}

/// Borrowed, typed access to a decoded mesh. Never empty.
#[derive(Debug, Clone, Copy)]
pub struct VertexView<'a> {
    samples: &'a [SurfaceSample],
}

impl<'a> VertexView<'a> {
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// Sample at `index`, wrapped into range. Negative indices count back from the end.
    pub fn at(&self, index: i64) -> SurfaceSample {
        let n = self.samples.len() as i64;
        self.samples[index.rem_euclid(n) as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a SurfaceSample> {
        self.samples.iter()
    }

    /// `divisor` evenly spaced samples starting at index 0.
    pub fn stride_sample(&self, divisor: usize) -> Vec<SurfaceSample> {
        let count = self.samples.len();
        (0..divisor)
            .map(|i| self.samples[i * count / divisor])
            .collect()
    }

    /// `n` samples drawn uniformly with replacement.
    pub fn random_sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<SurfaceSample> {
        let count = self.samples.len();
        (0..n).map(|_| self.samples[rng.gen_range(0..count)]).collect()
    }
}

/// Decode `mesh` into a typed view.
pub fn decode(mesh: &MeshAsset) -> Result<VertexView<'_>, MeshError> {
    mesh.decode()
}

/// `divisor` evenly spaced samples of `mesh`, starting at vertex 0.
pub fn stride_sample(mesh: &MeshAsset, divisor: usize) -> Result<Vec<SurfaceSample>, MeshError> {
    Ok(mesh.decode()?.stride_sample(divisor))
}

/// `n` random samples of `mesh`, with replacement.
pub fn random_sample<R: Rng + ?Sized>(
    mesh: &MeshAsset,
    n: usize,
    rng: &mut R,
) -> Result<Vec<SurfaceSample>, MeshError> {
    Ok(mesh.decode()?.random_sample(n, rng))
}
