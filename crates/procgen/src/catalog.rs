//! Asset catalog: the meshes and materials corridor generation draws from.
//!
//! The generator only ever sees an [`AssetCatalog`]. Filling one from resource
//! directories (glTF models, material files) or from procedural shapes happens
//! here, before a run starts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CatalogError, CorridorError};
use crate::mesh::{ElementKind, MeshAsset, RawVertexBuffer, VertexLayout, VertexSemantic};
use crate::shapes;

/// Opaque reference to a material resource, by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialRef(pub String);

impl MaterialRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Meshes and materials available to the corridor generator.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    pub segment_meshes: Vec<Arc<MeshAsset>>,
    pub segment_material: MaterialRef,
    pub obstacle_meshes: Vec<Arc<MeshAsset>>,
    pub obstacle_materials: Vec<MaterialRef>,
}

/// Where catalog resources live, relative to each resource root.
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    pub segment_dir: PathBuf,
    pub segment_material: String,
    pub obstacle_dir: PathBuf,
    pub obstacle_material_dir: PathBuf,
    /// Extension (without dot) of material files.
    pub material_extension: String,
}

impl Default for CatalogLayout {
    fn default() -> Self {
        Self {
            segment_dir: PathBuf::from("Models/Pipes"),
            segment_material: "Materials/RustyMetalMaterial.xml".to_string(),
            obstacle_dir: PathBuf::from("Models/Trash"),
            obstacle_material_dir: PathBuf::from("Materials/Trash"),
            material_extension: "xml".to_string(),
        }
    }
}

impl AssetCatalog {
    /// Check every collection generation will draw from.
    /// Obstacle collections only matter when obstacles are enabled.
    pub fn validate(&self, obstacles_enabled: bool) -> Result<(), CorridorError> {
        if self.segment_meshes.is_empty() {
            return Err(CorridorError::EmptyCatalog("segment meshes"));
        }
        if obstacles_enabled {
            if self.obstacle_meshes.is_empty() {
                return Err(CorridorError::EmptyCatalog("obstacle meshes"));
            }
            if self.obstacle_materials.is_empty() {
                return Err(CorridorError::EmptyCatalog("obstacle materials"));
            }
        }
        Ok(())
    }

    /// Built-in catalog of generated corridor pieces and rubble.
    pub fn procedural() -> Self {
        let segment_meshes = vec![
            shapes::tube("pipe_straight_short", 6.0, 20.0, 16, 8),
            shapes::tube("pipe_straight_long", 6.0, 36.0, 16, 14),
            shapes::bent_tube("pipe_bend_left", 6.0, 28.0, -2.5, 16, 11),
            shapes::bent_tube("pipe_bend_right", 6.0, 28.0, 2.5, 16, 11),
        ];
        let obstacle_meshes = vec![
            shapes::rubble("rubble_round", 1.0, 1.0),
            shapes::rubble("rubble_shard", 0.8, 2.2),
            shapes::rubble("rubble_flat", 1.4, 0.4),
        ];

        Self {
            segment_meshes: segment_meshes.into_iter().map(Arc::new).collect(),
            segment_material: MaterialRef::new("procedural/rusty_metal"),
            obstacle_meshes: obstacle_meshes.into_iter().map(Arc::new).collect(),
            obstacle_materials: ["procedural/oxide", "procedural/grime", "procedural/chrome"]
                .into_iter()
                .map(MaterialRef::new)
                .collect(),
        }
    }

    /// Scan each resource root for models and materials laid out per `layout`.
    ///
    /// Roots lacking a directory are skipped; files are taken in sorted order so a
    /// seeded run picks the same assets on every machine. Emptiness is not an error
    /// here: [`validate`](Self::validate) decides what the generator needs.
    pub fn load(roots: &[PathBuf], layout: &CatalogLayout) -> Result<Self, CatalogError> {
        let mut segment_meshes = Vec::new();
        let mut obstacle_meshes = Vec::new();
        let mut obstacle_materials = Vec::new();

        for root in roots {
            for path in scan_files(&root.join(&layout.segment_dir), &["glb", "gltf"])? {
                segment_meshes.push(Arc::new(import_mesh(&path)?));
            }
            for path in scan_files(&root.join(&layout.obstacle_dir), &["glb", "gltf"])? {
                obstacle_meshes.push(Arc::new(import_mesh(&path)?));
            }
            let material_dir = root.join(&layout.obstacle_material_dir);
            for path in scan_files(&material_dir, &[layout.material_extension.as_str()])? {
                let relative = path.strip_prefix(root).unwrap_or(&path);
                obstacle_materials.push(MaterialRef::new(relative.to_string_lossy()));
            }
        }

        log::info!(
            "Asset catalog: {} segment meshes, {} obstacle meshes, {} obstacle materials from {} roots",
            segment_meshes.len(),
            obstacle_meshes.len(),
            obstacle_materials.len(),
            roots.len()
        );

        Ok(Self {
            segment_meshes,
            segment_material: MaterialRef::new(layout.segment_material.clone()),
            obstacle_meshes,
            obstacle_materials,
        })
    }
}

/// Regular files directly inside `dir` whose extension is in `extensions`, sorted.
/// A missing directory yields an empty list.
fn scan_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, CatalogError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let io_err = |source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|want| e.eq_ignore_ascii_case(want)));
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Import every triangle primitive of a glTF file into one mesh asset.
/// Normals are carried over when the file has them.
fn import_mesh(path: &Path) -> Result<MeshAsset, CatalogError> {
    let (document, buffers, _images) = gltf::import(path).map_err(|source| CatalogError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut all_have_normals = true;
    let mut indices: Vec<u32> = Vec::new();

    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let Some(prim_positions) = reader.read_positions() else {
                continue;
            };
            let base = positions.len() as u32;
            let before = positions.len();
            positions.extend(prim_positions);
            let added = positions.len() - before;

            match reader.read_normals() {
                Some(prim_normals) => normals.extend(prim_normals),
                None => all_have_normals = false,
            }
            match reader.read_indices() {
                Some(prim_indices) => indices.extend(prim_indices.into_u32().map(|i| base + i)),
                None => indices.extend(base..base + added as u32),
            }
        }
    }

    if positions.is_empty() {
        return Err(CatalogError::NoGeometry {
            path: path.to_path_buf(),
        });
    }

    let with_normals = all_have_normals && normals.len() == positions.len();
    let layout = if with_normals {
        VertexLayout::interleaved(&[
            (VertexSemantic::Position, ElementKind::Float3),
            (VertexSemantic::Normal, ElementKind::Float3),
        ])
    } else {
        log::warn!("{:?} has no normals; it cannot carry decorations", path);
        VertexLayout::interleaved(&[(VertexSemantic::Position, ElementKind::Float3)])
    };

    let mut floats = Vec::with_capacity(positions.len() * if with_normals { 6 } else { 3 });
    for (i, p) in positions.iter().enumerate() {
        floats.extend_from_slice(p);
        if with_normals {
            floats.extend_from_slice(&normals[i]);
        }
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(MeshAsset::new(
        name,
        RawVertexBuffer::from_floats(layout, &floats),
        indices,
    )?)
}
