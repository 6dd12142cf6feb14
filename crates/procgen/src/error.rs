//! Error types for mesh decoding, catalog loading and corridor generation.

use std::path::PathBuf;

use thiserror::Error;

use crate::mesh::VertexSemantic;

/// A mesh asset whose vertex data cannot be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("mesh `{mesh}` has no vertices")]
    Empty { mesh: String },

    #[error("mesh `{mesh}` has a zero vertex stride")]
    ZeroStride { mesh: String },

    #[error("mesh `{mesh}`: buffer of {len} bytes is not a whole number of {stride}-byte vertices")]
    RaggedBuffer { mesh: String, len: usize, stride: usize },

    #[error("mesh `{mesh}`: {semantic:?} element at offset {offset} overruns the {stride}-byte stride")]
    ElementOutOfBounds {
        mesh: String,
        semantic: VertexSemantic,
        offset: usize,
        stride: usize,
    },

    /// A required vertex channel is absent (or not stored as three floats).
    #[error("mesh `{mesh}` lacks a float3 {semantic:?} channel")]
    MissingChannel {
        mesh: String,
        semantic: VertexSemantic,
    },

    #[error("mesh `{mesh}`: index {index} out of range for {count} vertices")]
    IndexOutOfRange { mesh: String, index: u32, count: usize },
}

/// Failures surfaced to the host by the corridor generator.
#[derive(Debug, Error)]
pub enum CorridorError {
    /// A required asset collection is empty. Nothing was spawned.
    #[error("asset catalog has no {0}")]
    EmptyCatalog(&'static str),

    #[error("corridor generator used before init")]
    NotInitialized,

    #[error("invalid corridor config: {0}")]
    InvalidConfig(String),

    #[error("scene root is gone: {0}")]
    Scene(#[from] engine_core::HierarchyError),
}

/// Failures while building an [`AssetCatalog`](crate::AssetCatalog) from resource directories.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("gltf import of {path:?} failed: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("{path:?} contains no triangle primitives with positions")]
    NoGeometry { path: PathBuf },

    #[error(transparent)]
    Mesh(#[from] MeshError),
}
