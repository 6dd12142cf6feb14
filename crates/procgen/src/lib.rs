//! Procedural corridor generation: mesh sampling, decoration placement and the segment chain.

pub mod catalog;
pub mod config;
pub mod corridor;
pub mod error;
pub mod mesh;
pub mod obstacle;
pub mod placement;
pub mod shapes;

pub use catalog::*;
pub use config::*;
pub use corridor::*;
pub use error::*;
pub use mesh::*;
pub use obstacle::*;
pub use placement::*;
