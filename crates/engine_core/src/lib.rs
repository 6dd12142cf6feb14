//! Core engine types and utilities for the pipe probe game.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Transform and spatial components
//! - The fixed-tick simulation clock
//! - Parent/child ownership for entities in the hecs arena

pub mod components;
pub mod hierarchy;
pub mod time;
pub mod transform;

pub use components::*;
pub use hierarchy::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use hecs::{Entity, World};
