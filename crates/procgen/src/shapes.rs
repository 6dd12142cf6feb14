//! Procedural corridor pieces and obstacle shapes.
//! Used when no authored assets are available, and as fixtures in tests.
//! Coordinate system: Y-up, corridor pieces hang from y = 0 down to y = -length.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::mesh::{ElementKind, MeshAsset, RawVertexBuffer, VertexLayout, VertexSemantic};

fn surface_layout() -> VertexLayout {
    VertexLayout::interleaved(&[
        (VertexSemantic::Position, ElementKind::Float3),
        (VertexSemantic::Normal, ElementKind::Float3),
        (VertexSemantic::TexCoord, ElementKind::Float2),
    ])
}

fn build(name: &str, floats: &[f32], indices: Vec<u32>) -> MeshAsset {
    MeshAsset::new(name, RawVertexBuffer::from_floats(surface_layout(), floats), indices)
        .expect("procedural shapes are built well-formed")
}

/// Straight open tube along -Y with normals facing the axis.
pub fn tube(name: &str, radius: f32, length: f32, radial: u32, rings: u32) -> MeshAsset {
    bent_tube(name, radius, length, 0.0, radial, rings)
}

/// Tube whose centreline swings sideways by up to `sway` in X and returns to the axis at both ends,
/// so consecutive pieces always line up.
pub fn bent_tube(
    name: &str,
    radius: f32,
    length: f32,
    sway: f32,
    radial: u32,
    rings: u32,
) -> MeshAsset {
    let radial = radial.max(3);
    let rings = rings.max(1);
    let mut floats = Vec::with_capacity(((rings + 1) * radial * 8) as usize);

    for r in 0..=rings {
        let t = r as f32 / rings as f32;
        let centre = Vec3::new(sway * (PI * t).sin(), -length * t, 0.0);
        for s in 0..radial {
            let angle = s as f32 / radial as f32 * TAU;
            let outward = Vec3::new(angle.cos(), 0.0, angle.sin());
            let p = centre + outward * radius;
            let n = -outward;
            floats.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z]);
            floats.extend_from_slice(&[s as f32 / radial as f32, t]);
        }
    }

    let mut indices = Vec::with_capacity((rings * radial * 6) as usize);
    for r in 0..rings {
        for s in 0..radial {
            let next = (s + 1) % radial;
            let a = r * radial + s;
            let b = r * radial + next;
            let c = (r + 1) * radial + s;
            let d = (r + 1) * radial + next;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    build(name, &floats, indices)
}

/// Octahedral chunk of rubble, stretched by `elongation` along Y.
pub fn rubble(name: &str, radius: f32, elongation: f32) -> MeshAsset {
    let tips = [
        Vec3::X,
        -Vec3::X,
        Vec3::Y * elongation,
        -Vec3::Y * elongation,
        Vec3::Z,
        -Vec3::Z,
    ];
    let mut floats = Vec::with_capacity(tips.len() * 8);
    for tip in tips {
        let p = tip * radius;
        let n = tip.normalize();
        floats.extend_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z, 0.5, 0.5]);
    }

    #[rustfmt::skip]
    let indices = vec![
        0, 2, 4,  4, 2, 1,  1, 2, 5,  5, 2, 0,
        0, 4, 3,  4, 1, 3,  1, 5, 3,  5, 0, 3,
    ];
    build(name, &floats, indices)
}
