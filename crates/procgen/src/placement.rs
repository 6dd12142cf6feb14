//! Decoration placement: where a segment's lights and obstacles go.
//!
//! Placement is planned from the segment mesh's own surface samples, in the
//! segment's local space, before anything is spawned. Lights sit on evenly
//! strided vertices; obstacles hover off randomly chosen vertices along the
//! surface normal.

use std::sync::Arc;

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{AssetCatalog, MaterialRef};
use crate::mesh::{MeshAsset, VertexView};
use engine_core::Transform;

/// Tunables for decoration placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementPolicy {
    /// Point lights per segment, strided evenly over the vertex buffer.
    pub lights_per_segment: usize,
    /// Illumination range of each point light.
    pub light_range: f32,
    /// Obstacles per segment (never on the first segment of a run).
    pub obstacles_per_segment: usize,
    /// Minimum distance of an obstacle from the wall, along the wall normal.
    pub obstacle_base_offset: f32,
    /// Extra random distance off the wall, uniform in `[0, spread)`.
    pub obstacle_spread: f32,
    /// Uniform scale of obstacles relative to their segment.
    pub obstacle_scale: f32,
    /// Upper bound (degrees) of each of the random yaw and pitch applied to obstacles.
    pub obstacle_max_angle_degrees: f32,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            lights_per_segment: 4,
            light_range: 100.0,
            obstacles_per_segment: 5,
            obstacle_base_offset: 1.5,
            obstacle_spread: 6.0,
            obstacle_scale: 0.4,
            obstacle_max_angle_degrees: 180.0,
        }
    }
}

/// A point light to attach to a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightPlacement {
    pub position: Vec3,
    pub direction: Vec3,
    pub range: f32,
}

impl LightPlacement {
    /// Local transform facing along the sampled normal.
    pub fn transform(&self) -> Transform {
        let mut transform = Transform::from_position(self.position);
        transform.look_along(self.direction);
        transform
    }
}

/// An obstacle to attach to a segment.
#[derive(Debug, Clone)]
pub struct ObstaclePlacement {
    pub mesh: Arc<MeshAsset>,
    pub material: MaterialRef,
    pub transform: Transform,
}

/// Everything to spawn under one segment.
#[derive(Debug, Clone, Default)]
pub struct PlacementPlan {
    pub lights: Vec<LightPlacement>,
    pub obstacles: Vec<ObstaclePlacement>,
}

impl PlacementPolicy {
    pub fn obstacles_enabled(&self) -> bool {
        self.obstacles_per_segment > 0
    }

    /// Plan decorations for a segment whose mesh decoded to `view`.
    ///
    /// The first segment of a run never gets obstacles, so the probe always
    /// enters a clear corridor. Lights are placed on every segment.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        view: &VertexView<'_>,
        catalog: &AssetCatalog,
        is_first_segment: bool,
        rng: &mut R,
    ) -> PlacementPlan {
        let lights = view
            .stride_sample(self.lights_per_segment)
            .into_iter()
            .map(|s| LightPlacement {
                position: s.position,
                direction: s.normal,
                range: self.light_range,
            })
            .collect();

        if is_first_segment
            || catalog.obstacle_meshes.is_empty()
            || catalog.obstacle_materials.is_empty()
        {
            return PlacementPlan {
                lights,
                obstacles: Vec::new(),
            };
        }

        let obstacles = view
            .random_sample(self.obstacles_per_segment, rng)
            .into_iter()
            .map(|s| {
                let mesh = catalog.obstacle_meshes[rng.gen_range(0..catalog.obstacle_meshes.len())]
                    .clone();
                let material = catalog.obstacle_materials
                    [rng.gen_range(0..catalog.obstacle_materials.len())]
                .clone();
                let rotation = self.random_tumble(rng);
                let lift = self.obstacle_base_offset + rng.gen::<f32>() * self.obstacle_spread;
                let transform = Transform::from_position_rotation(
                    s.position + lift * s.normal,
                    rotation,
                )
                .with_uniform_scale(self.obstacle_scale);
                ObstaclePlacement {
                    mesh,
                    material,
                    transform,
                }
            })
            .collect();

        PlacementPlan { lights, obstacles }
    }

    /// Random yaw about -Y followed by random pitch about +X.
    fn random_tumble<R: Rng + ?Sized>(&self, rng: &mut R) -> Quat {
        let max = self.obstacle_max_angle_degrees.max(0.0).to_radians();
        let yaw = rng.gen::<f32>() * max;
        let pitch = rng.gen::<f32>() * max;
        Quat::from_axis_angle(Vec3::NEG_Y, yaw) * Quat::from_axis_angle(Vec3::X, pitch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixture() -> (AssetCatalog, Arc<MeshAsset>) {
        let catalog = AssetCatalog::procedural();
        let mesh = Arc::new(shapes::tube("fixture", 5.0, 10.0, 12, 5));
        (catalog, mesh)
    }

    #[test]
    fn first_segment_gets_lights_only() {
        let (catalog, mesh) = fixture();
        let view = mesh.decode().unwrap();
        let plan = PlacementPolicy::default().plan(&view, &catalog, true, &mut StdRng::seed_from_u64(1));
        assert_eq!(plan.lights.len(), 4);
        assert!(plan.obstacles.is_empty());
    }

    #[test]
    fn later_segments_get_lights_and_obstacles() {
        let (catalog, mesh) = fixture();
        let view = mesh.decode().unwrap();
        let policy = PlacementPolicy::default();
        let plan = policy.plan(&view, &catalog, false, &mut StdRng::seed_from_u64(1));
        assert_eq!(plan.lights.len(), 4);
        assert_eq!(plan.obstacles.len(), 5);
        for light in &plan.lights {
            assert_eq!(light.range, 100.0);
        }
        for obstacle in &plan.obstacles {
            assert_eq!(obstacle.transform.scale, Vec3::splat(0.4));
            // Tube normals face the axis, so obstacles float inside the wall radius.
            let radial = Vec3::new(obstacle.transform.position.x, 0.0, obstacle.transform.position.z);
            assert!(radial.length() <= 5.0 - 1.5 + 1e-4);
        }
    }

    #[test]
    fn lights_sit_on_strided_vertices_facing_normals() {
        let (catalog, mesh) = fixture();
        let view = mesh.decode().unwrap();
        let plan = PlacementPolicy::default().plan(&view, &catalog, true, &mut StdRng::seed_from_u64(3));
        let expected = view.stride_sample(4);
        for (light, sample) in plan.lights.iter().zip(expected) {
            assert_eq!(light.position, sample.position);
            let forward = light.transform().forward();
            assert!((forward - sample.normal.normalize()).length() < 1e-4);
        }
    }

    #[test]
    fn plan_is_deterministic_for_a_seed() {
        let (catalog, mesh) = fixture();
        let view = mesh.decode().unwrap();
        let policy = PlacementPolicy::default();
        let a = policy.plan(&view, &catalog, false, &mut StdRng::seed_from_u64(77));
        let b = policy.plan(&view, &catalog, false, &mut StdRng::seed_from_u64(77));
        for (x, y) in a.obstacles.iter().zip(&b.obstacles) {
            assert_eq!(x.transform, y.transform);
            assert_eq!(x.material, y.material);
            assert!(Arc::ptr_eq(&x.mesh, &y.mesh));
        }
    }

    #[test]
    fn zero_spread_places_obstacles_at_base_offset() {
        let (catalog, mesh) = fixture();
        let view = mesh.decode().unwrap();
        let policy = PlacementPolicy {
            obstacle_spread: 0.0,
            ..Default::default()
        };
        let plan = policy.plan(&view, &catalog, false, &mut StdRng::seed_from_u64(5));
        for obstacle in &plan.obstacles {
            let radial = Vec3::new(obstacle.transform.position.x, 0.0, obstacle.transform.position.z);
            assert!((radial.length() - 3.5).abs() < 1e-4);
        }
    }
}
