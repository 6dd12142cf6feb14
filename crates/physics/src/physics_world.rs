//! Collision world management with Rapier3D.
//!
//! The corridor never simulates rigid-body dynamics; everything here is a
//! parentless collider posed directly from scene transforms, plus the query
//! pipeline used for overlap tests.

use engine_core::{Transform, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

/// Convert an engine transform into a Rapier pose. Scale is ignored; callers bake it into geometry.
pub fn to_isometry(transform: &Transform) -> Isometry<Real> {
    let p = transform.position;
    let r = transform.rotation;
    Isometry3::from_parts(
        Translation3::new(p.x, p.y, p.z),
        UnitQuaternion::new_normalize(Quaternion::new(r.w, r.x, r.y, r.z)),
    )
}

/// Main collision world containing every registered collider.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub island_manager: IslandManager,
    pub query_pipeline: QueryPipeline,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create an empty collision world.
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            island_manager: IslandManager::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Update query pipeline for overlap tests. Call once per tick after colliders change.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Number of live colliders.
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    /// Add a static triangle-mesh collider built from exact mesh geometry.
    ///
    /// `vertices` are in mesh-local space; the transform's scale is baked into them
    /// and its position/rotation become the collider pose. Returns `None` when there
    /// is nothing to collide with (no vertices or no triangles).
    pub fn add_static_trimesh(
        &mut self,
        vertices: &[Vec3],
        triangles: &[[u32; 3]],
        transform: &Transform,
        groups: InteractionGroups,
        user_data: u128,
    ) -> Option<ColliderHandle> {
        if vertices.is_empty() || triangles.is_empty() {
            return None;
        }
        let scale = transform.scale;
        let points: Vec<Point<Real>> = vertices
            .iter()
            .map(|v| point![v.x * scale.x, v.y * scale.y, v.z * scale.z])
            .collect();

        let collider = ColliderBuilder::trimesh(points, triangles.to_vec())
            .position(to_isometry(transform))
            .collision_groups(groups)
            .user_data(user_data)
            .build();
        Some(self.collider_set.insert(collider))
    }

    /// Move a parentless collider to a new pose.
    pub fn set_collider_pose(&mut self, handle: ColliderHandle, transform: &Transform) {
        if let Some(collider) = self.collider_set.get_mut(handle) {
            collider.set_position(to_isometry(transform));
        }
    }

    /// Change which collision groups a collider belongs to.
    pub fn set_collider_groups(&mut self, handle: ColliderHandle, groups: InteractionGroups) {
        if let Some(collider) = self.collider_set.get_mut(handle) {
            collider.set_collision_groups(groups);
        }
    }

    /// User data stored on a collider at creation.
    pub fn collider_user_data(&self, handle: ColliderHandle) -> Option<u128> {
        self.collider_set.get(handle).map(|c| c.user_data)
    }

    /// World position of a collider's origin.
    pub fn collider_position(&self, handle: ColliderHandle) -> Option<Vec3> {
        self.collider_set.get(handle).map(|c| {
            let t = c.translation();
            Vec3::new(t.x, t.y, t.z)
        })
    }

    /// Remove a collider by its handle.
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        let removed = self.collider_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
        if removed.is_none() {
            log::debug!("Collider {:?} already removed", handle);
        }
    }
}
