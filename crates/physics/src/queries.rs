//! Overlap queries for probe contact and near-miss detection.

use crate::PhysicsWorld;
use engine_core::Vec3;
use rapier3d::prelude::*;

impl PhysicsWorld {
    /// Find all colliders overlapping a sphere whose groups pass `groups`.
    pub fn overlap_sphere(
        &self,
        center: Vec3,
        radius: f32,
        groups: InteractionGroups,
    ) -> Vec<ColliderHandle> {
        let shape = Ball::new(radius);
        let shape_pos = Isometry::translation(center.x, center.y, center.z);
        let filter = QueryFilter::default().groups(groups);

        let mut results = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &shape_pos,
            &shape,
            filter,
            |collider| {
                results.push(collider);
                true // Continue searching
            },
        );

        results
    }

    /// First collider overlapping a sphere, if any.
    pub fn first_overlap(
        &self,
        center: Vec3,
        radius: f32,
        groups: InteractionGroups,
    ) -> Option<ColliderHandle> {
        let shape = Ball::new(radius);
        let shape_pos = Isometry::translation(center.x, center.y, center.z);
        let filter = QueryFilter::default().groups(groups);

        self.query_pipeline.intersection_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &shape_pos,
            &shape,
            filter,
        )
    }
}
