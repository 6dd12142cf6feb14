//! Parent/child ownership on top of the hecs arena.
//!
//! A child is owned by exactly one parent. Destroying an entity with
//! [`despawn_recursive`] frees its whole subtree, so nothing attached to a
//! removed entity outlives it.

use hecs::{DynamicBundle, Entity, World};
use thiserror::Error;

use crate::Transform;

/// Link from a child entity to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Entities owned by this entity, in attachment order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(pub Vec<Entity>);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("parent entity {0:?} does not exist")]
    MissingParent(Entity),
}

/// Spawn `components` as a new child of `parent`.
pub fn spawn_child(
    world: &mut World,
    parent: Entity,
    components: impl DynamicBundle,
) -> Result<Entity, HierarchyError> {
    if !world.contains(parent) {
        return Err(HierarchyError::MissingParent(parent));
    }
    let child = world.spawn(components);
    let _ = world.insert_one(child, Parent(parent));

    if let Ok(mut children) = world.get::<&mut Children>(parent) {
        children.0.push(child);
        return Ok(child);
    }
    let _ = world.insert_one(parent, Children(vec![child]));
    Ok(child)
}

/// Every entity in the subtree rooted at `root`, parents before children.
/// Returns an empty list for a dead handle.
pub fn subtree(world: &World, root: Entity) -> Vec<Entity> {
    if !world.contains(root) {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(entity) = stack.pop() {
        out.push(entity);
        if let Ok(children) = world.get::<&Children>(entity) {
            // Reverse so the first child is visited first.
            stack.extend(children.0.iter().rev().copied());
        }
    }
    out
}

/// Destroy `root` and everything it owns, detaching it from its parent.
/// Returns the number of entities freed.
pub fn despawn_recursive(world: &mut World, root: Entity) -> usize {
    let doomed = subtree(world, root);
    if doomed.is_empty() {
        return 0;
    }

    let parent = world.get::<&Parent>(root).ok().map(|p| p.0);
    if let Some(parent) = parent {
        if let Ok(mut siblings) = world.get::<&mut Children>(parent) {
            siblings.0.retain(|&e| e != root);
        }
    }

    let mut freed = 0;
    for entity in doomed {
        if world.despawn(entity).is_ok() {
            freed += 1;
        }
    }
    freed
}

/// Compose the transforms from `entity` up through its ancestors.
/// Ancestors without a `Transform` count as identity.
pub fn world_transform(world: &World, entity: Entity) -> Option<Transform> {
    let mut transform = *world.get::<&Transform>(entity).ok()?;
    let mut current = entity;
    while let Some(parent) = world.get::<&Parent>(current).ok().map(|p| p.0) {
        if let Ok(parent_transform) = world.get::<&Transform>(parent) {
            transform = parent_transform.mul_transform(&transform);
        }
        current = parent;
    }
    Some(transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[derive(Debug)]
    struct Tag(u32);

    #[test]
    fn spawn_child_links_both_directions() {
        let mut world = World::new();
        let root = world.spawn((Tag(0),));
        let a = spawn_child(&mut world, root, (Tag(1),)).unwrap();
        let b = spawn_child(&mut world, root, (Tag(2),)).unwrap();

        assert_eq!(world.get::<&Parent>(a).unwrap().0, root);
        assert_eq!(world.get::<&Children>(root).unwrap().0, vec![a, b]);
    }

    #[test]
    fn spawn_child_rejects_dead_parent() {
        let mut world = World::new();
        let root = world.spawn((Tag(0),));
        world.despawn(root).unwrap();
        assert_eq!(
            spawn_child(&mut world, root, (Tag(1),)),
            Err(HierarchyError::MissingParent(root))
        );
        assert_eq!(world.len(), 0);
    }

    #[test]
    fn despawn_recursive_frees_whole_subtree_and_detaches() {
        let mut world = World::new();
        let root = world.spawn((Tag(0),));
        let segment = spawn_child(&mut world, root, (Tag(1),)).unwrap();
        let light = spawn_child(&mut world, segment, (Tag(2),)).unwrap();
        let rock = spawn_child(&mut world, segment, (Tag(3),)).unwrap();
        let keep = spawn_child(&mut world, root, (Tag(4),)).unwrap();

        assert_eq!(subtree(&world, segment), vec![segment, light, rock]);
        assert_eq!(despawn_recursive(&mut world, segment), 3);

        assert!(!world.contains(light));
        assert!(!world.contains(rock));
        assert!(world.contains(keep));
        assert_eq!(world.get::<&Children>(root).unwrap().0, vec![keep]);
        assert_eq!(despawn_recursive(&mut world, segment), 0);
    }

    #[test]
    fn world_transform_composes_ancestors() {
        let mut world = World::new();
        let root = world.spawn((Transform::from_position(Vec3::new(0.0, -20.0, 0.0)),));
        let segment = spawn_child(
            &mut world,
            root,
            (Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).with_uniform_scale(5.0),),
        )
        .unwrap();
        let child = spawn_child(
            &mut world,
            segment,
            (Transform::from_position(Vec3::new(0.0, 2.0, 0.0)),),
        )
        .unwrap();

        let t = world_transform(&world, child).unwrap();
        assert!((t.position - Vec3::new(1.0, -10.0, 0.0)).length() < 1e-5);
        assert!((t.scale - Vec3::splat(5.0)).length() < 1e-5);
    }
}
