//! Collision groups and filtering.

use engine_core::Entity;
use rapier3d::prelude::*;

/// Collision groups for different entity types.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Corridor segment walls
    Corridor = 1 << 0,
    /// The player's probe
    Probe = 1 << 1,
    /// Floating obstacles that still award near-miss points
    Obstacle = 1 << 2,
    /// Obstacles that already scored; still solid
    Spent = 1 << 3,
}

impl CollisionGroup {
    fn bits(self) -> Group {
        Group::from_bits_retain(self as u32)
    }

    /// Interaction groups for corridor walls.
    pub fn corridor() -> InteractionGroups {
        InteractionGroups::new(Self::Corridor.bits(), Group::ALL)
    }

    /// Interaction groups for live obstacles.
    pub fn obstacle() -> InteractionGroups {
        InteractionGroups::new(Self::Obstacle.bits(), Group::ALL)
    }

    /// Interaction groups for obstacles whose score has been collected.
    pub fn spent() -> InteractionGroups {
        InteractionGroups::new(Self::Spent.bits(), Group::ALL)
    }

    /// Query groups for the probe hitting anything solid.
    pub fn probe_solid() -> InteractionGroups {
        InteractionGroups::new(
            Self::Probe.bits(),
            Group::from_bits_retain(
                Self::Corridor as u32 | Self::Obstacle as u32 | Self::Spent as u32,
            ),
        )
    }

    /// Query groups for the probe sweeping for scoreable obstacles.
    pub fn probe_near_miss() -> InteractionGroups {
        InteractionGroups::new(Self::Probe.bits(), Self::Obstacle.bits())
    }
}

/// Component linking an ECS entity to its collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsCollider(pub ColliderHandle);

/// Collider user data that points back at the owning entity.
pub fn entity_user_data(entity: Entity) -> u128 {
    entity.to_bits().get() as u128
}

/// Recover the owning entity from collider user data written by [`entity_user_data`].
pub fn entity_from_user_data(data: u128) -> Option<Entity> {
    Entity::from_bits(u64::try_from(data).ok()?)
}
