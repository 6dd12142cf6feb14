//! The segment chain: an endless corridor grown in bursts along -Y.
//!
//! Segments are spawned end to end from a moving anchor. Each one owns its
//! lights and obstacles as child entities, so evicting a segment frees its
//! decorations with it. Only a bounded window of recent segments is kept live.

use std::sync::Arc;

use glam::{Quat, Vec3};
use hecs::{Entity, World};
use rand::Rng;

use crate::catalog::{AssetCatalog, MaterialRef};
use crate::config::CorridorConfig;
use crate::error::CorridorError;
use crate::mesh::MeshAsset;
use crate::obstacle::{FloatingObstacle, Obstacle};
use crate::placement::PlacementPlan;
use engine_core::{despawn_recursive, spawn_child, subtree, world_transform, Transform};
use physics::{entity_user_data, CollisionGroup, PhysicsCollider, PhysicsWorld};

/// Where the first segment of every run is anchored.
pub const CORRIDOR_ORIGIN: Vec3 = Vec3::ZERO;

/// Marks a corridor segment entity. `spawn_index` counts from 0 within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorridorSegment {
    pub spawn_index: u64,
}

/// A mesh and material pair for whatever draws the scene.
#[derive(Debug, Clone)]
pub struct StaticModel {
    pub mesh: Arc<MeshAsset>,
    pub material: MaterialRef,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub range: f32,
}

/// Bookkeeping for one live segment.
#[derive(Debug, Clone)]
pub struct Segment {
    pub entity: Entity,
    pub spawn_index: u64,
    pub mesh: Arc<MeshAsset>,
    /// Local transform under the corridor root.
    pub transform: Transform,
    /// Lights then obstacles, in spawn order.
    pub decorations: Vec<Entity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Uninitialized,
    Running,
}

/// Grows, trims and resets the corridor.
pub struct SegmentChainManager {
    config: CorridorConfig,
    state: GeneratorState,
    root: Option<Entity>,
    catalog: Option<Arc<AssetCatalog>>,
    anchor: Vec3,
    next_spawn_index: u64,
    active_segments: Vec<Segment>,
}

impl SegmentChainManager {
    pub fn new(config: CorridorConfig) -> Result<Self, CorridorError> {
        config.validate()?;
        Ok(Self {
            config,
            state: GeneratorState::Uninitialized,
            root: None,
            catalog: None,
            anchor: CORRIDOR_ORIGIN,
            next_spawn_index: 0,
            active_segments: Vec::new(),
        })
    }

    /// Bind the generator to a scene root and catalog, then lay down the first burst.
    ///
    /// Calling this on a running generator resets it first. On error the
    /// generator is left uninitialized with nothing spawned.
    pub fn init<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        physics: &mut PhysicsWorld,
        root: Entity,
        catalog: Arc<AssetCatalog>,
        rng: &mut R,
    ) -> Result<(), CorridorError> {
        catalog.validate(self.config.placement.obstacles_enabled())?;
        if !world.contains(root) {
            return Err(engine_core::HierarchyError::MissingParent(root).into());
        }
        if self.state == GeneratorState::Running {
            self.reset(world, physics);
        }

        self.root = Some(root);
        self.catalog = Some(catalog);
        self.anchor = CORRIDOR_ORIGIN;
        self.next_spawn_index = 0;
        self.state = GeneratorState::Running;

        if let Err(err) = self.generate_segments(world, physics, rng) {
            self.reset(world, physics);
            self.state = GeneratorState::Uninitialized;
            self.root = None;
            self.catalog = None;
            return Err(err);
        }
        log::info!(
            "Corridor started: {} segments, edge at {:.1}",
            self.active_segments.len(),
            self.edge()
        );
        Ok(())
    }

    /// Evict old segments if the window is over its ceiling, then append a burst.
    /// Returns the number of segments spawned.
    pub fn generate_segments<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        physics: &mut PhysicsWorld,
        rng: &mut R,
    ) -> Result<usize, CorridorError> {
        let (Some(root), Some(catalog)) = (self.root, self.catalog.clone()) else {
            return Err(CorridorError::NotInitialized);
        };
        if self.state != GeneratorState::Running {
            return Err(CorridorError::NotInitialized);
        }
        catalog.validate(self.config.placement.obstacles_enabled())?;
        if !world.contains(root) {
            return Err(engine_core::HierarchyError::MissingParent(root).into());
        }

        self.evict(world, physics);

        for _ in 0..self.config.segments_per_burst {
            self.spawn_segment(world, physics, root, &catalog, rng)?;
        }
        log::debug!(
            "Generated {} segments; {} live, edge at {:.1}",
            self.config.segments_per_burst,
            self.active_segments.len(),
            self.edge()
        );
        Ok(self.config.segments_per_burst)
    }

    /// Destroy every segment and rewind the anchor. The catalog binding survives,
    /// so a running generator can generate again straight away.
    pub fn reset(&mut self, world: &mut World, physics: &mut PhysicsWorld) {
        let count = self.active_segments.len();
        for segment in std::mem::take(&mut self.active_segments) {
            destroy_segment(world, physics, segment.entity);
        }
        self.anchor = CORRIDOR_ORIGIN;
        self.next_spawn_index = 0;
        if count > 0 {
            log::info!("Corridor reset, {} segments destroyed", count);
        }
    }

    /// The far end of the corridor along the extension axis.
    pub fn edge(&self) -> f32 {
        self.anchor.y
    }

    /// Where the next segment will be placed.
    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Whether the probe at `probe_y` is within the lookahead margin of the edge.
    pub fn should_extend(&self, probe_y: f32) -> bool {
        self.state == GeneratorState::Running
            && probe_y - self.config.lookahead_margin < self.edge()
    }

    /// Live segments, oldest first.
    pub fn active_segments(&self) -> &[Segment] {
        &self.active_segments
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn config(&self) -> &CorridorConfig {
        &self.config
    }

    fn evict(&mut self, world: &mut World, physics: &mut PhysicsWorld) {
        if self.active_segments.len() <= self.config.window_ceiling {
            return;
        }
        let Some(excess) = self
            .active_segments
            .len()
            .checked_sub(self.config.window_retain)
        else {
            debug_assert!(false, "eviction window underflow");
            log::error!(
                "Eviction skipped: {} live segments, retain {}",
                self.active_segments.len(),
                self.config.window_retain
            );
            return;
        };

        for segment in self.active_segments.drain(..excess) {
            destroy_segment(world, physics, segment.entity);
        }
        log::debug!("Evicted {} segments, {} remain", excess, self.active_segments.len());
    }

    fn spawn_segment<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        physics: &mut PhysicsWorld,
        root: Entity,
        catalog: &AssetCatalog,
        rng: &mut R,
    ) -> Result<(), CorridorError> {
        let mesh = catalog.segment_meshes[rng.gen_range(0..catalog.segment_meshes.len())].clone();
        let step = rng.gen_range(0..self.config.rotation_steps);
        let angle = (step as f32 * self.config.rotation_step_degrees).to_radians();
        let transform =
            Transform::from_position_rotation(self.anchor, Quat::from_axis_angle(Vec3::NEG_Y, angle))
                .with_uniform_scale(self.config.segment_scale);

        let spawn_index = self.next_spawn_index;
        let entity = spawn_child(
            world,
            root,
            (
                transform,
                StaticModel {
                    mesh: mesh.clone(),
                    material: catalog.segment_material.clone(),
                },
                CorridorSegment { spawn_index },
            ),
        )?;
        self.next_spawn_index += 1;

        let pose = world_transform(world, entity).unwrap_or(transform);
        match physics.add_static_trimesh(
            &mesh.positions(),
            &mesh.triangles(),
            &pose,
            CollisionGroup::corridor(),
            entity_user_data(entity),
        ) {
            Some(handle) => attach_collider(world, physics, entity, handle),
            None => log::warn!(
                "Segment mesh `{}` has no triangles; spawned without collision",
                mesh.name()
            ),
        }

        let is_first_segment = self.anchor == CORRIDOR_ORIGIN;
        let decorations = match mesh.decode() {
            Ok(view) => {
                let plan = self
                    .config
                    .placement
                    .plan(&view, catalog, is_first_segment, rng);
                spawn_decorations(world, physics, entity, plan)?
            }
            Err(err) => {
                log::warn!("Segment {} left undecorated: {}", spawn_index, err);
                Vec::new()
            }
        };

        self.active_segments.push(Segment {
            entity,
            spawn_index,
            mesh: mesh.clone(),
            transform,
            decorations,
        });
        self.anchor.y -= mesh.bounding_size().y * transform.scale.y;
        Ok(())
    }
}

/// Spawn a segment's planned lights and obstacles as its children.
fn spawn_decorations(
    world: &mut World,
    physics: &mut PhysicsWorld,
    segment: Entity,
    plan: PlacementPlan,
) -> Result<Vec<Entity>, CorridorError> {
    let mut spawned = Vec::with_capacity(plan.lights.len() + plan.obstacles.len());

    for light in &plan.lights {
        let entity = spawn_child(
            world,
            segment,
            (light.transform(), PointLight { range: light.range }),
        )?;
        spawned.push(entity);
    }

    for obstacle in plan.obstacles {
        let entity = spawn_child(
            world,
            segment,
            (
                obstacle.transform,
                StaticModel {
                    mesh: obstacle.mesh.clone(),
                    material: obstacle.material,
                },
                Obstacle,
                FloatingObstacle::default(),
            ),
        )?;
        let pose = world_transform(world, entity).unwrap_or(obstacle.transform);
        if let Some(handle) = physics.add_static_trimesh(
            &obstacle.mesh.positions(),
            &obstacle.mesh.triangles(),
            &pose,
            CollisionGroup::obstacle(),
            entity_user_data(entity),
        ) {
            attach_collider(world, physics, entity, handle);
        }
        spawned.push(entity);
    }

    Ok(spawned)
}

/// Link `handle` to `entity`, or drop the collider if the entity cannot hold it.
fn attach_collider(
    world: &mut World,
    physics: &mut PhysicsWorld,
    entity: Entity,
    handle: physics::ColliderHandle,
) {
    if let Err(err) = world.insert_one(entity, PhysicsCollider(handle)) {
        log::warn!("Dropping collider for {:?}: {}", entity, err);
        physics.remove_collider(handle);
    }
}

/// Remove a segment's colliders, then the segment and everything it owns.
fn destroy_segment(world: &mut World, physics: &mut PhysicsWorld, segment: Entity) {
    for entity in subtree(world, segment) {
        if let Ok(collider) = world.get::<&PhysicsCollider>(entity) {
            physics.remove_collider(collider.0);
        }
    }
    despawn_recursive(world, segment);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{ElementKind, RawVertexBuffer, VertexLayout, VertexSemantic};
    use crate::shapes;
    use engine_core::Children;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Harness {
        world: World,
        physics: PhysicsWorld,
        root: Entity,
        rng: StdRng,
        chain: SegmentChainManager,
    }

    impl Harness {
        fn new(seed: u64) -> Self {
            let mut world = World::new();
            let root = world.spawn((Transform::default(),));
            Self {
                world,
                physics: PhysicsWorld::new(),
                root,
                rng: StdRng::seed_from_u64(seed),
                chain: SegmentChainManager::new(CorridorConfig::default()).unwrap(),
            }
        }

        fn init(&mut self, catalog: AssetCatalog) -> Result<(), CorridorError> {
            self.chain.init(
                &mut self.world,
                &mut self.physics,
                self.root,
                Arc::new(catalog),
                &mut self.rng,
            )
        }

        fn generate(&mut self) -> Result<usize, CorridorError> {
            self.chain
                .generate_segments(&mut self.world, &mut self.physics, &mut self.rng)
        }

        fn count<T: hecs::Component>(&self, entities: &[Entity]) -> usize {
            entities
                .iter()
                .filter(|&&e| self.world.get::<&T>(e).is_ok())
                .count()
        }

        fn spawn_indices(&self) -> Vec<u64> {
            self.chain.active_segments().iter().map(|s| s.spawn_index).collect()
        }
    }

    /// One straight tube and the stock rubble, so segment lengths are known.
    fn straight_catalog() -> AssetCatalog {
        AssetCatalog {
            segment_meshes: vec![Arc::new(shapes::tube("straight", 6.0, 10.0, 12, 4))],
            ..AssetCatalog::procedural()
        }
    }

    /// A tube whose vertex buffer carries positions only.
    fn tube_without_normals() -> MeshAsset {
        let tube = shapes::tube("bare", 6.0, 10.0, 12, 4);
        let floats: Vec<f32> = tube.positions().iter().flat_map(|p| p.to_array()).collect();
        let layout = VertexLayout::interleaved(&[(VertexSemantic::Position, ElementKind::Float3)]);
        MeshAsset::new(
            "bare",
            RawVertexBuffer::from_floats(layout, &floats),
            tube.triangles().concat(),
        )
        .unwrap()
    }

    #[test]
    fn init_lays_a_clear_first_segment() {
        let mut h = Harness::new(1);
        h.init(AssetCatalog::procedural()).unwrap();

        assert_eq!(h.chain.state(), GeneratorState::Running);
        let segments = h.chain.active_segments().to_vec();
        assert_eq!(segments.len(), 3);
        assert_eq!(h.spawn_indices(), vec![0, 1, 2]);

        assert_eq!(h.count::<PointLight>(&segments[0].decorations), 4);
        assert_eq!(h.count::<Obstacle>(&segments[0].decorations), 0);
        for segment in &segments[1..] {
            assert_eq!(h.count::<PointLight>(&segment.decorations), 4);
            assert_eq!(h.count::<Obstacle>(&segment.decorations), 5);
        }
    }

    #[test]
    fn segments_are_parented_under_the_root() {
        let mut h = Harness::new(2);
        h.init(AssetCatalog::procedural()).unwrap();
        let children = h.world.get::<&Children>(h.root).unwrap().0.clone();
        let entities: Vec<Entity> = h.chain.active_segments().iter().map(|s| s.entity).collect();
        assert_eq!(children, entities);
        for segment in h.chain.active_segments() {
            let model = h.world.get::<&StaticModel>(segment.entity).unwrap();
            assert_eq!(model.material.name(), "procedural/rusty_metal");
            assert_eq!(segment.transform.scale, Vec3::splat(5.0));
        }
    }

    #[test]
    fn anchor_advances_by_scaled_segment_length() {
        let mut h = Harness::new(3);
        h.init(straight_catalog()).unwrap();
        assert!((h.chain.edge() - -150.0).abs() < 1e-3);

        let mut last = h.chain.edge();
        for _ in 0..5 {
            h.generate().unwrap();
            assert!(h.chain.edge() < last);
            last = h.chain.edge();
        }
        assert!((h.chain.edge() - -900.0).abs() < 1e-2);

        let ys: Vec<f32> = h
            .chain
            .active_segments()
            .iter()
            .map(|s| s.transform.position.y)
            .collect();
        assert!(ys.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn eviction_keeps_the_newest_segments() {
        let mut h = Harness::new(4);
        h.init(AssetCatalog::procedural()).unwrap();
        for _ in 0..3 {
            h.generate().unwrap();
        }
        assert_eq!(h.spawn_indices(), (0..12).collect::<Vec<u64>>());

        let doomed: Vec<Segment> = h.chain.active_segments()[..7].to_vec();
        h.generate().unwrap();
        assert_eq!(h.spawn_indices(), (7..15).collect::<Vec<u64>>());

        for segment in &doomed {
            assert!(!h.world.contains(segment.entity));
            for decoration in &segment.decorations {
                assert!(!h.world.contains(*decoration));
            }
        }
        // Eight segments, all past the first, each with five obstacles.
        assert_eq!(h.physics.collider_count(), 8 + 8 * 5);
    }

    #[test]
    fn eviction_pre_pass_bounds_the_window() {
        let mut h = Harness::new(5);
        h.init(AssetCatalog::procedural()).unwrap();
        let config = h.chain.config().clone();
        for _ in 0..40 {
            // Eviction runs before the burst, so a call starts at or under the
            // ceiling and may end up to one burst above it.
            let before = h.chain.active_segments().len();
            h.generate().unwrap();
            let live = h.chain.active_segments().len();
            assert!(live <= config.window_ceiling + config.segments_per_burst);
            if before > config.window_ceiling {
                assert_eq!(live, config.window_retain + config.segments_per_burst);
            }
        }
        // Root, segments and their decorations; nothing leaks.
        let decorations: usize = h
            .chain
            .active_segments()
            .iter()
            .map(|s| s.decorations.len())
            .sum();
        assert_eq!(
            h.world.len() as usize,
            1 + h.chain.active_segments().len() + decorations
        );
    }

    #[test]
    fn reset_is_idempotent() {
        let mut h = Harness::new(6);
        h.init(AssetCatalog::procedural()).unwrap();
        h.generate().unwrap();

        for _ in 0..2 {
            h.chain.reset(&mut h.world, &mut h.physics);
            assert!(h.chain.active_segments().is_empty());
            assert_eq!(h.chain.edge(), 0.0);
            assert_eq!(h.physics.collider_count(), 0);
            assert_eq!(h.world.len(), 1);
            assert_eq!(h.chain.state(), GeneratorState::Running);
        }

        // The next run starts clear again.
        h.generate().unwrap();
        let first = h.chain.active_segments()[0].clone();
        assert_eq!(first.spawn_index, 0);
        assert_eq!(h.count::<Obstacle>(&first.decorations), 0);
    }

    #[test]
    fn same_seed_same_corridor() {
        let layout = |seed| {
            let mut h = Harness::new(seed);
            h.init(AssetCatalog::procedural()).unwrap();
            h.generate().unwrap();
            h.chain
                .active_segments()
                .iter()
                .map(|s| {
                    let decorations: Vec<Transform> = s
                        .decorations
                        .iter()
                        .map(|&e| *h.world.get::<&Transform>(e).unwrap())
                        .collect();
                    (s.mesh.name().to_string(), s.transform, decorations)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(layout(9), layout(9));
    }

    #[test]
    fn empty_catalog_spawns_nothing() {
        let mut h = Harness::new(7);
        let mut catalog = AssetCatalog::procedural();
        catalog.segment_meshes.clear();

        assert!(matches!(
            h.init(catalog),
            Err(CorridorError::EmptyCatalog("segment meshes"))
        ));
        assert_eq!(h.chain.state(), GeneratorState::Uninitialized);
        assert_eq!(h.world.len(), 1);
        assert_eq!(h.physics.collider_count(), 0);
        assert!(matches!(h.generate(), Err(CorridorError::NotInitialized)));
    }

    #[test]
    fn generate_before_init_is_rejected() {
        let mut h = Harness::new(8);
        assert!(matches!(h.generate(), Err(CorridorError::NotInitialized)));
        assert!(!h.chain.should_extend(-1.0e6));
    }

    #[test]
    fn mesh_without_normals_gets_collision_but_no_decorations() {
        let mut h = Harness::new(10);
        let catalog = AssetCatalog {
            segment_meshes: vec![Arc::new(tube_without_normals())],
            ..AssetCatalog::procedural()
        };
        h.init(catalog).unwrap();

        assert_eq!(h.chain.active_segments().len(), 3);
        for segment in h.chain.active_segments() {
            assert!(segment.decorations.is_empty());
            assert!(h.world.get::<&PhysicsCollider>(segment.entity).is_ok());
        }
        assert_eq!(h.physics.collider_count(), 3);
        assert!((h.chain.edge() - -150.0).abs() < 1e-3);
    }

    #[test]
    fn reinit_starts_a_fresh_run() {
        let mut h = Harness::new(11);
        h.init(AssetCatalog::procedural()).unwrap();
        h.generate().unwrap();
        h.init(straight_catalog()).unwrap();

        assert_eq!(h.spawn_indices(), vec![0, 1, 2]);
        assert!((h.chain.edge() - -150.0).abs() < 1e-3);
        let decorations: usize = h
            .chain
            .active_segments()
            .iter()
            .map(|s| s.decorations.len())
            .sum();
        assert_eq!(h.world.len() as usize, 1 + 3 + decorations);
    }

    #[test]
    fn extends_when_probe_nears_the_edge() {
        let mut h = Harness::new(12);
        h.init(straight_catalog()).unwrap();
        // Edge at -150, margin 500.
        assert!(h.chain.should_extend(0.0));
        assert!(h.chain.should_extend(349.0));
        assert!(!h.chain.should_extend(351.0));
    }

    #[test]
    fn segment_colliders_point_back_at_their_entity() {
        let mut h = Harness::new(13);
        h.init(AssetCatalog::procedural()).unwrap();
        for segment in h.chain.active_segments() {
            let handle = h.world.get::<&PhysicsCollider>(segment.entity).unwrap().0;
            let data = h.physics.collider_user_data(handle).unwrap();
            assert_eq!(physics::entity_from_user_data(data), Some(segment.entity));
        }
    }

    #[test]
    fn collider_is_dropped_when_its_entity_is_gone() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let entity = world.spawn((Transform::default(),));
        let handle = physics
            .add_static_trimesh(
                &[Vec3::ZERO, Vec3::X, Vec3::Z],
                &[[0, 1, 2]],
                &Transform::default(),
                CollisionGroup::obstacle(),
                entity_user_data(entity),
            )
            .unwrap();
        world.despawn(entity).unwrap();

        attach_collider(&mut world, &mut physics, entity, handle);
        assert_eq!(physics.collider_count(), 0);
    }

    #[test]
    fn attached_collider_is_reachable_from_its_entity() {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let entity = world.spawn((Transform::default(),));
        let handle = physics
            .add_static_trimesh(
                &[Vec3::ZERO, Vec3::X, Vec3::Z],
                &[[0, 1, 2]],
                &Transform::default(),
                CollisionGroup::obstacle(),
                entity_user_data(entity),
            )
            .unwrap();

        attach_collider(&mut world, &mut physics, entity, handle);
        assert_eq!(world.get::<&PhysicsCollider>(entity).unwrap().0, handle);
        assert_eq!(physics.collider_count(), 1);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = CorridorConfig {
            window_retain: 20,
            ..Default::default()
        };
        assert!(matches!(
            SegmentChainManager::new(config),
            Err(CorridorError::InvalidConfig(_))
        ));
    }
}
