//! One headless play session: the probe, the corridor around it, and the score.
//!
//! Each tick runs in a fixed order: move the probe, extend the corridor if the
//! probe is near its edge, bob the obstacles, refresh the query pipeline, then
//! resolve near-misses and crashes against the probe's new position.

use std::sync::Arc;

use anyhow::Result;
use engine_core::{SimClock, Transform};
use glam::Vec3;
use hecs::World;
use physics::{entity_from_user_data, CollisionGroup, PhysicsWorld};
use procgen::{update_floating_obstacles, AssetCatalog, Obstacle, SegmentChainManager};
use rand::rngs::StdRng;

use crate::config::GameConfig;
use crate::probe::Probe;
use crate::scoring::Scoreboard;

/// A run that ended in a crash.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrashReport {
    pub tick: u64,
    pub score: u64,
    pub depth: f32,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEvents {
    pub extended: bool,
    pub near_misses: u32,
    pub crash: Option<CrashReport>,
}

pub struct Session {
    config: GameConfig,
    clock: SimClock,
    world: World,
    physics: PhysicsWorld,
    corridor: SegmentChainManager,
    probe: Probe,
    scoreboard: Scoreboard,
    rng: StdRng,
    crashes: Vec<CrashReport>,
    best_score: u64,
}

impl Session {
    pub fn new(config: GameConfig, catalog: Arc<AssetCatalog>, mut rng: StdRng) -> Result<Self> {
        let clock = SimClock::new(config.tick_rate_hz as f64);
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let root = world.spawn((Transform::default(),));

        let mut corridor = SegmentChainManager::new(config.corridor.clone())?;
        corridor.init(&mut world, &mut physics, root, catalog, &mut rng)?;

        let probe = Probe::spawn(&mut world, &config.probe, &clock);
        let scoreboard = Scoreboard::new(config.scoring.clone(), &clock);
        physics.update_query_pipeline();

        Ok(Self {
            config,
            clock,
            world,
            physics,
            corridor,
            probe,
            scoreboard,
            rng,
            crashes: Vec::new(),
            best_score: 0,
        })
    }

    pub fn tick(&mut self) -> Result<TickEvents> {
        let mut events = TickEvents::default();
        let dt = self.clock.timestep_seconds();
        self.clock.advance();

        self.probe.advance(&mut self.world, &self.config.probe, dt);
        let Some(probe_pos) = self.probe.position(&self.world) else {
            anyhow::bail!("probe entity vanished");
        };

        if self.corridor.should_extend(probe_pos.y) {
            self.corridor
                .generate_segments(&mut self.world, &mut self.physics, &mut self.rng)?;
            events.extended = true;
        }

        update_floating_obstacles(
            &mut self.world,
            &mut self.physics,
            dt,
            &self.config.corridor.float,
        );
        self.physics.update_query_pipeline();
        self.scoreboard.tick();

        events.near_misses = self.collect_near_misses(probe_pos);

        if self
            .physics
            .first_overlap(
                probe_pos,
                self.config.probe.body_radius,
                CollisionGroup::probe_solid(),
            )
            .is_some()
        {
            events.crash = Some(self.crash(probe_pos)?);
        }

        Ok(events)
    }

    /// Score every live obstacle within near-miss range, then mark it spent.
    fn collect_near_misses(&mut self, probe_pos: Vec3) -> u32 {
        let hits = self.physics.overlap_sphere(
            probe_pos,
            self.config.probe.near_miss_radius,
            CollisionGroup::probe_near_miss(),
        );
        let mut scored = 0;
        for handle in hits {
            let is_obstacle = self
                .physics
                .collider_user_data(handle)
                .and_then(entity_from_user_data)
                .is_some_and(|e| self.world.get::<&Obstacle>(e).is_ok());
            if !is_obstacle {
                continue;
            }
            self.physics.set_collider_groups(handle, CollisionGroup::spent());
            let at = self.physics.collider_position(handle).unwrap_or(probe_pos);
            self.scoreboard.award_near_miss(at);
            scored += 1;
        }
        if scored > 0 {
            self.physics.update_query_pipeline();
            log::debug!("{} near-miss(es), score {}", scored, self.scoreboard.points());
        }
        scored
    }

    /// End the current run and start another from the top of a fresh corridor.
    fn crash(&mut self, probe_pos: Vec3) -> Result<CrashReport> {
        let report = CrashReport {
            tick: self.clock.tick_count(),
            score: self.scoreboard.points(),
            depth: -probe_pos.y,
        };
        log::info!(
            "Probe has crashed at depth {:.0}! Score {}",
            report.depth,
            report.score
        );
        self.best_score = self.best_score.max(report.score);
        self.crashes.push(report);

        self.scoreboard.reset();
        self.corridor.reset(&mut self.world, &mut self.physics);
        let old = std::mem::replace(
            &mut self.probe,
            Probe::spawn(&mut self.world, &self.config.probe, &self.clock),
        );
        old.despawn(&mut self.world);
        self.corridor
            .generate_segments(&mut self.world, &mut self.physics, &mut self.rng)?;
        self.physics.update_query_pipeline();
        Ok(report)
    }

    pub fn score(&self) -> u64 {
        self.scoreboard.points()
    }

    pub fn best_score(&self) -> u64 {
        self.best_score.max(self.scoreboard.points())
    }

    pub fn crashes(&self) -> &[CrashReport] {
        &self.crashes
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn corridor(&self) -> &SegmentChainManager {
        &self.corridor
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn probe_position(&self) -> Option<Vec3> {
        self.probe.position(&self.world)
    }

    pub fn probe_speed(&self) -> f32 {
        self.probe.speed(&self.world)
    }

    pub fn entity_count(&self) -> u32 {
        self.world.len()
    }
}
