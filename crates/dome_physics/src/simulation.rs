//! The whole player simulation behind one owner.
//!
//! [`SimulationContext`] holds every piece of mutable state (registry,
//! capsule, kinematics, look, clock) and is driven once per render frame by
//! [`SimulationContext::advance_frame`].

use bevy::log::info;
use bevy::math::Vec3;

use crate::capsule::Capsule;
use crate::collision_registry::{CollisionMesh, CollisionRegistry, SurfaceId};
use crate::config::SimulationConfig;
use crate::error::CollisionResult;
use crate::fixed_step::{FixedStepScheduler, FrameStep};
use crate::player_controller::{KinematicState, LookState, PlayerController, PlayerInput, TickReport};

/// Result of one render frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub step: FrameStep,
    /// The player fell out of the world and was put back at spawn
    pub respawned: bool,
    /// Report of the last tick run this frame
    pub last_tick: Option<TickReport>,
}

#[derive(Debug, Clone)]
pub struct SimulationContext {
    config: SimulationConfig,
    registry: CollisionRegistry,
    controller: PlayerController,
    scheduler: FixedStepScheduler,
    capsule: Capsule,
    kinematics: KinematicState,
    look: LookState,
    camera_anchor: Vec3,
}

impl SimulationContext {
    pub fn new(config: SimulationConfig) -> Self {
        let capsule = Capsule::upright(
            config.spawn.position(),
            config.spawn.axis_length,
            config.spawn.radius,
        );
        let anchor = capsule.upper_endpoint();
        Self {
            registry: CollisionRegistry::new(config.collision.clone()),
            controller: PlayerController::new(config.movement.clone()),
            scheduler: FixedStepScheduler::new(config.fixed_step.clone(), anchor),
            capsule,
            kinematics: KinematicState::default(),
            look: LookState::default(),
            camera_anchor: anchor,
            config,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> &CollisionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CollisionRegistry {
        &mut self.registry
    }

    /// Shorthand for [`CollisionRegistry::register`].
    pub fn register_surface(&mut self, mesh: CollisionMesh) -> CollisionResult<SurfaceId> {
        self.registry.register(mesh)
    }

    pub fn capsule(&self) -> &Capsule {
        &self.capsule
    }

    pub fn kinematics(&self) -> &KinematicState {
        &self.kinematics
    }

    pub fn look(&self) -> &LookState {
        &self.look
    }

    pub fn scheduler(&self) -> &FixedStepScheduler {
        &self.scheduler
    }

    /// Interpolated render position of the capsule's upper endpoint.
    pub fn camera_anchor(&self) -> Vec3 {
        self.camera_anchor
    }

    /// Put the player back at spawn with zeroed motion and level pitch.
    /// The capsule keeps its axis and radius.
    pub fn respawn(&mut self) {
        self.capsule.place_start_at(self.config.spawn.position());
        self.kinematics = KinematicState::default();
        self.look.pitch = 0.0;
        self.camera_anchor = self.capsule.upper_endpoint();
        self.scheduler.reset(self.camera_anchor);
        info!("Player respawned at {:?}", self.capsule.start);
    }

    /// Apply the mouse motion in `input` to the camera.
    pub fn apply_look(&mut self, input: &PlayerInput) {
        self.look.apply(input, &self.config.look);
    }

    /// Run one render frame: look, respawn check, fixed ticks, interpolation.
    pub fn advance_frame(&mut self, frame_delta: f32, input: &PlayerInput) -> FrameReport {
        self.apply_look(input);

        let respawned = self.capsule.upper_endpoint().y < self.config.spawn.respawn_height;
        if respawned {
            self.respawn();
        }

        let Self {
            registry,
            controller,
            scheduler,
            capsule,
            kinematics,
            look,
            ..
        } = self;
        let mut last_tick = None;
        let step = scheduler.advance(frame_delta, |dt| {
            last_tick = Some(controller.tick(capsule, kinematics, registry, input, look, dt));
            capsule.upper_endpoint()
        });
        self.camera_anchor = step.interpolated;

        FrameReport {
            step,
            respawned,
            last_tick,
        }
    }

    /// Run exactly one fixed tick, bypassing the accumulator.
    pub fn step_once(&mut self, input: &PlayerInput) -> TickReport {
        let dt = self.scheduler.tick_duration();
        let report = self.controller.tick(
            &mut self.capsule,
            &mut self.kinematics,
            &self.registry,
            input,
            &self.look,
            dt,
        );
        self.scheduler.reset(self.capsule.upper_endpoint());
        self.camera_anchor = self.capsule.upper_endpoint();
        report
    }
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawns_at_configured_position() {
        let sim = SimulationContext::default();
        assert_eq!(sim.capsule().start, Vec3::new(0.0, 7.0, 6.0));
        assert_eq!(sim.capsule().end, Vec3::new(0.0, 8.0, 6.0));
        assert_eq!(sim.camera_anchor(), Vec3::new(0.0, 8.0, 6.0));
        assert!(!sim.kinematics().on_ground);
    }

    #[test]
    fn test_falling_out_of_world_respawns() {
        let mut config = SimulationConfig::default();
        config.movement.floor_height = None;
        let mut sim = SimulationContext::new(config);
        let input = PlayerInput {
            pitch_delta: 100.0,
            ..Default::default()
        };

        let mut respawned = false;
        for _ in 0..2000 {
            if sim.advance_frame(0.05, &input).respawned {
                respawned = true;
                break;
            }
        }
        assert!(respawned, "Free fall should eventually trigger a respawn");
        // The frame that respawns still runs its ticks afterwards.
        let start = sim.capsule().start;
        assert!((start - Vec3::new(0.0, 7.0, 6.0)).length() < 0.05, "start = {:?}", start);
        assert_eq!(sim.look().pitch, 0.0);
        assert!((sim.capsule().axis() - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_frame_runs_scheduled_ticks() {
        let mut sim = SimulationContext::default();
        let report = sim.advance_frame(0.05, &PlayerInput::default());
        // 0.05 s is three ticks give or take float rounding.
        assert!(report.step.ticks >= 2, "ticks = {}", report.step.ticks);
        assert!(report.last_tick.is_some());
        assert!(sim.capsule().start.y < 7.0);
    }
}
