//! First-person walking controller for the capsule.
//!
//! Behaviour is driven by two flags only, `on_ground` and
//! `vertical_velocity`. One [`PlayerController::tick`]:
//!
//! 1. builds the desired horizontal move from the input and the camera yaw
//! 2. walks it in sub-steps of at most `max_step`, resolving after each one
//!    without allowing grounding
//! 3. pushes the capsule back above the floor plane if it slipped through
//! 4. integrates gravity (or clamps upward velocity when grounded)
//! 5. applies the vertical move and resolves with grounding allowed
//! 6. when grounded and moving, walks the move again projected onto the
//!    ground plane, in the same sub-steps
//!
//! A failing resolve is logged and the sub-step it belonged to is undone.

use bevy::log::warn;
use bevy::math::{Quat, Vec3};

use crate::capsule::Capsule;
use crate::collision_registry::CollisionRegistry;
use crate::collision_resolver::{CapsuleResolver, ResolveReport};
use crate::config::{LookConfig, MovementConfig};
use crate::ground_slope::project_onto_ground;

/// Vertical displacements smaller than this are not applied.
const MIN_VERTICAL_MOVE: f32 = 1e-6;

/// Floor for `max_step` so sub-stepping always terminates.
const MIN_SUB_STEP: f32 = 1e-3;

/// The most recent input sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Accumulated horizontal look motion since the last sample
    pub yaw_delta: f32,
    /// Accumulated vertical look motion since the last sample
    pub pitch_delta: f32,
}

impl PlayerInput {
    pub fn has_movement(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

/// Vertical motion state of the player.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KinematicState {
    pub vertical_velocity: f32,
    pub on_ground: bool,
}

impl KinematicState {
    /// Airborne with the given vertical velocity.
    pub fn falling(vertical_velocity: f32) -> Self {
        Self {
            vertical_velocity,
            on_ground: false,
        }
    }
}

/// Camera orientation. Only yaw affects movement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookState {
    pub yaw: f32,
    pub pitch: f32,
}

impl LookState {
    /// Apply mouse motion: moving right turns right, moving down looks down.
    pub fn apply(&mut self, input: &PlayerInput, config: &LookConfig) {
        self.yaw -= input.yaw_delta * config.yaw_sensitivity;
        self.pitch = (self.pitch - input.pitch_delta * config.pitch_sensitivity)
            .clamp(-config.max_pitch, config.max_pitch);
    }

    /// Horizontal forward direction (-Z at zero yaw).
    pub fn forward(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * Vec3::NEG_Z
    }

    /// Horizontal right direction (+X at zero yaw).
    pub fn right(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * Vec3::X
    }

    /// Camera rotation: yaw about Y, then pitch about the local X axis.
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }
}

/// What happened during one [`PlayerController::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Horizontal move requested by the input
    pub desired_move: Vec3,
    /// Number of horizontal sub-steps taken
    pub sub_steps: u32,
    /// The floor-plane backstop had to lift the capsule
    pub floor_backstop: bool,
    /// The vertical resolve reported a landing
    pub landed: bool,
    /// Move applied along the ground plane after landing, if any
    pub slope_move: Option<Vec3>,
    /// Resolve calls that failed and were rolled back
    pub failed_resolves: u32,
}

#[derive(Debug, Clone, Copy)]
enum ResolvePhase {
    Horizontal,
    Vertical,
    GroundProjection,
}

impl ResolvePhase {
    fn label(self) -> &'static str {
        match self {
            ResolvePhase::Horizontal => "horizontal",
            ResolvePhase::Vertical => "vertical",
            ResolvePhase::GroundProjection => "ground projection",
        }
    }
}

/// Fixed-tick movement for the player capsule.
#[derive(Debug, Clone)]
pub struct PlayerController {
    movement: MovementConfig,
    resolver: CapsuleResolver,
}

impl PlayerController {
    pub fn new(mut movement: MovementConfig) -> Self {
        if movement.max_step.is_nan() || movement.max_step < MIN_SUB_STEP {
            warn!(
                "max_step {} is too small, using {}",
                movement.max_step, MIN_SUB_STEP
            );
            movement.max_step = MIN_SUB_STEP;
        }
        let resolver = CapsuleResolver::new(movement.landing_epsilon);
        Self { movement, resolver }
    }

    pub fn movement(&self) -> &MovementConfig {
        &self.movement
    }

    /// Horizontal move for `dt` seconds of `input` while facing `look`.
    pub fn desired_move(&self, input: &PlayerInput, look: &LookState, dt: f32) -> Vec3 {
        let forward = look.forward();
        let right = look.right();
        let mut direction = Vec3::ZERO;
        if input.forward {
            direction += forward;
        }
        if input.backward {
            direction -= forward;
        }
        if input.left {
            direction -= right;
        }
        if input.right {
            direction += right;
        }
        direction.normalize_or_zero() * self.movement.speed * dt
    }

    /// Advance the player by one fixed tick of `dt` seconds.
    pub fn tick(
        &self,
        capsule: &mut Capsule,
        kinematics: &mut KinematicState,
        registry: &CollisionRegistry,
        input: &PlayerInput,
        look: &LookState,
        dt: f32,
    ) -> TickReport {
        let mut report = TickReport {
            desired_move: self.desired_move(input, look, dt),
            ..Default::default()
        };

        let distance = report.desired_move.length();
        if distance > 0.0 {
            report.sub_steps = self.walk(
                capsule,
                kinematics,
                registry,
                report.desired_move,
                ResolvePhase::Horizontal,
                &mut report,
            );
        }

        if let Some(floor) = self.movement.floor_height {
            let penetration = capsule.bottom() - floor;
            if penetration < -self.movement.floor_epsilon {
                capsule.translate(Vec3::Y * (self.movement.floor_epsilon - penetration));
                kinematics.vertical_velocity = 0.0;
                kinematics.on_ground = true;
                report.floor_backstop = true;
            }
        }

        if kinematics.on_ground {
            kinematics.vertical_velocity = kinematics.vertical_velocity.max(0.0);
        } else {
            kinematics.vertical_velocity += self.movement.gravity * dt;
        }

        let dy = kinematics.vertical_velocity * dt;
        if dy.abs() > MIN_VERTICAL_MOVE {
            capsule.translate(Vec3::Y * dy);
        }
        // Resolve even without movement to catch residual overlap.
        if let Some(resolved) = self.resolve_step(
            capsule,
            kinematics,
            registry,
            true,
            ResolvePhase::Vertical,
            &mut report,
        ) {
            kinematics.on_ground = resolved.landed;
            report.landed = resolved.landed;
        }

        if kinematics.on_ground {
            kinematics.vertical_velocity = 0.0;
            if distance > 0.0 {
                let slope_move = project_onto_ground(
                    capsule,
                    registry,
                    report.desired_move,
                    self.movement.ground_probe_range,
                );
                if slope_move.length_squared() > 0.0 {
                    self.walk(
                        capsule,
                        kinematics,
                        registry,
                        slope_move,
                        ResolvePhase::GroundProjection,
                        &mut report,
                    );
                    report.slope_move = Some(slope_move);
                }
            }
        }

        report
    }

    /// Translate by `delta` in pieces no longer than `max_step`, resolving
    /// without grounding after each. Returns the number of pieces.
    fn walk(
        &self,
        capsule: &mut Capsule,
        kinematics: &mut KinematicState,
        registry: &CollisionRegistry,
        delta: Vec3,
        phase: ResolvePhase,
        report: &mut TickReport,
    ) -> u32 {
        let steps = (delta.length() / self.movement.max_step).ceil().max(1.0) as u32;
        let step = delta / steps as f32;
        for _ in 0..steps {
            capsule.translate(step);
            self.resolve_step(capsule, kinematics, registry, false, phase, report);
        }
        steps
    }

    /// Resolve, rolling the capsule back to its pre-resolve state on error.
    fn resolve_step(
        &self,
        capsule: &mut Capsule,
        kinematics: &mut KinematicState,
        registry: &CollisionRegistry,
        allow_grounding: bool,
        phase: ResolvePhase,
        report: &mut TickReport,
    ) -> Option<ResolveReport> {
        let before = *capsule;
        match self
            .resolver
            .resolve(capsule, registry, kinematics, allow_grounding)
        {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                warn!("Collision resolve ({}) failed: {}", phase.label(), e);
                capsule.copy_from(&before);
                report.failed_resolves += 1;
                None
            }
        }
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new(MovementConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision_registry::CollisionMesh;
    use bevy::math::Mat4;

    fn flat_world() -> CollisionRegistry {
        let mut registry = CollisionRegistry::default();
        registry
            .register(CollisionMesh::quad(
                "floor",
                50.0,
                Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)),
            ))
            .unwrap();
        registry
    }

    #[test]
    fn test_desired_move_follows_yaw() {
        let controller = PlayerController::default();
        let forward = PlayerInput {
            forward: true,
            ..Default::default()
        };
        let look = LookState::default();
        let m = controller.desired_move(&forward, &look, 0.5);
        assert!((m - Vec3::new(0.0, 0.0, -3.0)).length() < 1e-5, "got {:?}", m);

        let turned = LookState {
            yaw: std::f32::consts::FRAC_PI_2,
            pitch: 0.3,
        };
        let m = controller.desired_move(&forward, &turned, 0.5);
        assert!((m - Vec3::new(-3.0, 0.0, 0.0)).length() < 1e-5, "got {:?}", m);

        let strafe = PlayerInput {
            right: true,
            ..Default::default()
        };
        let m = controller.desired_move(&strafe, &look, 0.5);
        assert!((m - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_diagonal_is_normalized_and_opposites_cancel() {
        let controller = PlayerController::default();
        let look = LookState::default();
        let diagonal = PlayerInput {
            forward: true,
            left: true,
            ..Default::default()
        };
        let m = controller.desired_move(&diagonal, &look, 1.0);
        assert!((m.length() - 6.0).abs() < 1e-5);

        let both = PlayerInput {
            forward: true,
            backward: true,
            ..Default::default()
        };
        assert_eq!(controller.desired_move(&both, &look, 1.0), Vec3::ZERO);
    }

    #[test]
    fn test_look_clamps_pitch() {
        let config = LookConfig::default();
        let mut look = LookState::default();
        look.apply(
            &PlayerInput {
                yaw_delta: 100.0,
                pitch_delta: -10_000.0,
                ..Default::default()
            },
            &config,
        );
        assert!((look.yaw + 0.25).abs() < 1e-6);
        assert_eq!(look.pitch, config.max_pitch);
    }

    #[test]
    fn test_airborne_tick_applies_gravity() {
        let registry = flat_world();
        let controller = PlayerController::default();
        let mut capsule = Capsule::upright(Vec3::new(0.0, 5.0, 0.0), 1.0, 0.35);
        let mut kin = KinematicState::default();
        let dt = 1.0 / 60.0;

        let report = controller.tick(
            &mut capsule,
            &mut kin,
            &registry,
            &PlayerInput::default(),
            &LookState::default(),
            dt,
        );
        assert!(!report.landed);
        assert_eq!(report.sub_steps, 0);
        assert!((kin.vertical_velocity - (-9.8 * dt)).abs() < 1e-6);
        assert!((capsule.start.y - (5.0 - 9.8 * dt * dt)).abs() < 1e-5);
    }

    #[test]
    fn test_long_move_is_split_into_sub_steps() {
        let registry = flat_world();
        let controller = PlayerController::default();
        let mut capsule = Capsule::upright(Vec3::new(0.0, 3.0, 0.0), 1.0, 0.35);
        let mut kin = KinematicState::default();
        let input = PlayerInput {
            right: true,
            ..Default::default()
        };
        // 6 units/sec for 0.25 s is 1.5 units, six steps of 0.25.
        let report = controller.tick(&mut capsule, &mut kin, &registry, &input, &LookState::default(), 0.25);
        assert_eq!(report.sub_steps, 6);
        assert!((capsule.start.x - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_non_positive_max_step_is_clamped() {
        let registry = CollisionRegistry::default();
        let controller = PlayerController::new(MovementConfig {
            max_step: 0.0,
            floor_height: None,
            ..MovementConfig::default()
        });
        assert_eq!(controller.movement().max_step, MIN_SUB_STEP);

        let mut capsule = Capsule::upright(Vec3::new(0.0, 3.0, 0.0), 1.0, 0.35);
        let mut kin = KinematicState::default();
        let input = PlayerInput {
            right: true,
            ..Default::default()
        };
        // 0.1 units at 0.001 per step.
        let report = controller.tick(&mut capsule, &mut kin, &registry, &input, &LookState::default(), 1.0 / 60.0);
        assert!((100..=101).contains(&report.sub_steps), "got {}", report.sub_steps);
        assert!((capsule.start.x - 0.1).abs() < 1e-4);

        let negative = PlayerController::new(MovementConfig {
            max_step: -1.0,
            ..MovementConfig::default()
        });
        assert_eq!(negative.movement().max_step, MIN_SUB_STEP);
    }

    #[test]
    fn test_floor_backstop_lifts_capsule() {
        // No surfaces at all: only the floor plane keeps the player up.
        let registry = CollisionRegistry::default();
        let controller = PlayerController::default();
        let mut capsule = Capsule::upright(Vec3::new(0.0, -3.0, 0.0), 1.0, 0.35);
        let mut kin = KinematicState::falling(-5.0);

        let report = controller.tick(
            &mut capsule,
            &mut kin,
            &registry,
            &PlayerInput::default(),
            &LookState::default(),
            1.0 / 60.0,
        );
        assert!(report.floor_backstop);
        assert!((capsule.bottom() - (-1.0 + 0.001)).abs() < 1e-4);
        assert_eq!(kin.vertical_velocity, 0.0);
        // Nothing to land on, so the resolve clears the flag again.
        assert!(!kin.on_ground);
    }

    #[test]
    fn test_grounded_walk_uses_ground_projection() {
        let registry = flat_world();
        let controller = PlayerController::default();
        // Slightly sunk so the vertical resolve lands this tick.
        let mut capsule = Capsule::upright(Vec3::new(0.0, -0.66, 0.0), 1.0, 0.35);
        let mut kin = KinematicState::falling(-1.0);
        let input = PlayerInput {
            forward: true,
            ..Default::default()
        };

        let report = controller.tick(&mut capsule, &mut kin, &registry, &input, &LookState::default(), 0.1);
        assert!(report.landed);
        assert!(kin.on_ground);
        assert_eq!(kin.vertical_velocity, 0.0);
        let slope = report.slope_move.expect("Grounded movement should follow the floor");
        assert!(slope.y.abs() < 1e-5, "Flat floor keeps the move horizontal");
        assert_eq!(report.failed_resolves, 0);
    }

    #[test]
    fn test_failed_resolve_is_rolled_back() {
        let registry = flat_world();
        let controller = PlayerController::default();
        let mut capsule = Capsule::upright(Vec3::new(0.0, f32::INFINITY, 0.0), 1.0, 0.35);
        let mut kin = KinematicState::default();
        let report = controller.tick(
            &mut capsule,
            &mut kin,
            &registry,
            &PlayerInput::default(),
            &LookState::default(),
            1.0 / 60.0,
        );
        assert_eq!(report.failed_resolves, 1);
        assert!(!kin.on_ground);
    }
}
