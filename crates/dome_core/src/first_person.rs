//! First-person input and camera for the dome world.
//!
//! Controls:
//! - W/S walk forward/backward relative to the camera yaw
//! - A/D strafe left/right
//! - Hold the right mouse button and move the mouse to look around
//!
//! Input is sampled once per frame into [`PlayerInputState`]; the simulation
//! step reads that sample for every fixed tick it runs.

use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;
use dome_physics::PlayerInput;

use crate::config::DomeWorldConfig;
use crate::world_plugin::DomeSimulation;

/// Marks the camera driven by the player simulation.
#[derive(Component)]
pub struct FirstPersonCamera;

/// Latest input sample.
#[derive(Resource, Default, Debug, Clone, Copy, Deref, DerefMut)]
pub struct PlayerInputState(pub PlayerInput);

/// Sample keyboard and mouse into [`PlayerInputState`].
pub fn gather_player_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mut input: ResMut<PlayerInputState>,
) {
    let look = if mouse_buttons.pressed(MouseButton::Right) {
        mouse_motion.delta
    } else {
        Vec2::ZERO
    };
    input.0 = PlayerInput {
        forward: keyboard.pressed(KeyCode::KeyW),
        backward: keyboard.pressed(KeyCode::KeyS),
        left: keyboard.pressed(KeyCode::KeyA),
        right: keyboard.pressed(KeyCode::KeyD),
        yaw_delta: look.x,
        pitch_delta: look.y,
    };
}

/// Feed this frame's time to the fixed-step scheduler.
pub fn advance_simulation(
    time: Res<Time>,
    input: Res<PlayerInputState>,
    mut simulation: ResMut<DomeSimulation>,
) {
    simulation.advance_frame(time.delta_secs(), &input.0);
}

/// Place the camera at the interpolated capsule top, facing the look direction.
pub fn sync_first_person_camera(
    config: Res<DomeWorldConfig>,
    simulation: Res<DomeSimulation>,
    mut camera_query: Query<&mut Transform, With<FirstPersonCamera>>,
) {
    let Ok(mut transform) = camera_query.single_mut() else {
        return;
    };
    transform.translation = simulation.camera_anchor() + Vec3::Y * config.eye_height;
    transform.rotation = simulation.look().rotation();
}

#[cfg(test)]
mod tests {
    use super::*;
    use dome_physics::SimulationConfig;

    #[test]
    fn test_keyboard_maps_to_input() {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<AccumulatedMouseMotion>()
            .init_resource::<PlayerInputState>()
            .add_systems(Update, gather_player_input);

        {
            let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keys.press(KeyCode::KeyW);
            keys.press(KeyCode::KeyD);
        }
        app.world_mut().resource_mut::<AccumulatedMouseMotion>().delta = Vec2::new(4.0, -2.0);
        app.update();

        let input = app.world().resource::<PlayerInputState>().0;
        assert!(input.forward && input.right);
        assert!(!input.backward && !input.left);
        assert_eq!(input.yaw_delta, 0.0, "Look needs the mouse button held");

        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Right);
        app.world_mut().resource_mut::<AccumulatedMouseMotion>().delta = Vec2::new(4.0, -2.0);
        app.update();
        let input = app.world().resource::<PlayerInputState>().0;
        assert_eq!(input.yaw_delta, 4.0);
        assert_eq!(input.pitch_delta, -2.0);
    }

    #[test]
    fn test_camera_follows_anchor() {
        let mut config = DomeWorldConfig::default();
        config.eye_height = 0.2;
        let mut app = App::new();
        app.insert_resource(config)
            .insert_resource(DomeSimulation::new(SimulationConfig::default()))
            .add_systems(Update, sync_first_person_camera);
        let camera = app
            .world_mut()
            .spawn((Transform::default(), FirstPersonCamera))
            .id();

        app.update();

        let transform = app.world().get::<Transform>(camera).unwrap();
        assert!((transform.translation - Vec3::new(0.0, 8.2, 6.0)).length() < 1e-5);
    }
}
