//! Debug drawing of cheap colliders and the player capsule. F3 toggles.

use bevy::math::Isometry3d;
use bevy::prelude::*;

use crate::config::DomeWorldConfig;
use crate::world_plugin::DomeSimulation;

const COLLIDER_COLOR: Color = Color::srgb(0.9, 0.6, 0.1);
const CAPSULE_COLOR: Color = Color::srgb(0.2, 0.9, 0.4);

pub fn toggle_debug_gizmos(keyboard: Res<ButtonInput<KeyCode>>, mut config: ResMut<DomeWorldConfig>) {
    if keyboard.just_pressed(KeyCode::F3) {
        config.debug_gizmos = !config.debug_gizmos;
        info!("Collision gizmos {}", if config.debug_gizmos { "on" } else { "off" });
    }
}

pub fn draw_collision_gizmos(
    config: Res<DomeWorldConfig>,
    simulation: Res<DomeSimulation>,
    mut gizmos: Gizmos,
) {
    if !config.debug_gizmos {
        return;
    }

    for collider in simulation.registry().cheap_colliders() {
        gizmos.cuboid(
            Transform::from_translation(collider.aabb.center()).with_scale(collider.aabb.size()),
            COLLIDER_COLOR,
        );
    }

    let capsule = simulation.capsule();
    gizmos.sphere(Isometry3d::from_translation(capsule.start), capsule.radius, CAPSULE_COLOR);
    gizmos.sphere(Isometry3d::from_translation(capsule.end), capsule.radius, CAPSULE_COLOR);
    gizmos.line(capsule.start, capsule.end, CAPSULE_COLOR);
}
