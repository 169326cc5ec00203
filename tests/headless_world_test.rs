use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use dome_core::{DomeFloor, DomeSimulation, DomeSimulationPlugin, DomeWorldConfig};

fn headless_app(config: DomeWorldConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(DomeSimulationPlugin { config })
        // Hold the clock until the collision meshes have arrived
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
    app
}

/// Run frames until the async builds have all been registered.
fn wait_for_surfaces(app: &mut App, expected: usize) {
    for _ in 0..500 {
        app.update();
        if app.world().resource::<DomeSimulation>().registry().len() == expected {
            return;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    panic!(
        "Only {} of {} collision surfaces registered",
        app.world().resource::<DomeSimulation>().registry().len(),
        expected
    );
}

fn small_world() -> DomeWorldConfig {
    let mut config = DomeWorldConfig::default();
    config.obstacles.count = 4;
    // Keep props away from the spawn point
    config.obstacles.inner_radius = 20.0;
    config
}

#[test]
fn test_player_lands_on_dome_floor() {
    let config = small_world();
    let mut app = headless_app(config.clone());
    app.add_plugins(bevy::log::LogPlugin {
        filter: "dome_core=info,dome_physics=info".into(),
        level: bevy::log::Level::INFO,
        ..default()
    });

    wait_for_surfaces(&mut app, 1 + config.obstacles.count as usize);
    {
        let simulation = app.world().resource::<DomeSimulation>();
        assert_eq!(simulation.registry().cheap_colliders().len(), 5);
        info!(
            "Collision ready, player at {:?}",
            simulation.capsule().lower_endpoint()
        );
    }

    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
        1.0 / 60.0,
    )));
    for _ in 0..240 {
        app.update();
    }

    let floor = DomeFloor::new(config.floor.clone());
    let simulation = app.world().resource::<DomeSimulation>();
    let lower = simulation.capsule().lower_endpoint();
    let expected =
        floor.height_at(Vec2::new(lower.x, lower.z).length()) + config.simulation.spawn.radius;
    info!("Player rests at {:?}, floor + radius = {}", lower, expected);

    assert!(
        (lower.y - expected).abs() < 0.02,
        "Player should rest on the dome floor: y = {}, expected {}",
        lower.y,
        expected
    );
    assert!(simulation.scheduler().total_ticks() > 200);
    assert!(
        (lower - Vec3::new(0.0, lower.y, 6.0)).length() < 0.1,
        "Idle player should not drift horizontally"
    );
}

#[test]
fn test_clock_held_keeps_player_at_spawn() {
    let config = small_world();
    let mut app = headless_app(config.clone());

    wait_for_surfaces(&mut app, 1 + config.obstacles.count as usize);
    for _ in 0..10 {
        app.update();
    }

    let simulation = app.world().resource::<DomeSimulation>();
    assert_eq!(simulation.scheduler().total_ticks(), 0);
    assert_eq!(
        simulation.capsule().lower_endpoint(),
        config.simulation.spawn.position()
    );
}
