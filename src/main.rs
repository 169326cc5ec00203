use bevy::prelude::*;
use dome_core::{load_config, DomeWorldConfig, DomeWorldPlugin};

/// Optional config file read at startup.
const CONFIG_PATH: &str = "dome.json";

fn main() {
    let config = match load_config(CONFIG_PATH) {
        Ok(config) => config,
        Err(dome_core::ConfigError::Io(_)) => DomeWorldConfig::default(),
        Err(e) => {
            eprintln!("Ignoring {}: {}", CONFIG_PATH, e);
            DomeWorldConfig::default()
        }
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Dome Walker".into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(DomeWorldPlugin::new(config))
        // Evening sky
        .insert_resource(ClearColor(Color::srgb(0.45, 0.6, 0.8)))
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(30.0, 50.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.8, 0.85, 1.0),
        brightness: 300.0,
        ..default()
    });

    info!("Controls: WASD to move, Right-click + mouse to look, F3 for collision gizmos");
}
