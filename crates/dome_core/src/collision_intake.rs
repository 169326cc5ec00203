//! Asynchronous intake of collision geometry.
//!
//! Asset loading builds [`CollisionMesh`]es off the main thread and sends them
//! through a channel. Once per frame [`drain_collision_meshes`] registers
//! everything that arrived and, if anything did, rebuilds the cheap colliders.
//! Registration therefore always happens on the frame thread, never while a
//! tick is resolving.

use async_channel::{Receiver, Sender, TrySendError};
use bevy::prelude::*;
use bevy::tasks::AsyncComputeTaskPool;
use dome_physics::CollisionMesh;

use crate::world_plugin::DomeSimulation;

/// Sending half. Clone freely into loader tasks.
#[derive(Resource, Clone)]
pub struct CollisionMeshSender(Sender<CollisionMesh>);

/// Receiving half, drained by [`drain_collision_meshes`].
#[derive(Resource)]
pub struct CollisionMeshReceiver(Receiver<CollisionMesh>);

/// Create a connected sender/receiver pair.
pub fn collision_channel() -> (CollisionMeshSender, CollisionMeshReceiver) {
    let (tx, rx) = async_channel::unbounded();
    (CollisionMeshSender(tx), CollisionMeshReceiver(rx))
}

impl CollisionMeshSender {
    /// Queue a finished mesh. Returns `false` if the receiver is gone.
    pub fn send(&self, mesh: CollisionMesh) -> bool {
        match self.0.try_send(mesh) {
            Ok(()) => true,
            Err(TrySendError::Full(mesh)) | Err(TrySendError::Closed(mesh)) => {
                warn!("Collision mesh '{}' dropped: intake channel closed", mesh.name);
                false
            }
        }
    }

    /// Build a mesh on the async compute pool and queue it when done.
    pub fn spawn_build<F>(&self, build: F)
    where
        F: FnOnce() -> CollisionMesh + Send + 'static,
    {
        let tx = self.0.clone();
        AsyncComputeTaskPool::get()
            .spawn(async move {
                let mesh = build();
                if let Err(e) = tx.send(mesh).await {
                    warn!("Collision mesh '{}' dropped: intake channel closed", e.0.name);
                }
            })
            .detach();
    }
}

impl CollisionMeshReceiver {
    /// Meshes waiting to be registered.
    pub fn pending(&self) -> usize {
        self.0.len()
    }
}

/// Register every mesh that arrived since the last frame.
pub fn drain_collision_meshes(
    receiver: Res<CollisionMeshReceiver>,
    mut simulation: ResMut<DomeSimulation>,
) {
    let mut registered = 0;
    while let Ok(mesh) = receiver.0.try_recv() {
        let name = mesh.name.clone();
        match simulation.register_surface(mesh) {
            Ok(_) => registered += 1,
            Err(e) => warn!("Rejected collision mesh '{}': {}", name, e),
        }
    }
    if registered > 0 {
        simulation.registry_mut().rebuild_cheap_colliders();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Mat4;
    use dome_physics::SimulationConfig;

    fn intake_app() -> (App, CollisionMeshSender) {
        let (sender, receiver) = collision_channel();
        let mut app = App::new();
        app.insert_resource(receiver)
            .insert_resource(DomeSimulation::new(SimulationConfig::default()))
            .add_systems(Update, drain_collision_meshes);
        (app, sender)
    }

    #[test]
    fn test_drain_registers_queued_meshes() {
        let (mut app, sender) = intake_app();
        assert!(sender.send(CollisionMesh::quad("a", 1.0, Mat4::IDENTITY)));
        assert!(sender.send(CollisionMesh::cuboid("b", Vec3::ONE, Mat4::IDENTITY)));

        app.update();

        let sim = app.world().resource::<DomeSimulation>();
        assert_eq!(sim.registry().len(), 2);
        assert_eq!(sim.registry().cheap_colliders().len(), 2);
        assert_eq!(app.world().resource::<CollisionMeshReceiver>().pending(), 0);
    }

    #[test]
    fn test_bad_mesh_is_skipped() {
        let (mut app, sender) = intake_app();
        sender.send(CollisionMesh::new(
            "broken",
            vec![Vec3::ZERO],
            vec![0, 1, 2],
            Mat4::IDENTITY,
        ));
        sender.send(CollisionMesh::quad("good", 1.0, Mat4::IDENTITY));

        app.update();

        let sim = app.world().resource::<DomeSimulation>();
        assert_eq!(sim.registry().len(), 1);
        assert_eq!(sim.registry().surfaces()[0].name(), "good");
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (sender, receiver) = collision_channel();
        drop(receiver);
        assert!(!sender.send(CollisionMesh::quad("late", 1.0, Mat4::IDENTITY)));
    }
}
