//! Background execution for the render loop

use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::error::RenderError;

/// Entry point handed to a [`Spawner`]
pub type RenderTask = Box<dyn FnOnce() + Send + 'static>;

/// Creates the execution context the render loop runs on
///
/// The priority is a hint for platforms that support it; the render loop
/// itself never changes scheduling.
pub trait Spawner: Send + Sync {
    fn spawn(&self, name: &str, priority: u8, task: RenderTask)
    -> Result<JoinHandle<()>, RenderError>;
}

/// Spawns a named OS thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(
        &self,
        name: &str,
        priority: u8,
        task: RenderTask,
    ) -> Result<JoinHandle<()>, RenderError> {
        // std threads have no portable priority, the hint is only logged
        debug!("Spawning {} (priority hint {})", name, priority);
        thread::Builder::new()
            .name(name.into())
            .spawn(task)
            .map_err(RenderError::Spawn)
    }
}
