//! Render thread handle
//!
//! Owns the background execution context and tears it down cleanly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::spawn::Spawner;
use super::thread::Renderer;
use crate::buffer::DoubleBuffer;
use crate::error::RenderError;
use crate::sink::SampleSink;

/// Thread name given to the spawner
pub const RENDER_THREAD_NAME: &str = "vector-render";

/// Handle to a running render loop
///
/// Dropping the handle stops the loop and joins the thread.
pub struct RenderHandle {
    buffers: Arc<DoubleBuffer>,
    stop: Arc<AtomicBool>,
    cycles: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl RenderHandle {
    /// Move a renderer onto a background context
    pub fn spawn<S: SampleSink + 'static>(
        renderer: Renderer<S>,
        buffers: Arc<DoubleBuffer>,
        spawner: &dyn Spawner,
        priority: u8,
    ) -> Result<Self, RenderError> {
        let stop = Arc::clone(&renderer.stop);
        let cycles = Arc::clone(&renderer.cycles);

        let handle = spawner.spawn(
            RENDER_THREAD_NAME,
            priority,
            Box::new(move || renderer.run()),
        )?;

        Ok(Self {
            buffers,
            stop,
            cycles,
            handle: Some(handle),
        })
    }

    /// Stop the render loop and wait for the thread to exit
    ///
    /// Takes the buffer lock before raising the stop flag, so a swap or
    /// snapshot in progress always completes first. A sink waiting on a full
    /// device sees the same flag and gives up, so a stalled device cannot hold
    /// the join. Safe to call repeatedly.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        {
            let _front = self.buffers.lock();
            self.stop.store(true, Ordering::Release);
        }

        if handle.join().is_err() {
            warn!("Render thread panicked");
        } else {
            debug!("Render thread joined");
        }
    }

    /// Completed render cycles
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// Check if the render thread is still running
    pub fn is_alive(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Block until `target` cycles have completed or `timeout` elapses
    ///
    /// Returns `true` if the target was reached.
    pub fn wait_for_cycles(&self, target: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.cycles() < target {
            if Instant::now() >= deadline || !self.is_alive() {
                return self.cycles() >= target;
            }
            thread::sleep(Duration::from_micros(200));
        }
        true
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
