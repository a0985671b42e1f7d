//! Application-facing vector display
//!
//! Wraps the producer half of the double buffer and the render thread
//! lifecycle behind one type.

use std::sync::Arc;

use tracing::{debug, info};

use super::handle::RenderHandle;
use super::spawn::{Spawner, ThreadSpawner};
use super::thread::Renderer;
use crate::buffer::{BackBuffer, DoubleBuffer};
use crate::config::DisplayConfig;
use crate::error::RenderError;
use crate::sink::SampleSink;
use crate::vertex::{BRIGHT_ON, Vertex};

/// A vector display: build a frame, publish it, repeat
///
/// Appends go to the back buffer and are invisible to the renderer until
/// [`display`](Self::display) is called. The renderer keeps redrawing the
/// last published frame until the next one arrives.
pub struct VectorDisplay {
    config: DisplayConfig,
    back: BackBuffer,
    buffers: Arc<DoubleBuffer>,
    spawner: Box<dyn Spawner>,
    renderer: Option<RenderHandle>,
}

impl VectorDisplay {
    /// Create a display rendering on an OS thread
    pub fn new(config: DisplayConfig) -> Self {
        Self::with_spawner(config, ThreadSpawner)
    }

    /// Create a display with a custom background execution context
    pub fn with_spawner(config: DisplayConfig, spawner: impl Spawner + 'static) -> Self {
        let (buffers, mut back) = DoubleBuffer::new(config.max_points);
        back.set_replay_fill(config.replay_fill);
        Self {
            config,
            back,
            buffers,
            spawner: Box::new(spawner),
            renderer: None,
        }
    }

    /// Start streaming to `sink` on a background context
    pub fn begin<S: SampleSink + 'static>(&mut self, sink: S) -> Result<(), RenderError> {
        if self.is_running() {
            return Err(RenderError::AlreadyRunning);
        }

        let renderer = Renderer::new(Arc::clone(&self.buffers), sink, &self.config);
        let handle = RenderHandle::spawn(
            renderer,
            Arc::clone(&self.buffers),
            self.spawner.as_ref(),
            self.config.task_priority,
        )?;
        self.renderer = Some(handle);

        info!(
            "Vector display started ({} points, {} samples per batch)",
            self.config.max_points, self.config.batch_size
        );
        Ok(())
    }

    /// Stop the renderer; the sink is released with the thread
    pub fn end(&mut self) {
        if let Some(mut handle) = self.renderer.take() {
            handle.stop();
            debug!("Vector display stopped after {} cycles", handle.cycles());
        }
    }

    pub fn is_running(&self) -> bool {
        self.renderer.as_ref().is_some_and(RenderHandle::is_alive)
    }

    /// Append a vertex to the back buffer
    pub fn add_vertex(&mut self, vertex: Vertex) {
        self.back.append(vertex);
    }

    /// Append a vertex from its parts
    pub fn add_point(&mut self, x: u16, y: u16, bright: u8) {
        self.add_vertex(Vertex::new(x, y, bright));
    }

    /// Append every vertex in order
    pub fn add_vertices(&mut self, vertices: &[Vertex]) {
        self.back.extend(vertices);
    }

    /// Move to position (shorthand for `add_point(x, y, 0)`)
    pub fn move_to(&mut self, x: u16, y: u16) {
        self.add_point(x, y, 0);
    }

    /// Draw line to position (shorthand for `add_point(x, y, 255)`)
    pub fn line_to(&mut self, x: u16, y: u16) {
        self.add_point(x, y, BRIGHT_ON);
    }

    /// Last vertex appended since the previous [`display`](Self::display)
    ///
    /// # Panics
    ///
    /// Panics if nothing has been appended since then.
    pub fn last_vertex(&self) -> Vertex {
        self.back.last_vertex()
    }

    /// Publish the back buffer and start a new, empty one
    pub fn display(&mut self) {
        self.back.publish();
    }

    /// Vertices appended since the last publish
    pub fn pending(&self) -> usize {
        self.back.len()
    }

    pub fn capacity(&self) -> usize {
        self.back.capacity()
    }

    /// Vertices dropped because the back buffer was full
    pub fn dropped(&self) -> u64 {
        self.back.dropped()
    }

    /// Completed render cycles of the current renderer
    pub fn cycles(&self) -> u64 {
        self.renderer.as_ref().map_or(0, RenderHandle::cycles)
    }

    pub fn renderer(&self) -> Option<&RenderHandle> {
        self.renderer.as_ref()
    }

    pub fn buffers(&self) -> &Arc<DoubleBuffer> {
        &self.buffers
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }
}

impl Drop for VectorDisplay {
    fn drop(&mut self) {
        // Renderer must be gone before the buffers are released
        self.end();
    }
}
