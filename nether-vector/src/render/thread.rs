//! The render loop
//!
//! Runs forever on its own thread: snapshot the front buffer, stream every
//! vertex pair through the rasterizer and batcher, flush, yield.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, trace};

use super::metrics::RenderMetrics;
use crate::batch::SampleBatcher;
use crate::buffer::{DoubleBuffer, VertexBuffer};
use crate::config::DisplayConfig;
use crate::error::SinkError;
use crate::raster::rasterize;
use crate::sink::SampleSink;
use crate::vertex::Point;

/// Back-off when there is nothing to draw
const IDLE_WAIT: Duration = Duration::from_millis(1);

/// Consumer side of the pipeline
///
/// Can be driven synchronously with [`run_cycle`](Self::run_cycle), or moved
/// onto a background thread by [`RenderHandle::spawn`](super::RenderHandle::spawn).
pub struct Renderer<S> {
    buffers: Arc<DoubleBuffer>,
    batcher: SampleBatcher<S>,
    /// Where the beam was left by the previous vertex, carried across cycles
    beam: Point,
    yield_interval: Duration,
    pub(super) stop: Arc<AtomicBool>,
    pub(super) cycles: Arc<AtomicU64>,
    metrics: RenderMetrics,
}

impl<S: SampleSink> Renderer<S> {
    pub fn new(buffers: Arc<DoubleBuffer>, mut sink: S, config: &DisplayConfig) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        sink.bind_stop(Arc::clone(&stop));

        Self {
            buffers,
            batcher: SampleBatcher::new(sink, config.batch_size),
            beam: Point::ORIGIN,
            yield_interval: Duration::from_micros(config.yield_interval_us),
            stop,
            cycles: Arc::new(AtomicU64::new(0)),
            metrics: RenderMetrics::new(),
        }
    }

    /// Current beam position
    pub fn beam(&self) -> Point {
        self.beam
    }

    /// Render the current front buffer once
    ///
    /// Returns the number of samples written.
    pub fn run_cycle(&mut self) -> Result<usize, SinkError> {
        let frame = self.buffers.snapshot();
        let samples = self.stream(&frame)?;
        self.cycles.fetch_add(1, Ordering::Release);
        Ok(samples)
    }

    pub fn sink(&self) -> &S {
        self.batcher.sink()
    }

    /// Total batches handed to the sink
    pub fn flush_count(&self) -> u64 {
        self.batcher.flush_count()
    }

    pub fn into_sink(self) -> S {
        self.batcher.into_sink()
    }

    /// Stream one frame and flush whatever is left in the batch
    fn stream(&mut self, frame: &VertexBuffer) -> Result<usize, SinkError> {
        let start = Instant::now();
        let mut samples = 0;

        for vertex in frame.as_slice() {
            if self.stop.load(Ordering::Relaxed) {
                trace!("Stop requested mid-cycle");
                break;
            }
            let target = vertex.position();
            for point in rasterize(self.beam, target, vertex.is_draw()) {
                self.batcher.write_point(point)?;
                samples += 1;
            }
            self.beam = target;
        }

        // Nothing may linger in the batch past the end of a cycle
        self.batcher.flush()?;

        self.metrics.record_cycle(frame.len(), samples, start.elapsed());
        Ok(samples)
    }

    /// Main thread loop
    ///
    /// The stop flag is read under the buffer lock, so teardown can never
    /// interleave with a snapshot.
    pub(super) fn run(mut self) {
        debug!("Render thread started");

        loop {
            let frame = {
                let front = self.buffers.lock();
                if self.stop.load(Ordering::Acquire) {
                    break;
                }
                Arc::clone(&*front)
            };

            if let Err(e) = self.stream(&frame) {
                // A blocked sink gives up on stop; that is not a device fault
                if self.stop.load(Ordering::Acquire) {
                    debug!("Transfer abandoned on stop: {}", e);
                } else {
                    error!("Render loop stopped, sample sink failed: {}", e);
                }
                break;
            }
            let idle = frame.is_empty();
            drop(frame);

            self.cycles.fetch_add(1, Ordering::Release);
            self.metrics.maybe_log(self.batcher.flush_count());

            if idle {
                thread::sleep(IDLE_WAIT);
            } else if self.yield_interval.is_zero() {
                thread::yield_now();
            } else {
                thread::sleep(self.yield_interval);
            }
        }

        debug!("Render thread finished");
    }
}
