//! Blocking ring between the renderer and a device callback
//!
//! ```text
//! Render Thread                         Device Callback
//!     │                                       │
//! [transfer]──push──►(ring)──pop──►[pop_into] │
//!     │  full? wait ◄──────(condvar)──── notify
//! ```
//!
//! The renderer blocks while the ring is full; the callback wakes it every
//! time it drains samples. A short wait timeout covers a missed wakeup, and
//! bounds how long a raised stop flag goes unnoticed when the device stalls.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::debug;

use super::SampleSink;
use crate::error::SinkError;

/// Upper bound on a single wait for free space
const SPACE_WAIT: Duration = Duration::from_millis(1);

/// Signalling shared between both halves
#[derive(Debug)]
struct Backpressure {
    lock: Mutex<()>,
    space: Condvar,
    source_alive: AtomicBool,
}

/// Create a ring holding `capacity` samples
pub fn ring_sink(capacity: usize) -> (RingSink, RingSource) {
    let ring = HeapRb::<u32>::new(capacity.max(1));
    let (producer, consumer) = ring.split();
    let signal = Arc::new(Backpressure {
        lock: Mutex::new(()),
        space: Condvar::new(),
        source_alive: AtomicBool::new(true),
    });

    (
        RingSink {
            producer,
            signal: Arc::clone(&signal),
            stop: None,
        },
        RingSource { consumer, signal },
    )
}

/// Renderer side: blocks until every sample is in the ring
pub struct RingSink {
    producer: HeapProd<u32>,
    signal: Arc<Backpressure>,
    /// Renderer stop flag, set by `bind_stop`
    stop: Option<Arc<AtomicBool>>,
}

impl RingSink {
    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|stop| stop.load(Ordering::Acquire))
    }

    /// Samples currently queued for the device
    pub fn queued(&self) -> usize {
        self.producer.occupied_len()
    }

    pub fn capacity(&self) -> usize {
        self.producer.capacity().get()
    }
}

impl SampleSink for RingSink {
    fn transfer(&mut self, samples: &[u32]) -> Result<usize, SinkError> {
        let mut offset = 0;
        while offset < samples.len() {
            if !self.signal.source_alive.load(Ordering::Acquire) {
                debug!("Ring source dropped, {} samples undelivered", samples.len() - offset);
                return Err(SinkError::Disconnected);
            }

            offset += self.producer.push_slice(&samples[offset..]);

            if offset < samples.len() {
                if self.stop_requested() {
                    debug!(
                        "Stop requested on a full ring, {} samples undelivered",
                        samples.len() - offset
                    );
                    return Err(SinkError::Disconnected);
                }
                let mut guard = self.signal.lock.lock();
                self.signal.space.wait_for(&mut guard, SPACE_WAIT);
            }
        }
        Ok(samples.len())
    }

    fn bind_stop(&mut self, stop: Arc<AtomicBool>) {
        self.stop = Some(stop);
    }
}

/// Device side: drained from the output callback
pub struct RingSource {
    consumer: HeapCons<u32>,
    signal: Arc<Backpressure>,
}

impl RingSource {
    /// Pop as many samples as fit in `out` and wake the renderer
    ///
    /// Returns the number of samples written to `out`.
    pub fn pop_into(&mut self, out: &mut [u32]) -> usize {
        let popped = self.consumer.pop_slice(out);
        // notify_one() doesn't require holding the lock
        self.signal.space.notify_one();
        popped
    }

    /// Samples waiting to be played
    pub fn available(&self) -> usize {
        self.consumer.occupied_len()
    }
}

impl Drop for RingSource {
    fn drop(&mut self) {
        self.signal.source_alive.store(false, Ordering::Release);
        self.signal.space.notify_all();
    }
}
