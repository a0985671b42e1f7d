//! Sample batching in front of the output device
//!
//! Handing samples to the device one at a time is expensive, so the renderer
//! accumulates them into a fixed batch and transfers full batches in one call.

use tracing::trace;

use crate::error::SinkError;
use crate::sink::SampleSink;
use crate::vertex::Point;

/// Widen a 12-bit coordinate into the high bits of a 16-bit channel
///
/// The low four bits stay zero. Lossless, no rounding.
pub const fn scale_coord(coord: u16) -> u16 {
    coord << 4
}

/// Pack two channel values into one output word (channel 2 in the high half)
pub const fn pack_sample(ch1: u16, ch2: u16) -> u32 {
    ((ch2 as u32) << 16) | ch1 as u32
}

/// Bounded sample buffer flushing full batches to a [`SampleSink`]
pub struct SampleBatcher<S> {
    sink: S,
    buffer: Vec<u32>,
    capacity: usize,
    flushes: u64,
}

impl<S: SampleSink> SampleBatcher<S> {
    /// Create a batcher holding at most `capacity` samples (minimum 1)
    pub fn new(sink: S, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            sink,
            buffer: Vec::with_capacity(capacity),
            capacity,
            flushes: 0,
        }
    }

    /// Append one packed sample, flushing first if the batch is full
    pub fn write(&mut self, ch1: u16, ch2: u16) -> Result<(), SinkError> {
        if self.buffer.len() >= self.capacity {
            self.flush()?;
        }
        self.buffer.push(pack_sample(ch1, ch2));
        Ok(())
    }

    /// Append a beam position, x on channel 1 and y on channel 2
    pub fn write_point(&mut self, point: Point) -> Result<(), SinkError> {
        self.write(scale_coord(point.x), scale_coord(point.y))
    }

    /// Transfer everything buffered in a single call
    ///
    /// Does nothing when the batch is empty.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let written = self.sink.transfer(&self.buffer)?;
        if written < self.buffer.len() {
            trace!(
                "Short transfer: {} of {} samples accepted",
                written,
                self.buffer.len()
            );
        }
        self.buffer.clear();
        self.flushes += 1;
        Ok(())
    }

    /// Number of samples waiting for the next flush
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of non-empty transfers performed so far
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Drop any pending samples and return the sink
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CaptureSink;

    #[test]
    fn test_pack_sample_layout() {
        assert_eq!(pack_sample(0x1234, 0xABCD), 0xABCD_1234);
        assert_eq!(pack_sample(scale_coord(0xFFF), 0), 0x0000_FFF0);
    }

    #[test]
    fn test_scale_coord_is_lossless() {
        for coord in [0u16, 1, 0x800, 0xFFF] {
            assert_eq!(scale_coord(coord) >> 4, coord);
            assert_eq!(scale_coord(coord) & 0xF, 0);
        }
    }

    #[test]
    fn test_full_batch_does_not_flush_early() {
        let sink = CaptureSink::new();
        let mut batcher = SampleBatcher::new(sink.clone(), 4);

        for i in 0..4 {
            batcher.write(i, i).unwrap();
        }
        assert_eq!(batcher.flush_count(), 0);
        assert!(sink.transfers().is_empty());

        batcher.write(9, 9).unwrap();
        assert_eq!(batcher.flush_count(), 1);
        assert_eq!(sink.transfers().len(), 1);
        assert_eq!(sink.transfers()[0].len(), 4);
        assert_eq!(batcher.len(), 1);
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let sink = CaptureSink::new();
        let mut batcher = SampleBatcher::new(sink.clone(), 8);
        batcher.flush().unwrap();
        assert_eq!(batcher.flush_count(), 0);
        assert!(sink.transfers().is_empty());
    }

    #[test]
    fn test_flush_sends_partial_batch_once() {
        let sink = CaptureSink::new();
        let mut batcher = SampleBatcher::new(sink.clone(), 8);
        batcher.write_point(Point::new(1, 2)).unwrap();
        batcher.write_point(Point::new(3, 4)).unwrap();
        batcher.flush().unwrap();
        batcher.flush().unwrap();

        assert_eq!(sink.transfers().len(), 1);
        assert_eq!(sink.points(), vec![Point::new(1, 2), Point::new(3, 4)]);
        assert!(batcher.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let batcher = SampleBatcher::new(CaptureSink::new(), 0);
        assert_eq!(batcher.capacity(), 1);
    }
}
