//! Sample sinks: where batched samples go
//!
//! The renderer never talks to hardware directly. It hands full batches to a
//! [`SampleSink`], which owns the device and its backpressure. A transfer
//! blocks until the device has accepted the batch.
//!
//! Sinks shipped here:
//! - [`RingSink`] - bounded ring pulled by a device callback (audio output)
//! - [`WriterSink`] - raw little-endian words to any `Write`
//! - [`CaptureSink`] - records transfers in memory
//! - [`NullSink`] - counts and discards

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use parking_lot::Mutex;

use crate::error::SinkError;
use crate::vertex::Point;

mod ring;

pub use ring::{RingSink, RingSource, ring_sink};

/// Destination for packed two-channel samples
///
/// Each word carries channel 1 in the low half and channel 2 in the high
/// half (see [`pack_sample`](crate::batch::pack_sample)).
pub trait SampleSink: Send {
    /// Transfer a batch, blocking until it is accepted
    ///
    /// Returns the number of samples transferred.
    fn transfer(&mut self, samples: &[u32]) -> Result<usize, SinkError>;

    /// Attach the renderer's stop flag
    ///
    /// A sink that can wait on its device must give up and return
    /// [`SinkError::Disconnected`] once the flag is raised, so a stop never
    /// waits on a stalled device. Sinks that never block can ignore it.
    fn bind_stop(&mut self, _stop: Arc<AtomicBool>) {}
}

impl<S: SampleSink + ?Sized> SampleSink for Box<S> {
    fn transfer(&mut self, samples: &[u32]) -> Result<usize, SinkError> {
        (**self).transfer(samples)
    }

    fn bind_stop(&mut self, stop: Arc<AtomicBool>) {
        (**self).bind_stop(stop)
    }
}

/// Decode a packed output word back into a beam position
pub fn unpack_point(sample: u32) -> Point {
    Point::new((sample & 0xFFFF) as u16 >> 4, (sample >> 16) as u16 >> 4)
}

/// Discards every sample, keeping only a count
#[derive(Debug, Default)]
pub struct NullSink {
    samples: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }
}

impl SampleSink for NullSink {
    fn transfer(&mut self, samples: &[u32]) -> Result<usize, SinkError> {
        self.samples += samples.len() as u64;
        Ok(samples.len())
    }
}

/// Records every transfer in memory
///
/// Clones share the same recording, so a test can keep one handle while the
/// renderer owns another.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    transfers: Arc<Mutex<Vec<Vec<u32>>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every transfer so far, one entry per call
    pub fn transfers(&self) -> Vec<Vec<u32>> {
        self.transfers.lock().clone()
    }

    /// All samples in transfer order
    pub fn samples(&self) -> Vec<u32> {
        self.transfers.lock().iter().flatten().copied().collect()
    }

    /// All samples decoded back to beam positions
    pub fn points(&self) -> Vec<Point> {
        self.transfers
            .lock()
            .iter()
            .flatten()
            .map(|&s| unpack_point(s))
            .collect()
    }

    pub fn sample_count(&self) -> usize {
        self.transfers.lock().iter().map(Vec::len).sum()
    }

    pub fn clear(&self) {
        self.transfers.lock().clear();
    }
}

impl SampleSink for CaptureSink {
    fn transfer(&mut self, samples: &[u32]) -> Result<usize, SinkError> {
        self.transfers.lock().push(samples.to_vec());
        Ok(samples.len())
    }
}

/// Writes samples as little-endian `u32` words
pub struct WriterSink<W> {
    writer: W,
    scratch: Vec<u8>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            scratch: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> SampleSink for WriterSink<W> {
    fn transfer(&mut self, samples: &[u32]) -> Result<usize, SinkError> {
        self.scratch.clear();
        self.scratch.reserve(samples.len() * 4);
        for sample in samples {
            self.scratch.extend_from_slice(&sample.to_le_bytes());
        }
        self.writer.write_all(&self.scratch)?;
        Ok(samples.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{pack_sample, scale_coord};

    #[test]
    fn test_unpack_point_inverts_packing() {
        let sample = pack_sample(scale_coord(4095), scale_coord(17));
        assert_eq!(unpack_point(sample), Point::new(4095, 17));
    }

    #[test]
    fn test_capture_sink_clones_share_recording() {
        let sink = CaptureSink::new();
        let mut writer = sink.clone();
        writer.transfer(&[1, 2, 3]).unwrap();
        writer.transfer(&[4]).unwrap();

        assert_eq!(sink.transfers(), vec![vec![1, 2, 3], vec![4]]);
        assert_eq!(sink.sample_count(), 4);
        sink.clear();
        assert_eq!(sink.sample_count(), 0);
    }

    #[test]
    fn test_writer_sink_little_endian() {
        let mut sink = WriterSink::new(Vec::new());
        assert_eq!(sink.transfer(&[0x0403_0201, 0xAABB_CCDD]).unwrap(), 2);
        assert_eq!(
            sink.into_inner(),
            vec![0x01, 0x02, 0x03, 0x04, 0xDD, 0xCC, 0xBB, 0xAA]
        );
    }

    #[test]
    fn test_boxed_sink_forwards() {
        let capture = CaptureSink::new();
        let mut boxed: Box<dyn SampleSink> = Box::new(capture.clone());
        boxed.transfer(&[7]).unwrap();
        assert_eq!(capture.samples(), vec![7]);
    }

    #[test]
    fn test_null_sink_counts() {
        let mut sink = NullSink::new();
        sink.transfer(&[0; 10]).unwrap();
        assert_eq!(sink.samples(), 10);
    }
}
