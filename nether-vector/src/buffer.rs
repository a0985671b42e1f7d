//! Double-buffered vertex lists
//!
//! At any moment one buffer is the *front* (read by the renderer) and one is
//! the *back* (written by the producer). Publishing exchanges the roles under
//! a single mutex. The renderer only holds that mutex long enough to clone
//! the front reference, and streams from its clone afterwards.
//!
//! Because the renderer keeps streaming its clone after the lock is released,
//! the buffer handed back by a publish may still be in use. The producer
//! keeps one retired buffer for that case: if the returned buffer is still
//! shared it takes the retired one instead. The renderer holds at most one
//! snapshot, so one spare is always enough and nothing is allocated after
//! start-up.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use crate::vertex::Vertex;

/// Fixed-capacity vertex list
///
/// Appends past capacity are dropped, never grown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBuffer {
    vertices: Vec<Vertex>,
    capacity: usize,
}

impl VertexBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a vertex; returns `false` if the buffer is full and the vertex was dropped
    pub fn push(&mut self, vertex: Vertex) -> bool {
        if self.vertices.len() < self.capacity {
            self.vertices.push(vertex);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.vertices.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn last(&self) -> Option<&Vertex> {
        self.vertices.last()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Repeat the current contents for as long as a whole copy still fits
    ///
    /// Keeps short lists from underrunning the device at a fixed scan rate.
    /// Each repetition starts with a blanked move to the first vertex, unless
    /// the list already ends where it starts.
    pub fn fill_by_repetition(&mut self) {
        let n = self.vertices.len();
        if n == 0 {
            return;
        }

        let first = self.vertices[0];
        let closes_loop = self.vertices[n - 1].position() == first.position();
        let lead = if first.is_draw() && !closes_loop {
            Vertex { bright: 0, ..first }
        } else {
            first
        };

        while self.vertices.len() + n <= self.capacity {
            self.vertices.push(lead);
            self.vertices.extend_from_within(1..n);
        }
    }
}

/// The shared half of the double buffer: the front role and its lock
#[derive(Debug)]
pub struct DoubleBuffer {
    front: Mutex<Arc<VertexBuffer>>,
    capacity: usize,
}

impl DoubleBuffer {
    /// Allocate both buffers (plus the retired spare) up front
    ///
    /// Returns the shared front half and the producer's back half.
    pub fn new(capacity: usize) -> (Arc<Self>, BackBuffer) {
        let shared = Arc::new(Self {
            front: Mutex::new(Arc::new(VertexBuffer::with_capacity(capacity))),
            capacity,
        });

        let back = BackBuffer {
            shared: Arc::clone(&shared),
            current: Arc::new(VertexBuffer::with_capacity(capacity)),
            retired: Arc::new(VertexBuffer::with_capacity(capacity)),
            replay_fill: false,
            dropped: 0,
            published: 0,
        };

        (shared, back)
    }

    /// Clone the current front reference
    ///
    /// The lock is held only for the duration of the clone.
    pub fn snapshot(&self) -> Arc<VertexBuffer> {
        let front = self.front.lock();
        Arc::clone(&*front)
    }

    /// Take the buffer lock
    ///
    /// Used by the renderer to snapshot and by teardown to wait out any
    /// in-flight swap.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Arc<VertexBuffer>> {
        self.front.lock()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Producer side of the double buffer
///
/// Appends happen without taking the lock. `&mut self` makes this the only
/// writer.
#[derive(Debug)]
pub struct BackBuffer {
    shared: Arc<DoubleBuffer>,
    current: Arc<VertexBuffer>,
    retired: Arc<VertexBuffer>,
    replay_fill: bool,
    dropped: u64,
    published: u64,
}

impl BackBuffer {
    /// Enable repetition fill before each publish
    pub fn set_replay_fill(&mut self, enabled: bool) {
        self.replay_fill = enabled;
    }

    /// Append a vertex; silently dropped once the buffer is full
    pub fn append(&mut self, vertex: Vertex) -> bool {
        let accepted = Arc::make_mut(&mut self.current).push(vertex);
        if !accepted {
            self.dropped += 1;
        }
        accepted
    }

    /// Append every vertex that fits; returns how many were accepted
    pub fn extend(&mut self, vertices: &[Vertex]) -> usize {
        vertices.iter().filter(|v| self.append(**v)).count()
    }

    /// Make the back buffer visible to the renderer and start a fresh one
    pub fn publish(&mut self) {
        if self.replay_fill {
            Arc::make_mut(&mut self.current).fill_by_repetition();
        }

        {
            let mut front = self.shared.lock();
            std::mem::swap(&mut *front, &mut self.current);
        }

        if Arc::get_mut(&mut self.current).is_none() {
            // Renderer is still streaming the old front
            std::mem::swap(&mut self.current, &mut self.retired);
            trace!("Old front still in use, reclaiming retired buffer");
        }
        Arc::make_mut(&mut self.current).clear();
        self.published += 1;
    }

    /// Most recently appended vertex since the last publish
    ///
    /// # Panics
    ///
    /// Panics if nothing has been appended since the last publish.
    pub fn last_vertex(&self) -> Vertex {
        match self.current.last() {
            Some(vertex) => *vertex,
            None => panic!("last_vertex() called on an empty back buffer"),
        }
    }

    /// Like [`last_vertex`](Self::last_vertex) but returns `None` when empty
    pub fn try_last_vertex(&self) -> Option<Vertex> {
        self.current.last().copied()
    }

    /// Vertices appended since the last publish
    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.current.capacity()
    }

    pub fn as_slice(&self) -> &[Vertex] {
        self.current.as_slice()
    }

    /// Total vertices dropped because the buffer was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Number of publishes so far
    pub fn published(&self) -> u64 {
        self.published
    }

    /// The shared half this producer publishes into
    pub fn shared(&self) -> &Arc<DoubleBuffer> {
        &self.shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: u16, y: u16, bright: u8) -> Vertex {
        Vertex::new(x, y, bright)
    }

    #[test]
    fn test_publish_swaps_content_and_resets_back() {
        let (shared, mut back) = DoubleBuffer::new(16);
        back.append(v(1, 2, 0));
        back.append(v(3, 4, 255));
        back.publish();

        let front = shared.snapshot();
        assert_eq!(front.as_slice(), &[v(1, 2, 0), v(3, 4, 255)]);
        assert_eq!(back.len(), 0);
        assert!(back.try_last_vertex().is_none());
    }

    #[test]
    fn test_append_saturates_in_order() {
        let (shared, mut back) = DoubleBuffer::new(4);
        for i in 0..7 {
            back.append(v(i, i, 1));
        }
        assert_eq!(back.len(), 4);
        assert_eq!(back.dropped(), 3);
        back.publish();

        let expected: Vec<Vertex> = (0..4).map(|i| v(i, i, 1)).collect();
        assert_eq!(shared.snapshot().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_extend_reports_accepted() {
        let (_shared, mut back) = DoubleBuffer::new(3);
        let accepted = back.extend(&[v(1, 1, 0), v(2, 2, 1), v(3, 3, 1), v(4, 4, 1)]);
        assert_eq!(accepted, 3);
        assert_eq!(back.last_vertex(), v(3, 3, 1));
    }

    #[test]
    #[should_panic(expected = "empty back buffer")]
    fn test_last_vertex_on_empty_panics() {
        let (_shared, back) = DoubleBuffer::new(4);
        back.last_vertex();
    }

    #[test]
    fn test_publish_while_snapshot_held_keeps_snapshot_intact() {
        let (shared, mut back) = DoubleBuffer::new(8);
        back.append(v(10, 10, 0));
        back.append(v(20, 20, 255));
        back.publish();

        // Renderer holds the front while the producer publishes twice more
        let in_flight = shared.snapshot();

        back.append(v(1, 1, 0));
        back.publish();
        back.append(v(2, 2, 0));
        back.append(v(3, 3, 0));
        back.publish();
        back.append(v(4, 4, 0));

        assert_eq!(in_flight.as_slice(), &[v(10, 10, 0), v(20, 20, 255)]);
        assert_eq!(shared.snapshot().as_slice(), &[v(2, 2, 0), v(3, 3, 0)]);
        assert_eq!(back.as_slice(), &[v(4, 4, 0)]);
    }

    #[test]
    fn test_fill_by_repetition_inserts_move_at_boundary() {
        let mut buffer = VertexBuffer::with_capacity(7);
        buffer.push(v(0, 0, 255));
        buffer.push(v(5, 0, 255));
        buffer.fill_by_repetition();

        assert_eq!(
            buffer.as_slice(),
            &[
                v(0, 0, 255),
                v(5, 0, 255),
                v(0, 0, 0),
                v(5, 0, 255),
                v(0, 0, 0),
                v(5, 0, 255),
            ]
        );
    }

    #[test]
    fn test_fill_by_repetition_keeps_closed_loop() {
        let mut buffer = VertexBuffer::with_capacity(8);
        for vertex in [v(0, 0, 0), v(9, 0, 255), v(9, 9, 255), v(0, 0, 255)] {
            buffer.push(vertex);
        }
        buffer.fill_by_repetition();
        assert_eq!(buffer.len(), 8);
        assert_eq!(&buffer.as_slice()[4..], &buffer.as_slice()[..4]);

        let mut closed = VertexBuffer::with_capacity(6);
        for vertex in [v(3, 3, 255), v(8, 3, 255), v(3, 3, 255)] {
            closed.push(vertex);
        }
        closed.fill_by_repetition();
        assert_eq!(closed.as_slice()[3], v(3, 3, 255));
    }

    #[test]
    fn test_fill_by_repetition_empty_and_oversized() {
        let mut empty = VertexBuffer::with_capacity(4);
        empty.fill_by_repetition();
        assert!(empty.is_empty());

        let mut big = VertexBuffer::with_capacity(5);
        for i in 0..3 {
            big.push(v(i, i, 0));
        }
        big.fill_by_repetition();
        assert_eq!(big.len(), 3);
    }

    #[test]
    fn test_replay_fill_applies_on_publish() {
        let (shared, mut back) = DoubleBuffer::new(6);
        back.set_replay_fill(true);
        back.append(v(1, 1, 0));
        back.append(v(2, 2, 255));
        back.publish();
        assert_eq!(shared.snapshot().len(), 6);
        assert_eq!(back.published(), 1);
    }
}
