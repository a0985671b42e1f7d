//! Vertex wire stream
//!
//! Framing used by host tools that stream vertex lists over a serial link.
//! Every word is 32 bits, big-endian:
//!
//! ```text
//! vertex        10bb_bbbb xxxx_xxxx xxxx_yyyy yyyy_yyyy   (b: 6-bit brightness)
//! end of frame  0000_0001 0000_0000 0000_0000 0000_0000
//! ```
//!
//! A frame is sent as a sync run (four zero bytes), its vertices, then the
//! end-of-frame word. No valid word begins with a zero byte, so the decoder
//! skips zeros between words and falls back into word alignment after a
//! sync run.

use tracing::trace;

use crate::vertex::{COORD_MAX, Vertex};

/// Top two bits of a vertex word
const VERTEX_FLAG: u32 = 2;
/// End-of-frame word: publish what has been received
const END_OF_FRAME: u32 = 0x0100_0000;
/// Widest brightness the word can carry
const BRIGHT_MASK: u32 = 0x3F;
/// Zero bytes written ahead of every frame
pub const SYNC: [u8; 4] = [0; 4];

/// Something decoded from the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireEvent {
    Vertex(Vertex),
    EndFrame,
}

/// Incremental decoder; feed it bytes as they arrive
#[derive(Debug, Default)]
pub struct WireDecoder {
    word: u32,
    filled: u8,
    unknown: u64,
}

impl WireDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk of bytes
    ///
    /// Words may straddle chunk boundaries; partial words carry over.
    pub fn push<'a>(&'a mut self, bytes: &'a [u8]) -> impl Iterator<Item = WireEvent> + 'a {
        bytes.iter().filter_map(move |&byte| self.push_byte(byte))
    }

    /// Feed one byte, returning an event when it completes a word
    pub fn push_byte(&mut self, byte: u8) -> Option<WireEvent> {
        if self.filled == 0 && byte == 0 {
            // Sync run or inter-frame padding
            return None;
        }

        self.word = (self.word << 8) | u32::from(byte);
        self.filled += 1;
        if self.filled < 4 {
            return None;
        }

        let word = self.word;
        self.word = 0;
        self.filled = 0;
        self.decode(word)
    }

    fn decode(&mut self, word: u32) -> Option<WireEvent> {
        if word == END_OF_FRAME {
            return Some(WireEvent::EndFrame);
        }
        if word >> 30 == VERTEX_FLAG {
            let bright = ((word >> 24) & BRIGHT_MASK) as u8;
            let x = ((word >> 12) as u16) & COORD_MAX;
            let y = (word as u16) & COORD_MAX;
            return Some(WireEvent::Vertex(Vertex::new(x, y, bright)));
        }

        self.unknown += 1;
        trace!("Skipping unknown wire word {:#010x}", word);
        None
    }

    /// Drop any partial word
    pub fn reset(&mut self) {
        self.word = 0;
        self.filled = 0;
    }

    /// Bytes of a partial word waiting for the rest
    pub fn pending(&self) -> usize {
        self.filled as usize
    }

    /// Complete words that were neither vertices nor end-of-frame
    pub fn unknown(&self) -> u64 {
        self.unknown
    }
}

/// Frame encoder for the wire stream
#[derive(Debug, Default, Clone, Copy)]
pub struct WireEncoder;

impl WireEncoder {
    /// Encode one vertex word
    ///
    /// Brightness saturates at the 6-bit maximum.
    pub fn encode_vertex(vertex: &Vertex) -> [u8; 4] {
        let bright = u32::from(vertex.bright).min(BRIGHT_MASK);
        let word = (VERTEX_FLAG << 30)
            | (bright << 24)
            | (u32::from(vertex.x & COORD_MAX) << 12)
            | u32::from(vertex.y & COORD_MAX);
        word.to_be_bytes()
    }

    /// Sync run, every vertex, then end-of-frame
    pub fn encode_frame(vertices: &[Vertex]) -> Vec<u8> {
        let mut out = Vec::with_capacity((vertices.len() + 2) * 4);
        out.extend_from_slice(&SYNC);
        for vertex in vertices {
            out.extend_from_slice(&Self::encode_vertex(vertex));
        }
        out.extend_from_slice(&END_OF_FRAME.to_be_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Vec<Vertex> {
        vec![
            Vertex::move_to(0, 0),
            Vertex::new(4095, 0, 24),
            Vertex::new(4095, 4095, 255),
            Vertex::new(0, 4095, 1),
        ]
    }

    fn decode_all(decoder: &mut WireDecoder, bytes: &[u8]) -> Vec<WireEvent> {
        decoder.push(bytes).collect()
    }

    #[test]
    fn test_vertex_word_layout() {
        let bytes = WireEncoder::encode_vertex(&Vertex::new(0x123, 0x456, 24));
        assert_eq!(u32::from_be_bytes(bytes), 0x9812_3456);
    }

    #[test]
    fn test_encode_decode_frame() {
        let mut decoder = WireDecoder::new();
        let events = decode_all(&mut decoder, &WireEncoder::encode_frame(&frame()));

        let mut expected: Vec<WireEvent> = frame()
            .into_iter()
            .map(|v| {
                WireEvent::Vertex(Vertex {
                    bright: v.bright.min(0x3F),
                    ..v
                })
            })
            .collect();
        expected.push(WireEvent::EndFrame);
        assert_eq!(events, expected);
        assert_eq!(decoder.unknown(), 0);
    }

    #[test]
    fn test_words_split_across_chunks() {
        let bytes = WireEncoder::encode_frame(&frame());
        let mut decoder = WireDecoder::new();
        let mut events = Vec::new();
        for chunk in bytes.chunks(3) {
            events.extend(decoder.push(chunk));
        }
        assert_eq!(events.len(), 5);
        assert_eq!(events[4], WireEvent::EndFrame);
    }

    #[test]
    fn test_resync_after_garbage() {
        let mut bytes = vec![0x13, 0x37];
        bytes.extend(WireEncoder::encode_frame(&frame()));

        let mut decoder = WireDecoder::new();
        let events = decode_all(&mut decoder, &bytes);
        assert_eq!(decoder.unknown(), 1);
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], WireEvent::Vertex(Vertex::move_to(0, 0)));
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut bytes = WireEncoder::encode_frame(&frame());
        bytes.extend(WireEncoder::encode_frame(&[Vertex::move_to(7, 7)]));

        let mut decoder = WireDecoder::new();
        let ends = decoder
            .push(&bytes)
            .filter(|e| *e == WireEvent::EndFrame)
            .count();
        assert_eq!(ends, 2);
    }

    #[test]
    fn test_reset_drops_partial_word() {
        let mut decoder = WireDecoder::new();
        assert_eq!(decode_all(&mut decoder, &[0x80, 0x12]), vec![]);
        assert_eq!(decoder.pending(), 2);
        decoder.reset();
        assert_eq!(
            decode_all(&mut decoder, &[0x01, 0, 0, 0]),
            vec![WireEvent::EndFrame]
        );
    }
}
