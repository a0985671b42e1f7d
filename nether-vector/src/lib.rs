//! Nether-Vector: real-time renderer for analog vector displays
//!
//! Drives an oscilloscope or CRT wired to an X/Y DAC by streaming a
//! continuous sequence of beam positions. Straight segments between
//! vertices are reconstructed with an integer Bresenham rasterizer.
//!
//! # Pipeline
//!
//! ```text
//! Producer Thread               Render Thread                   Device
//!     │                              │                             │
//! [add_vertex / line_to]             │                             │
//!     │ (back buffer, no lock)       │                             │
//! [display]──(lock: swap roles)      │                             │
//!     │                       [Snapshot front]──(lock)             │
//!     │                       [Rasterize pairs]                    │
//!     │                       [Batch samples]                      │
//!     │                       [Flush]──────(SampleSink)─────────►[DAC]
//! ```
//!
//! The renderer never holds the buffer lock while streaming, and the
//! producer never blocks on append.
//!
//! # Usage
//!
//! ```
//! use nether_vector::{CaptureSink, DisplayConfig, VectorDisplay};
//!
//! let mut display = VectorDisplay::new(DisplayConfig::default());
//! display.move_to(0, 0);
//! display.line_to(4095, 0);
//! display.line_to(4095, 4095);
//! display.display();
//!
//! let sink = CaptureSink::new();
//! display.begin(sink.clone()).unwrap();
//! display.end();
//! ```

pub mod batch;
pub mod buffer;
pub mod config;
pub mod error;
pub mod path;
pub mod raster;
pub mod render;
pub mod sink;
pub mod vertex;
pub mod wire;

pub use batch::{SampleBatcher, pack_sample, scale_coord};
pub use buffer::{BackBuffer, DoubleBuffer, VertexBuffer};
pub use config::DisplayConfig;
pub use error::{ConfigError, RenderError, SinkError};
pub use path::{PlanOptions, Segment, plan_segments};
pub use raster::{LineIter, rasterize};
pub use render::{RenderHandle, Renderer, Spawner, ThreadSpawner, VectorDisplay};
pub use sink::{
    CaptureSink, NullSink, RingSink, RingSource, SampleSink, WriterSink, ring_sink,
};
pub use vertex::{BRIGHT_ON, COORD_MAX, Point, Vertex};
pub use wire::{WireDecoder, WireEncoder, WireEvent};
