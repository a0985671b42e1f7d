//! Threaded vector rendering
//!
//! Decouples the producer (application code building frames) from the
//! continuously running render loop that keeps the beam moving.
//!
//! # Architecture
//!
//! ```text
//! Producer Thread              Render Thread                  Sample Sink
//!     │                              │                             │
//! [add_vertex]                       │                             │
//!     │                              │                             │
//! [display]──(lock: swap)            │                             │
//!     │                       [Snapshot]──(lock: clone front)      │
//!     │                       [Rasterize + Batch]                  │
//!     │                       [Flush]────────(transfer)──────────►[DAC]
//!     │                       [Yield]                              │
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let mut display = VectorDisplay::new(DisplayConfig::default());
//! display.begin(sink)?;
//!
//! // Each frame
//! display.move_to(100, 100);
//! display.line_to(200, 100);
//! display.display();
//! ```

mod display;
mod handle;
mod metrics;
mod spawn;
mod thread;

// Re-export public API
pub use display::VectorDisplay;
pub use handle::{RENDER_THREAD_NAME, RenderHandle};
pub use spawn::{RenderTask, Spawner, ThreadSpawner};
pub use thread::Renderer;
