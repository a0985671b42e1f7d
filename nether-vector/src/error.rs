//! Error types for the vector renderer
//!
//! Capacity overflow and stop requests are not errors: overflowing points
//! are dropped and a stop waits for the buffer lock.

use std::io;

/// Failure reported by a [`SampleSink`](crate::sink::SampleSink)
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The consuming side of the sink has gone away
    #[error("sample sink disconnected")]
    Disconnected,

    /// The device refused the transfer
    #[error("output device error: {0}")]
    Device(String),

    /// Writing to the underlying stream failed
    #[error("sample stream write failed: {0}")]
    Io(#[from] io::Error),
}

/// Failure starting or running the render loop
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// `begin()` called while the renderer is already running
    #[error("renderer is already running")]
    AlreadyRunning,

    /// The background execution context could not be created
    #[error("failed to spawn render thread: {0}")]
    Spawn(#[source] io::Error),

    /// The sink failed while streaming
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Invalid display configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A field is outside its accepted range
    #[error("invalid {field} = {value}: {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}
