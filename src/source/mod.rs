//! Event sources feeding the heatmap engine.
//!
//! A source is told the active window and generation, then emits
//! `EventBatch`es on a channel, either periodically (`start`) or as a single
//! batch (`emit_once`). Delivery order is channel order.

pub mod synthetic;
pub mod types;

use crate::core::window::Window;
use crossbeam_channel::Receiver;

pub use synthetic::{generate_batch, SyntheticConfig, SyntheticSource};
pub use types::{EventBatch, Generation, RawEvent};

/// Contract between the engine and whatever produces events.
pub trait EventSource {
    /// Declare the window (and its generation) subsequent batches are for.
    fn set_window(&mut self, window: Window, generation: Generation);

    /// Begin periodic batch emission.
    fn start(&mut self) -> Result<(), SourceError>;

    /// End periodic emission. Synchronous, and safe to call when not started.
    fn stop(&mut self);

    /// Emit exactly one batch for the current window.
    fn emit_once(&mut self) -> Result<(), SourceError>;

    fn is_running(&self) -> bool;

    /// Channel the batches are delivered on.
    fn receiver(&self) -> &Receiver<EventBatch>;
}

/// Errors that can occur while driving an event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    AlreadyRunning,
    /// No window has been declared yet
    NoWindow,
    /// The delivery channel is full or closed
    ChannelFull,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::AlreadyRunning => write!(f, "Event source is already running"),
            SourceError::NoWindow => write!(f, "Event source has no window to generate for"),
            SourceError::ChannelFull => write!(f, "Event batch channel is full"),
        }
    }
}

impl std::error::Error for SourceError {}
