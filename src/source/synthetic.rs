//! Synthetic event source.
//!
//! Stands in for a real event feed: a background thread periodically emits
//! batches of random instants spread over the active window.

use crate::core::window::Window;
use crate::core::zone::Zone;
use crate::source::types::{EventBatch, Generation, RawEvent};
use crate::source::{EventSource, SourceError};
use chrono::Duration as ChronoDuration;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Capacity of the batch channel. Batches beyond it are dropped.
const CHANNEL_CAPACITY: usize = 64;

/// Configuration for the synthetic generator.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Pause between two periodic batches
    pub interval: Duration,
    /// Batch size as a multiple of the window's bucket count
    pub events_per_day: u32,
    /// Fixed RNG seed for reproducible output
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            events_per_day: 2,
            seed: None,
        }
    }
}

/// Event source producing random batches for the active window.
pub struct SyntheticSource {
    config: SyntheticConfig,
    zone: Zone,
    target: Option<(Window, Generation)>,
    sender: Sender<EventBatch>,
    receiver: Receiver<EventBatch>,
    running: Arc<AtomicBool>,
    stop_signal: Option<Sender<()>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig, zone: Zone) -> Self {
        let (sender, receiver) = bounded(CHANNEL_CAPACITY);

        Self {
            config,
            zone,
            target: None,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            stop_signal: None,
            thread_handle: None,
        }
    }

    fn rng_for(&self, generation: Generation) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ generation.0),
            None => StdRng::from_entropy(),
        }
    }
}

impl EventSource for SyntheticSource {
    fn set_window(&mut self, window: Window, generation: Generation) {
        self.target = Some((window, generation));
    }

    fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }
        let (window, generation) = self.target.ok_or(SourceError::NoWindow)?;

        self.running.store(true, Ordering::SeqCst);

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let sender = self.sender.clone();
        let running = self.running.clone();
        let zone = self.zone;
        let interval = self.config.interval;
        let events_per_day = self.config.events_per_day;
        let mut rng = self.rng_for(generation);

        let handle = thread::spawn(move || {
            loop {
                let events = generate_batch(&window, &zone, events_per_day, &mut rng);
                match sender.try_send(EventBatch::new(generation, events)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::debug!(%generation, "batch channel full, dropping batch");
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }

                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    _ => break,
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        self.stop_signal = Some(stop_tx);
        self.thread_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_signal.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        self.running.store(false, Ordering::SeqCst);
    }

    fn emit_once(&mut self) -> Result<(), SourceError> {
        let (window, generation) = self.target.ok_or(SourceError::NoWindow)?;
        let mut rng = self.rng_for(generation);
        let events = generate_batch(&window, &self.zone, self.config.events_per_day, &mut rng);
        self.sender
            .try_send(EventBatch::new(generation, events))
            .map_err(|_| SourceError::ChannelFull)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn receiver(&self) -> &Receiver<EventBatch> {
        &self.receiver
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Random instants between local midnight of `window.start` and of
/// `window.end`, `bucket_count * events_per_day` of them.
pub fn generate_batch<R: Rng>(
    window: &Window,
    zone: &Zone,
    events_per_day: u32,
    rng: &mut R,
) -> Vec<RawEvent> {
    let (Some(from), Some(to)) = (zone.midnight_utc(window.start), zone.midnight_utc(window.end))
    else {
        tracing::warn!(
            start = %window.start,
            end = %window.end,
            zone = %zone,
            "window bound does not exist in zone, batch left empty"
        );
        return Vec::new();
    };
    let span_ms = (to - from).num_milliseconds().max(0);
    let count = window.bucket_count as usize * events_per_day as usize;

    (0..count)
        .map(|_| {
            let offset = rng.gen_range(0..=span_ms);
            RawEvent::new(from + ChronoDuration::milliseconds(offset))
        })
        .collect()
}
