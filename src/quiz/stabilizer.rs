//! Turns a jittery per-frame finger count into one confirmed selection.
//!
//! A count has to stay unchanged for the confirmation threshold before it is
//! accepted. Hold time advances by the fixed tick interval on every processed
//! tick, not by wall clock, so a slow frame cannot make a hold confirm early.
//! After a confirmation the stabilizer stays locked until the quiz unlocks it
//! for the next question.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::quiz::config::StabilizerConfig;
use crate::quiz::error::ConfigError;
use crate::quiz::fingers::{FingerCounter, MAX_FINGER_COUNT};
use crate::quiz::source::LandmarkSource;
use crate::quiz::ticker::{schedule_repeating, RepeatHandle, Tick};

/// What one processed reading did to the stabilizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// A selection was already confirmed, readings are ignored until unlock.
    Locked,
    /// No hand, or a count that maps to no option.
    NoSelection,
    Holding { count: u8, hold: Duration },
    Confirmed { option_index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StabilizerState {
    stable_count: Option<u8>,
    hold: Duration,
    locked: bool,
}

impl StabilizerState {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn stable_count(&self) -> Option<u8> {
        self.stable_count
    }

    #[cfg(test)]
    pub fn hold(&self) -> Duration {
        self.hold
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Feeds one classified reading. `None` means nothing usable was seen.
    pub fn observe(&mut self, reading: Option<u8>, config: &StabilizerConfig) -> Observation {
        if self.locked {
            return Observation::Locked;
        }

        let count = match reading {
            Some(count) if (1..=MAX_FINGER_COUNT).contains(&count) => count,
            _ => {
                self.stable_count = None;
                self.hold = Duration::ZERO;
                return Observation::NoSelection;
            }
        };

        if self.stable_count != Some(count) {
            self.stable_count = Some(count);
            self.hold = Duration::ZERO;
            return Observation::Holding {
                count,
                hold: self.hold,
            };
        }

        self.hold += config.tick_interval;
        if self.hold >= config.confirmation_threshold {
            self.locked = true;
            return Observation::Confirmed {
                option_index: usize::from(count - 1),
            };
        }

        Observation::Holding {
            count,
            hold: self.hold,
        }
    }

    pub fn unlock(&mut self) {
        self.locked = false;
        self.hold = Duration::ZERO;
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }
}

/// Live feedback for the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureStatus {
    /// Raw classified count, 0 when no hand was seen.
    pub finger_count: u8,
    /// Option the held count points at, if any.
    pub selected_option: Option<usize>,
    /// Hold time as a fraction of the confirmation threshold, in `[0, 1]`.
    pub progress: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StabilizerEvent {
    Status(GestureStatus),
    Confirmed { option_index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Unlock,
    Lock,
}

/// Owns the [`StabilizerState`]; every mutation happens inside [`Tick::tick`].
struct SamplingWorker<S> {
    source: Arc<S>,
    counter: FingerCounter,
    config: StabilizerConfig,
    state: StabilizerState,
    unlocked_ticks: u64,
    commands: UnboundedReceiver<Command>,
    events: UnboundedSender<StabilizerEvent>,
}

/// Raw count for display plus the reading fed to the state. Frame-level
/// failures read as nothing seen.
async fn classify<S: LandmarkSource>(source: &S, counter: &FingerCounter) -> (u8, Option<u8>) {
    let hands = match source.capture().await {
        Ok(hands) => hands,
        Err(e) => {
            debug!("Skipping frame: {e}");
            return (0, None);
        }
    };

    let Some(hand) = hands.first() else {
        return (0, None);
    };

    match counter.count(hand) {
        Ok(count) => (count, Some(count)),
        Err(e) => {
            debug!("Skipping frame: {e}");
            (0, None)
        }
    }
}

impl<S> SamplingWorker<S> {
    fn status(&self, finger_count: u8, observation: Observation) -> StabilizerEvent {
        let threshold = self.config.confirmation_threshold.as_secs_f32();
        let (selected_option, progress) = match observation {
            Observation::Holding { count, hold } => (
                Some(usize::from(count - 1)),
                (hold.as_secs_f32() / threshold).min(1.0),
            ),
            _ => (None, 0.0),
        };

        StabilizerEvent::Status(GestureStatus {
            finger_count,
            selected_option,
            progress,
        })
    }
}

impl<S: LandmarkSource> Tick for SamplingWorker<S> {
    async fn tick(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Unlock => self.state.unlock(),
                Command::Lock => self.state.lock(),
            }
        }

        if self.state.is_locked() {
            return;
        }

        self.unlocked_ticks += 1;
        if self.unlocked_ticks % u64::from(self.config.frame_stride) != 0 {
            return;
        }

        let (finger_count, reading) = classify(&*self.source, &self.counter).await;
        let event = match self.state.observe(reading, &self.config) {
            Observation::Confirmed { option_index } => {
                info!("Confirmed option {option_index} after a steady hold");
                StabilizerEvent::Confirmed { option_index }
            }
            observation => self.status(finger_count, observation),
        };

        // The receiver is gone once the session is over, nothing left to tell
        let _ = self.events.send(event);
    }
}

struct Running {
    handle: RepeatHandle,
    commands: UnboundedSender<Command>,
}

pub struct GestureStabilizer<S> {
    source: Arc<S>,
    counter: FingerCounter,
    config: StabilizerConfig,
    running: Option<Running>,
}

impl<S: LandmarkSource> GestureStabilizer<S> {
    pub fn new(
        source: Arc<S>,
        counter: FingerCounter,
        config: StabilizerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            source,
            counter,
            config,
            running: None,
        })
    }

    /// Starts sampling from a fresh, unlocked state.
    ///
    /// Each call hands out a new event stream; a previous run is stopped first
    /// and its stream closes.
    pub fn start(&mut self) -> UnboundedReceiver<StabilizerEvent> {
        self.stop();

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let worker = SamplingWorker {
            source: self.source.clone(),
            counter: self.counter,
            config: self.config,
            state: StabilizerState::new(),
            unlocked_ticks: 0,
            commands: commands_rx,
            events: events_tx,
        };

        info!(
            "Sampling hands every {:?}, confirming after {:?}",
            self.config.tick_interval, self.config.confirmation_threshold
        );
        self.running = Some(Running {
            handle: schedule_repeating(self.config.tick_interval, worker),
            commands: commands_tx,
        });

        events_rx
    }

    /// Cancels sampling. A capture still in flight is dropped with its result.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.handle.cancel();
            info!("Stopped sampling hands");
        }
    }

    /// Re-arms confirmation for the next question.
    pub fn unlock(&self) {
        self.send(Command::Unlock);
    }

    pub fn lock(&self) {
        self.send(Command::Lock);
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    fn send(&self, command: Command) {
        if let Some(running) = &self.running {
            // Fails only when the sampling task is already gone
            let _ = running.commands.send(command);
        }
    }
}
