//! Startup countdown and sampling window for pose acquisition

use crate::scheduler::{Scheduler, TimerId};
use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing of a calibration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerConfig {
    /// Countdown before sampling starts, in ticks
    pub startup_duration_sec: u32,
    /// Length of the sampling window, in ticks
    pub sampling_duration_sec: u32,
    /// Period of one tick
    pub tick: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            startup_duration_sec: 5,
            sampling_duration_sec: 5,
            tick: Duration::from_secs(1),
        }
    }
}

impl SequencerConfig {
    pub fn with_startup_duration_sec(mut self, seconds: u32) -> Self {
        self.startup_duration_sec = seconds;
        self
    }

    pub fn with_sampling_duration_sec(mut self, seconds: u32) -> Self {
        self.sampling_duration_sec = seconds;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }
}

/// Which calibration the samples are for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationPhase {
    Pivot,
    Spin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    StartupCountdown { remaining: u32 },
    Sampling { remaining: u32 },
    Complete,
}

/// Progress notifications, collected with [`CalibrationSequencer::drain_events`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerEvent {
    Countdown { phase: CalibrationPhase, remaining: u32 },
    SamplingStarted { phase: CalibrationPhase },
    SamplingStopped { phase: CalibrationPhase, samples: usize },
    Completed { phase: CalibrationPhase },
    Cancelled { phase: CalibrationPhase },
}

/// Drives one calibration run at a time
///
/// `Idle -> StartupCountdown -> Sampling -> Complete`, one tick per
/// remaining period. Poses are accepted only while sampling.
#[derive(Debug)]
pub struct CalibrationSequencer<S: Scheduler> {
    scheduler: S,
    config: SequencerConfig,
    state: SequencerState,
    phase: CalibrationPhase,
    pending: Option<TimerId>,
    samples: Vec<Isometry3<f64>>,
    flipped: bool,
    events: Vec<SequencerEvent>,
}

impl<S: Scheduler> CalibrationSequencer<S> {
    pub fn new(scheduler: S, config: SequencerConfig) -> Self {
        Self {
            scheduler,
            config,
            state: SequencerState::Idle,
            phase: CalibrationPhase::Pivot,
            pending: None,
            samples: Vec::new(),
            flipped: false,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Poses collected by the current or last run
    pub fn samples(&self) -> &[Isometry3<f64>] {
        &self.samples
    }

    pub fn take_samples(&mut self) -> Vec<Isometry3<f64>> {
        std::mem::take(&mut self.samples)
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            SequencerState::StartupCountdown { .. } | SequencerState::Sampling { .. }
        )
    }

    /// Begin the startup countdown for `phase`
    ///
    /// Returns `false` when a run is already in progress.
    pub fn start(&mut self, phase: CalibrationPhase) -> bool {
        if self.is_running() {
            log::warn!("Cannot start {:?} calibration: {:?} run in progress", phase, self.phase);
            return false;
        }

        self.phase = phase;
        self.samples.clear();
        let remaining = self.config.startup_duration_sec;
        self.state = SequencerState::StartupCountdown { remaining };
        self.events.push(SequencerEvent::Countdown { phase, remaining });
        self.schedule_tick();
        log::info!("{:?} calibration starting in {} s", phase, remaining);
        true
    }

    /// Handle a fired timer; ids other than the pending one are ignored
    pub fn on_timer(&mut self, id: TimerId) {
        if self.pending != Some(id) {
            log::debug!("Ignoring stale timer {:?}", id);
            return;
        }
        self.pending = None;

        match self.state {
            SequencerState::StartupCountdown { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.begin_sampling();
                } else {
                    self.state = SequencerState::StartupCountdown { remaining };
                    self.events.push(SequencerEvent::Countdown { phase: self.phase, remaining });
                    self.schedule_tick();
                }
            }
            SequencerState::Sampling { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.finish_sampling();
                } else {
                    self.state = SequencerState::Sampling { remaining };
                    self.schedule_tick();
                }
            }
            SequencerState::Idle | SequencerState::Complete => {}
        }
    }

    /// Stop early
    ///
    /// Stopping while sampling keeps the collected poses and completes the
    /// run; stopping during the countdown returns to idle.
    pub fn stop(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel(id);
        }

        match self.state {
            SequencerState::Sampling { .. } => self.finish_sampling(),
            SequencerState::StartupCountdown { .. } => {
                self.state = SequencerState::Idle;
                self.events.push(SequencerEvent::Cancelled { phase: self.phase });
                log::info!("{:?} calibration cancelled", self.phase);
            }
            SequencerState::Idle | SequencerState::Complete => {}
        }
    }

    /// Record a tracked pose; returns `false` outside the sampling window
    pub fn add_sample(&mut self, pose: Isometry3<f64>) -> bool {
        if !matches!(self.state, SequencerState::Sampling { .. }) {
            return false;
        }
        self.samples.push(pose);
        true
    }

    pub fn set_startup_duration_sec(&mut self, seconds: u32) -> bool {
        if self.is_running() {
            log::warn!("Startup duration cannot change during a run");
            return false;
        }
        self.config.startup_duration_sec = seconds;
        true
    }

    pub fn set_sampling_duration_sec(&mut self, seconds: u32) -> bool {
        if self.is_running() {
            log::warn!("Sampling duration cannot change during a run");
            return false;
        }
        self.config.sampling_duration_sec = seconds;
        true
    }

    /// Toggle the spin direction
    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn drain_events(&mut self) -> Vec<SequencerEvent> {
        std::mem::take(&mut self.events)
    }

    fn schedule_tick(&mut self) {
        self.pending = Some(self.scheduler.schedule(self.config.tick));
    }

    fn begin_sampling(&mut self) {
        let remaining = self.config.sampling_duration_sec;
        self.state = SequencerState::Sampling { remaining };
        self.events.push(SequencerEvent::SamplingStarted { phase: self.phase });
        self.schedule_tick();
        log::info!("{:?} sampling for {} s", self.phase, remaining);
    }

    fn finish_sampling(&mut self) {
        let samples = self.samples.len();
        self.state = SequencerState::Complete;
        self.events.push(SequencerEvent::SamplingStopped { phase: self.phase, samples });
        self.events.push(SequencerEvent::Completed { phase: self.phase });
        log::info!("{:?} sampling finished with {} poses", self.phase, samples);
    }
}
