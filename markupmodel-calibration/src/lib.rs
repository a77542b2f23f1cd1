//! # markupmodel Calibration
//!
//! Timed acquisition of tracked tool poses for pivot and spin calibration,
//! and the least-squares pivot solve.
//!
//! The sequencer never owns a clock. It asks a [`Scheduler`] for one-shot
//! timers and is driven by the caller passing fired ids to
//! [`CalibrationSequencer::on_timer`].

pub mod scheduler;
pub mod sequencer;
pub mod pivot;

pub use scheduler::*;
pub use sequencer::*;
pub use pivot::*;
