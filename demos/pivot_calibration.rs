//! Simulated pivot calibration run
//!
//! A tracked stylus is rotated about a fixed pivot while the sequencer counts
//! down and samples; the collected poses are then solved for the tip offset.

use anyhow::Result;
use clap::Parser;
use markupmodel_calibration::{
    compute_pivot_calibration, CalibrationPhase, CalibrationSequencer, ManualScheduler,
    SequencerConfig, SequencerEvent,
};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Parser, Debug)]
#[command(name = "pivot_calibration", about = "Run a simulated pivot calibration")]
struct Args {
    /// Countdown before sampling, in seconds
    #[arg(long, default_value_t = 3)]
    startup: u32,

    /// Sampling window, in seconds
    #[arg(long, default_value_t = 5)]
    sampling: u32,

    /// Tracker poses delivered per second
    #[arg(long, default_value_t = 20)]
    rate: usize,

    /// Half-width of the uniform positional tracker noise, in mm
    #[arg(long, default_value_t = 0.2)]
    noise: f64,

    #[arg(long, default_value_t = 7)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let tip = Vector3::new(0.0, 0.0, -160.0);
    let pivot = Point3::new(35.0, -12.0, 210.0);

    let config = SequencerConfig::default()
        .with_startup_duration_sec(args.startup)
        .with_sampling_duration_sec(args.sampling);
    let mut sequencer = CalibrationSequencer::new(ManualScheduler::new(), config);
    sequencer.start(CalibrationPhase::Pivot);

    while let Some(id) = sequencer.scheduler_mut().fire_next() {
        for _ in 0..args.rate {
            let rotation = UnitQuaternion::from_euler_angles(
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-3.1..3.1),
            );
            let jitter = Vector3::new(
                rng.gen_range(-args.noise..=args.noise),
                rng.gen_range(-args.noise..=args.noise),
                rng.gen_range(-args.noise..=args.noise),
            );
            let translation = pivot.coords - rotation * tip + jitter;
            sequencer.add_sample(Isometry3::from_parts(Translation3::from(translation), rotation));
        }
        sequencer.on_timer(id);

        for event in sequencer.drain_events() {
            match event {
                SequencerEvent::Countdown { remaining, .. } => println!("Starting in {} s", remaining),
                SequencerEvent::SamplingStarted { .. } => println!("Sampling, keep pivoting"),
                SequencerEvent::SamplingStopped { samples, .. } => println!("Collected {} poses", samples),
                SequencerEvent::Completed { .. } | SequencerEvent::Cancelled { .. } => {}
            }
        }
    }

    let calibration = compute_pivot_calibration(&sequencer.take_samples())?;
    println!("Tip offset:  {:.3?}", calibration.tip_offset.as_slice());
    println!("Pivot point: {:.3?}", calibration.pivot_point.coords.as_slice());
    println!("RMS error:   {:.4} mm", calibration.rms_error);
    println!("Tip error:   {:.4} mm", (calibration.tip_offset - tip).norm());

    Ok(())
}
