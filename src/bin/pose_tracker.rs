use camera_pose_tracker::emitter::{LogPoseSink, PoseSink};
use camera_pose_tracker::io::{load_config, write_session_report};
use camera_pose_tracker::synthetic::{SyntheticConfig, SyntheticPipeline};
use camera_pose_tracker::tracker::{RecenterLatch, TickOutcome, Tracker, TrackerConfig};
use camera_pose_tracker::visualization::{
    NullVolumeFactory, RerunPoseSink, RerunVolumeFactory, VolumeViewFactory,
};
use clap::Parser;
use std::time::Instant;

#[derive(Parser)]
#[command(version, about, author)]
struct CptrsCli {
    /// number of sensor ticks to run
    #[arg(long, default_value = "600")]
    ticks: u64,

    /// tracker configuration JSON (defaults when omitted)
    #[arg(long)]
    config: Option<String>,

    /// rng seed for the synthetic sensor
    #[arg(long, default_value = "7")]
    seed: u64,

    /// scene confidence gained per calibration frame
    #[arg(long, default_value = "0.02")]
    quality_ramp: f32,

    /// probability of a dropped frame per tick
    #[arg(long, default_value = "0.05")]
    dropout: f32,

    /// hold the recenter signal from this tick on
    #[arg(long)]
    recenter_at: Option<u64>,

    /// write rerun recordings (.rrd) into this directory
    #[arg(long)]
    rerun_dir: Option<String>,

    /// write a session report to this path when done
    #[arg(long)]
    report: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = CptrsCli::parse();

    let tracker_config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TrackerConfig::default(),
    };
    let pipeline = SyntheticPipeline::new(SyntheticConfig {
        seed: cli.seed,
        quality_ramp: cli.quality_ramp,
        dropout: cli.dropout,
        ..Default::default()
    });

    let (sink, volume_factory): (Box<dyn PoseSink>, Box<dyn VolumeViewFactory>) =
        match &cli.rerun_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let recording = rerun::RecordingStreamBuilder::new("pose-tracker")
                    .save(format!("{}/trajectory.rrd", dir))?;
                (
                    Box::new(RerunPoseSink::new(recording)),
                    Box::new(RerunVolumeFactory::new(dir.as_str())),
                )
            }
            None => (Box::new(LogPoseSink), Box::new(NullVolumeFactory)),
        };

    let mut tracker = Tracker::new(tracker_config, pipeline, sink, volume_factory);
    let mut latch = RecenterLatch::default();

    let now = Instant::now();
    let mut emitted = 0u64;
    for tick in 0..cli.ticks {
        let level = cli.recenter_at.is_some_and(|at| tick >= at);
        if tracker.tick(latch.update(level)) == TickOutcome::Emitted {
            emitted += 1;
        }
    }
    let duration_sec = now.elapsed().as_secs_f64();

    println!("ran {} ticks in {:.6} sec", cli.ticks, duration_sec);
    println!("avg: {} sec", duration_sec / cli.ticks as f64);
    println!(
        "emitted {} poses, final mode {:?}, scene quality {:.3}",
        emitted,
        tracker.mode(),
        tracker.scene_quality()
    );

    if let Some(report) = &cli.report {
        write_session_report(report, tracker.stats(), tracker.mode())?;
    }
    Ok(())
}
