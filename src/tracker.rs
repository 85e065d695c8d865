use serde::{Deserialize, Serialize};

use crate::emitter::{self, PoseSink};
use crate::pipeline::{AcquiredFrame, SensorPipeline};
use crate::rotation;
use crate::sampler::{self, TickSample};
use crate::types::{CameraPose, TrackingAccuracy, TrackingMode};
use crate::visualization::{VolumeView, VolumeViewFactory};

/// Tunables for the tracking lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Scene confidence required before calibration completes.
    pub min_scene_quality: f32,
    /// Logical output channel reported to the pose consumer.
    pub channel: usize,
    /// Window title handed to the volume-view factory.
    pub volume_title: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_scene_quality: 0.25,
            channel: 0,
            volume_title: "Volume".to_string(),
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A valid sample was processed and one pose was emitted.
    Emitted,
    /// The sensor produced no frame; nothing was mutated.
    NoFrame,
    /// The frame was missing its color or depth buffer; nothing was mutated.
    IncompleteSample,
}

/// Counters over the life of a tracking session.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SessionStats {
    pub ticks: u64,
    pub emitted: u64,
    pub no_frame: u64,
    pub incomplete_samples: u64,
    pub recenters: u64,
    pub nonorthonormal_rotations: u64,
}

/// Turns a held recenter key level into a single request per press.
///
/// `update` returns true only on the rising edge, so a combination held
/// across several ticks fires exactly once.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecenterLatch {
    held: bool,
}

impl RecenterLatch {
    pub fn update(&mut self, level: bool) -> bool {
        let fired = level && !self.held;
        self.held = level;
        fired
    }
}

/// The tracking lifecycle state machine.
///
/// Starts in [`TrackingMode::Calibrating`] with the perception session
/// paused. Each tick acquires one frame, samples it for the current mode,
/// applies the recenter signal and the quality gate, and emits one pose
/// when the sample was valid. Calibration completes automatically once the
/// scene quality clears the configured threshold; that transition is
/// one-way until a recenter sends the machine back to calibration. Ticks
/// whose frame or sample is unusable are absorbed without touching any
/// state; sensor dropout at frame rate is expected, not an error.
///
/// The `recenter` argument to [`Tracker::tick`] is a debounced "requested
/// now" signal; drivers polling a raw key level should run it through a
/// [`RecenterLatch`] first. Asserting it while already calibrating is an
/// idempotent no-op.
pub struct Tracker<P, S, V> {
    config: TrackerConfig,
    pipeline: P,
    sink: S,
    volume_factory: V,
    mode: TrackingMode,
    scene_quality: f32,
    pose: CameraPose,
    accuracy: TrackingAccuracy,
    volume: Option<Box<dyn VolumeView>>,
    stats: SessionStats,
}

impl<P, S, V> Tracker<P, S, V>
where
    P: SensorPipeline,
    S: PoseSink,
    V: VolumeViewFactory,
{
    pub fn new(config: TrackerConfig, mut pipeline: P, sink: S, volume_factory: V) -> Self {
        // calibration runs against the raw streams; perception stays
        // paused until the quality gate clears
        pipeline.set_perception_paused(true);
        Tracker {
            config,
            pipeline,
            sink,
            volume_factory,
            mode: TrackingMode::Calibrating,
            scene_quality: 0.0,
            pose: CameraPose::IDENTITY,
            accuracy: TrackingAccuracy::default(),
            volume: None,
            stats: SessionStats::default(),
        }
    }

    /// Runs one update cycle: acquire, sample, gate, convert, emit.
    pub fn tick(&mut self, recenter: bool) -> TickOutcome {
        self.stats.ticks += 1;

        let mut frame = match AcquiredFrame::acquire(&mut self.pipeline, true) {
            Ok(frame) => frame,
            Err(err) => {
                log::debug!("frame acquisition failed: {}", err);
                self.stats.no_frame += 1;
                return TickOutcome::NoFrame;
            }
        };

        let sample = match sampler::sample_for_mode(&mut frame, self.mode) {
            Ok(sample) => sample,
            Err(err) => {
                log::debug!("dropping tick: {}", err);
                self.stats.incomplete_samples += 1;
                return TickOutcome::IncompleteSample;
            }
        };

        match sample {
            TickSample::Scene { quality } => self.scene_quality = quality,
            TickSample::Tracked { pose, accuracy } => {
                self.pose = pose;
                self.accuracy = accuracy;
            }
        }

        if recenter && self.mode == TrackingMode::Tracking {
            log::info!("recentering: tracking reference discarded, recalibrating");
            self.volume = None;
            frame.set_perception_paused(true);
            self.mode = TrackingMode::Calibrating;
            frame.reset_perception();
            self.scene_quality = 0.0;
            self.pose = CameraPose::IDENTITY;
            self.stats.recenters += 1;
        }

        if self.mode == TrackingMode::Calibrating
            && self.scene_quality >= self.config.min_scene_quality
        {
            log::info!(
                "scene quality {:.3} cleared threshold {:.3}, tracking started",
                self.scene_quality,
                self.config.min_scene_quality
            );
            self.volume = Some(self.volume_factory.create(&self.config.volume_title));
            frame.set_perception_paused(false);
            self.mode = TrackingMode::Tracking;
        }

        // hand the frame back before conversion and emission
        drop(frame);

        let rotation_matrix = self.pose.rotation();
        if !rotation::is_orthonormal(&rotation_matrix, rotation::ORTHONORMAL_TOL) {
            log::warn!("rotation submatrix is not orthonormal, emitting renormalized quaternion");
            self.stats.nonorthonormal_rotations += 1;
        }
        let quaternion = rotation::quaternion_from_matrix(&rotation_matrix);
        emitter::emit_pose(&mut self.sink, self.config.channel, &self.pose, &quaternion);
        self.stats.emitted += 1;

        TickOutcome::Emitted
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    pub fn scene_quality(&self) -> f32 {
        self.scene_quality
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn tracking_accuracy(&self) -> TrackingAccuracy {
        self.accuracy
    }

    pub fn has_volume_view(&self) -> bool {
        self.volume.is_some()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut P {
        &mut self.pipeline
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
