use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use camera_pose_tracker::emitter::PoseSink;
use camera_pose_tracker::pipeline::{AcquireError, DepthImage, SensorPipeline, SensorSample};
use camera_pose_tracker::tracker::{RecenterLatch, TickOutcome, Tracker, TrackerConfig};
use camera_pose_tracker::types::{CameraPose, TrackedPose, TrackingAccuracy, TrackingMode};
use camera_pose_tracker::visualization::{VolumeView, VolumeViewFactory};
use image::DynamicImage;
use nalgebra as na;
use std::f32::consts::FRAC_PI_2;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Script {
    NoFrame,
    MissingColor,
    MissingDepth,
    Complete,
}

/// Pipeline whose per-tick behavior follows a fixed script; quality, pose
/// and accuracy are plain fields the test mutates between ticks.
struct ScriptedPipeline {
    script: Vec<Script>,
    cursor: usize,
    quality: f32,
    pose: CameraPose,
    accuracy: TrackingAccuracy,
    pause_calls: Vec<bool>,
    resets: u32,
    acquired: u32,
    released: u32,
    color: Arc<DynamicImage>,
    depth: Arc<DepthImage>,
}

impl ScriptedPipeline {
    fn new(script: Vec<Script>) -> ScriptedPipeline {
        ScriptedPipeline {
            script,
            cursor: 0,
            quality: 0.0,
            pose: CameraPose::IDENTITY,
            accuracy: TrackingAccuracy::High,
            pause_calls: Vec::new(),
            resets: 0,
            acquired: 0,
            released: 0,
            color: Arc::new(DynamicImage::new_rgb8(2, 2)),
            depth: Arc::new(DepthImage::new(2, 2)),
        }
    }

    fn sample(&self, kind: Script) -> Option<SensorSample> {
        match kind {
            Script::NoFrame => None,
            Script::MissingColor => Some(SensorSample::new(None, Some(self.depth.clone()))),
            Script::MissingDepth => Some(SensorSample::new(Some(self.color.clone()), None)),
            Script::Complete => Some(SensorSample::new(
                Some(self.color.clone()),
                Some(self.depth.clone()),
            )),
        }
    }
}

impl SensorPipeline for ScriptedPipeline {
    type Frame = Script;

    fn acquire_frame(&mut self, _blocking: bool) -> Result<Script, AcquireError> {
        let kind = self
            .script
            .get(self.cursor)
            .copied()
            .unwrap_or(Script::Complete);
        self.cursor += 1;
        if kind == Script::NoFrame {
            return Err(AcquireError::NoFrame);
        }
        self.acquired += 1;
        Ok(kind)
    }

    fn release_frame(&mut self, _frame: Script) {
        self.released += 1;
    }

    fn raw_sample(&mut self, frame: &Script) -> Option<SensorSample> {
        self.sample(*frame)
    }

    fn perception_sample(&mut self, frame: &Script) -> Option<SensorSample> {
        self.sample(*frame)
    }

    fn scene_quality(&mut self, _sample: &SensorSample) -> f32 {
        self.quality
    }

    fn camera_pose(&mut self) -> CameraPose {
        self.pose
    }

    fn tracking_accuracy(&mut self) -> TrackingAccuracy {
        self.accuracy
    }

    fn set_perception_paused(&mut self, paused: bool) {
        self.pause_calls.push(paused);
    }

    fn reset_perception(&mut self) {
        self.resets += 1;
    }
}

#[derive(Default)]
struct CollectSink {
    poses: Vec<(usize, TrackedPose)>,
}

impl PoseSink for CollectSink {
    fn send_pose(&mut self, channel: usize, pose: &TrackedPose) {
        self.poses.push((channel, *pose));
    }
}

struct CountingVolumeFactory {
    created: Rc<Cell<usize>>,
    live: Rc<Cell<usize>>,
}

struct CountedVolume {
    live: Rc<Cell<usize>>,
}

impl VolumeView for CountedVolume {}

impl Drop for CountedVolume {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

impl VolumeViewFactory for CountingVolumeFactory {
    fn create(&mut self, _title: &str) -> Box<dyn VolumeView> {
        self.created.set(self.created.get() + 1);
        self.live.set(self.live.get() + 1);
        Box::new(CountedVolume {
            live: self.live.clone(),
        })
    }
}

type TestTracker = Tracker<ScriptedPipeline, CollectSink, CountingVolumeFactory>;

fn tracker_with(script: Vec<Script>) -> (TestTracker, Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let created = Rc::new(Cell::new(0));
    let live = Rc::new(Cell::new(0));
    let factory = CountingVolumeFactory {
        created: created.clone(),
        live: live.clone(),
    };
    let tracker = Tracker::new(
        TrackerConfig::default(),
        ScriptedPipeline::new(script),
        CollectSink::default(),
        factory,
    );
    (tracker, created, live)
}

fn assert_identity_pose(pose: &TrackedPose) {
    assert_eq!(pose.translation, [0.0, 0.0, 0.0]);
    let [x, y, z, w] = pose.rotation;
    assert!(x.abs() < 1e-6 && y.abs() < 1e-6 && z.abs() < 1e-6);
    assert!((w - 1.0).abs() < 1e-6);
}

#[test]
fn test_failed_ticks_leave_state_untouched() {
    let (mut tracker, created, _live) = tracker_with(vec![
        Script::NoFrame,
        Script::MissingColor,
        Script::MissingDepth,
    ]);
    // would clear the gate if it were ever scored
    tracker.pipeline_mut().quality = 0.9;

    assert_eq!(tracker.tick(false), TickOutcome::NoFrame);
    assert_eq!(tracker.tick(false), TickOutcome::IncompleteSample);
    assert_eq!(tracker.tick(false), TickOutcome::IncompleteSample);

    assert_eq!(tracker.mode(), TrackingMode::Calibrating);
    assert_eq!(tracker.scene_quality(), 0.0);
    assert_eq!(tracker.pose(), &CameraPose::IDENTITY);
    assert!(tracker.sink().poses.is_empty());
    assert_eq!(created.get(), 0);

    let stats = tracker.stats();
    assert_eq!(stats.ticks, 3);
    assert_eq!(stats.no_frame, 1);
    assert_eq!(stats.incomplete_samples, 2);
    assert_eq!(stats.emitted, 0);
}

#[test]
fn test_quality_gate_fires_once_at_threshold() {
    let (mut tracker, created, live) = tracker_with(vec![Script::Complete; 6]);

    for (quality, expected_mode) in [
        (0.1, TrackingMode::Calibrating),
        (0.2, TrackingMode::Calibrating),
        (0.25, TrackingMode::Tracking),
    ] {
        tracker.pipeline_mut().quality = quality;
        assert_eq!(tracker.tick(false), TickOutcome::Emitted);
        assert_eq!(tracker.mode(), expected_mode);
    }
    assert_eq!(created.get(), 1);
    assert_eq!(live.get(), 1);
    // paused at construction, unpaused exactly once at the transition
    assert_eq!(tracker.pipeline().pause_calls, vec![true, false]);

    // once tracking, no quality value can re-trigger the gate
    tracker.pipeline_mut().quality = 0.0;
    tracker.tick(false);
    tracker.pipeline_mut().quality = 0.9;
    tracker.tick(false);
    assert_eq!(tracker.mode(), TrackingMode::Tracking);
    assert_eq!(created.get(), 1);

    // every valid tick emitted exactly one pose
    assert_eq!(tracker.sink().poses.len(), 5);
    // calibration ticks emit the identity pose
    assert_identity_pose(&tracker.sink().poses[0].1);
}

#[test]
fn test_tracking_reads_pose_and_accuracy() {
    let (mut tracker, _created, _live) = tracker_with(vec![Script::Complete; 2]);
    tracker.pipeline_mut().quality = 0.3;
    tracker.tick(false);
    assert_eq!(tracker.mode(), TrackingMode::Tracking);

    let rotation = na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), FRAC_PI_2).into_inner();
    let translation = na::Vector3::new(1.0, 2.0, 3.0);
    tracker.pipeline_mut().pose = CameraPose::from_parts(&rotation, &translation);
    tracker.pipeline_mut().accuracy = TrackingAccuracy::Medium;

    assert_eq!(tracker.tick(false), TickOutcome::Emitted);
    assert_eq!(tracker.tracking_accuracy(), TrackingAccuracy::Medium);

    let (channel, emitted) = tracker.sink().poses.last().copied().unwrap();
    assert_eq!(channel, 0);
    assert_eq!(emitted.translation, [1.0, 2.0, 3.0]);
    let [x, y, z, w] = emitted.rotation;
    let half = FRAC_PI_2 / 2.0;
    assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    assert!((z - half.sin()).abs() < 1e-5);
    assert!((w - half.cos()).abs() < 1e-5);
}

#[test]
fn test_recenter_while_tracking_resets_within_tick() {
    let (mut tracker, created, live) = tracker_with(vec![Script::Complete; 3]);
    tracker.pipeline_mut().quality = 0.3;
    tracker.tick(false);
    let rotation = na::Rotation3::from_axis_angle(&na::Vector3::x_axis(), 1.0).into_inner();
    tracker.pipeline_mut().pose = CameraPose::from_parts(&rotation, &na::Vector3::new(0.5, 0.0, 0.0));
    tracker.tick(false);
    assert_eq!(tracker.mode(), TrackingMode::Tracking);

    assert_eq!(tracker.tick(true), TickOutcome::Emitted);

    assert_eq!(tracker.mode(), TrackingMode::Calibrating);
    assert_eq!(tracker.scene_quality(), 0.0);
    assert_eq!(tracker.pose(), &CameraPose::IDENTITY);
    assert_eq!(live.get(), 0);
    assert_eq!(created.get(), 1);
    assert_eq!(tracker.pipeline().resets, 1);
    assert_eq!(tracker.pipeline().pause_calls.last(), Some(&true));
    assert_eq!(tracker.stats().recenters, 1);

    // the recenter tick still emits, and it emits the identity pose
    let last = tracker.sink().poses.last().copied().unwrap().1;
    assert_identity_pose(&last);
}

#[test]
fn test_recenter_while_calibrating_is_noop() {
    let (mut tracker, created, _live) = tracker_with(vec![Script::Complete; 2]);
    tracker.pipeline_mut().quality = 0.1;

    assert_eq!(tracker.tick(true), TickOutcome::Emitted);
    assert_eq!(tracker.tick(true), TickOutcome::Emitted);

    assert_eq!(tracker.mode(), TrackingMode::Calibrating);
    assert_eq!(tracker.scene_quality(), 0.1);
    assert_eq!(tracker.pose(), &CameraPose::IDENTITY);
    assert_eq!(tracker.pipeline().resets, 0);
    assert_eq!(tracker.pipeline().pause_calls, vec![true]);
    assert_eq!(created.get(), 0);
    assert_eq!(tracker.stats().recenters, 0);
}

#[test]
fn test_missing_color_while_tracking_preserves_state() {
    let (mut tracker, _created, _live) =
        tracker_with(vec![Script::Complete, Script::Complete, Script::MissingColor]);
    tracker.pipeline_mut().quality = 0.3;
    tracker.tick(false);

    let rotation = na::Rotation3::from_axis_angle(&na::Vector3::y_axis(), 0.7).into_inner();
    let pose = CameraPose::from_parts(&rotation, &na::Vector3::new(0.1, 0.2, 0.3));
    tracker.pipeline_mut().pose = pose;
    tracker.pipeline_mut().accuracy = TrackingAccuracy::Medium;
    tracker.tick(false);
    let emitted_before = tracker.sink().poses.len();

    // the pipeline now claims Low, but the failed tick must not re-read it
    tracker.pipeline_mut().accuracy = TrackingAccuracy::Low;
    assert_eq!(tracker.tick(false), TickOutcome::IncompleteSample);

    assert_eq!(tracker.sink().poses.len(), emitted_before);
    assert_eq!(tracker.tracking_accuracy(), TrackingAccuracy::Medium);
    assert_eq!(tracker.pose(), &pose);
    assert_eq!(tracker.mode(), TrackingMode::Tracking);
}

#[test]
fn test_frames_released_exactly_once() {
    let (mut tracker, _created, _live) = tracker_with(vec![
        Script::Complete,
        Script::NoFrame,
        Script::MissingColor,
        Script::Complete,
        Script::MissingDepth,
    ]);
    tracker.pipeline_mut().quality = 0.1;
    for _ in 0..5 {
        tracker.tick(false);
    }
    // every acquired frame went back, including on validation failures
    assert_eq!(tracker.pipeline().acquired, 4);
    assert_eq!(tracker.pipeline().released, 4);
}

#[test]
fn test_configured_channel_is_reported() {
    let created = Rc::new(Cell::new(0));
    let live = Rc::new(Cell::new(0));
    let config = TrackerConfig {
        channel: 3,
        ..Default::default()
    };
    let mut tracker = Tracker::new(
        config,
        ScriptedPipeline::new(vec![Script::Complete]),
        CollectSink::default(),
        CountingVolumeFactory { created, live },
    );
    tracker.tick(false);
    assert_eq!(tracker.sink().poses[0].0, 3);
}

#[test]
fn test_recenter_latch_fires_once_per_press() {
    let mut latch = RecenterLatch::default();
    let levels = [false, true, true, true, false, true];
    let fired: Vec<bool> = levels.iter().map(|&l| latch.update(l)).collect();
    assert_eq!(fired, vec![false, true, false, false, false, true]);
}
