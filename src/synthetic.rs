use std::f32::consts::TAU;
use std::sync::Arc;

use image::DynamicImage;
use nalgebra as na;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::pipeline::{AcquireError, DepthImage, SensorPipeline, SensorSample};
use crate::types::{CameraPose, TrackingAccuracy};

/// Shape of a scripted sensor run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub seed: u64,
    /// Scene confidence gained per scored calibration frame.
    pub quality_ramp: f32,
    /// Probability that a tick yields no frame at all.
    pub dropout: f32,
    /// Radius of the circular camera path, meters.
    pub orbit_radius: f32,
    /// Angle advanced per unpaused frame, radians.
    pub angular_step: f32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            quality_ramp: 0.05,
            dropout: 0.0,
            orbit_radius: 0.5,
            angular_step: TAU / 360.0,
        }
    }
}

pub struct SyntheticFrame {
    pub seq: u64,
}

/// Deterministic stand-in for a depth/color sensor: the camera orbits a
/// circle, scene confidence ramps as calibration frames are scored, and
/// frame dropout follows a seeded rng.
pub struct SyntheticPipeline {
    config: SyntheticConfig,
    rng: ChaCha8Rng,
    color: Arc<DynamicImage>,
    depth: Arc<DepthImage>,
    quality: f32,
    angle: f32,
    paused: bool,
    seq: u64,
    acquired: u64,
    released: u64,
}

impl SyntheticPipeline {
    pub fn new(config: SyntheticConfig) -> SyntheticPipeline {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        SyntheticPipeline {
            rng,
            color: Arc::new(DynamicImage::new_rgb8(8, 8)),
            depth: Arc::new(DepthImage::new(8, 8)),
            quality: 0.0,
            angle: 0.0,
            paused: true,
            seq: 0,
            acquired: 0,
            released: 0,
            config,
        }
    }

    pub fn acquired_frames(&self) -> u64 {
        self.acquired
    }

    pub fn released_frames(&self) -> u64 {
        self.released
    }
}

impl SensorPipeline for SyntheticPipeline {
    type Frame = SyntheticFrame;

    fn acquire_frame(&mut self, _blocking: bool) -> Result<SyntheticFrame, AcquireError> {
        if self.rng.random::<f32>() < self.config.dropout {
            return Err(AcquireError::NoFrame);
        }
        if !self.paused {
            self.angle += self.config.angular_step;
        }
        self.seq += 1;
        self.acquired += 1;
        Ok(SyntheticFrame { seq: self.seq })
    }

    fn release_frame(&mut self, _frame: SyntheticFrame) {
        self.released += 1;
    }

    fn raw_sample(&mut self, _frame: &SyntheticFrame) -> Option<SensorSample> {
        Some(SensorSample::new(
            Some(self.color.clone()),
            Some(self.depth.clone()),
        ))
    }

    fn perception_sample(&mut self, _frame: &SyntheticFrame) -> Option<SensorSample> {
        Some(SensorSample::new(
            Some(self.color.clone()),
            Some(self.depth.clone()),
        ))
    }

    fn scene_quality(&mut self, _sample: &SensorSample) -> f32 {
        self.quality = (self.quality + self.config.quality_ramp).min(1.0);
        self.quality
    }

    fn camera_pose(&mut self) -> CameraPose {
        let rotation = na::Rotation3::from_axis_angle(&na::Vector3::y_axis(), self.angle);
        let translation = na::Vector3::new(
            self.config.orbit_radius * self.angle.sin(),
            0.0,
            self.config.orbit_radius * (self.angle.cos() - 1.0),
        );
        CameraPose::from_parts(rotation.matrix(), &translation)
    }

    fn tracking_accuracy(&mut self) -> TrackingAccuracy {
        match self.quality {
            q if q >= 0.75 => TrackingAccuracy::High,
            q if q >= 0.4 => TrackingAccuracy::Medium,
            q if q > 0.0 => TrackingAccuracy::Low,
            _ => TrackingAccuracy::Failed,
        }
    }

    fn set_perception_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn reset_perception(&mut self) {
        self.quality = 0.0;
        self.angle = 0.0;
    }
}
