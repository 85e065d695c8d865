use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, Luma};
use thiserror::Error;

use crate::types::{CameraPose, TrackingAccuracy};

/// 16-bit depth map, one value per pixel.
pub type DepthImage = ImageBuffer<Luma<u16>, Vec<u16>>;

/// One frame's worth of sensor data.
///
/// Buffers are shared with the pipeline, so a sample is a cheap per-tick
/// view rather than a copy. A sample missing either buffer is unusable and
/// is treated the same as a failed acquisition.
#[derive(Clone)]
pub struct SensorSample {
    pub color: Option<Arc<DynamicImage>>,
    pub depth: Option<Arc<DepthImage>>,
}

impl SensorSample {
    pub fn new(color: Option<Arc<DynamicImage>>, depth: Option<Arc<DepthImage>>) -> SensorSample {
        SensorSample { color, depth }
    }

    pub fn is_complete(&self) -> bool {
        self.color.is_some() && self.depth.is_some()
    }
}

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("no frame available from the sensor")]
    NoFrame,
    #[error("sensor pipeline failure: {0}")]
    Device(String),
}

/// The depth/color sensor pipeline with its scene-perception session.
///
/// `acquire_frame`/`release_frame` bracket one capture; every acquired
/// frame must be released exactly once before the next acquisition (use
/// [`AcquiredFrame`], which does this on drop). `raw_sample` reads the
/// plain sensor streams, `perception_sample` reads the scene-perception
/// session's view of the same frame. `scene_quality`, `camera_pose` and
/// `tracking_accuracy` are reads of session state; `set_perception_paused`
/// and `reset_perception` are the only control operations the tracker
/// issues.
pub trait SensorPipeline {
    type Frame;

    /// Blocks until a frame is available (bounded by the pipeline's own
    /// timeout policy) or the pipeline reports a hard error.
    fn acquire_frame(&mut self, blocking: bool) -> Result<Self::Frame, AcquireError>;

    fn release_frame(&mut self, frame: Self::Frame);

    fn raw_sample(&mut self, frame: &Self::Frame) -> Option<SensorSample>;

    fn perception_sample(&mut self, frame: &Self::Frame) -> Option<SensorSample>;

    /// Confidence score for the accumulated scene, 0 = untracked.
    fn scene_quality(&mut self, sample: &SensorSample) -> f32;

    fn camera_pose(&mut self) -> CameraPose;

    fn tracking_accuracy(&mut self) -> TrackingAccuracy;

    fn set_perception_paused(&mut self, paused: bool);

    fn reset_perception(&mut self);
}

/// Scoped frame handle.
///
/// Owns the acquired frame for exactly one tick and hands it back to the
/// pipeline on drop, so every exit path of a tick releases the frame
/// before the next acquisition. While the guard lives, all pipeline access
/// for the tick goes through it.
pub struct AcquiredFrame<'a, P: SensorPipeline> {
    pipeline: &'a mut P,
    frame: Option<P::Frame>,
}

impl<'a, P: SensorPipeline> AcquiredFrame<'a, P> {
    pub fn acquire(pipeline: &'a mut P, blocking: bool) -> Result<Self, AcquireError> {
        let frame = pipeline.acquire_frame(blocking)?;
        Ok(AcquiredFrame {
            pipeline,
            frame: Some(frame),
        })
    }

    pub fn raw_sample(&mut self) -> Option<SensorSample> {
        match &self.frame {
            Some(frame) => self.pipeline.raw_sample(frame),
            None => None,
        }
    }

    pub fn perception_sample(&mut self) -> Option<SensorSample> {
        match &self.frame {
            Some(frame) => self.pipeline.perception_sample(frame),
            None => None,
        }
    }

    pub fn scene_quality(&mut self, sample: &SensorSample) -> f32 {
        self.pipeline.scene_quality(sample)
    }

    pub fn camera_pose(&mut self) -> CameraPose {
        self.pipeline.camera_pose()
    }

    pub fn tracking_accuracy(&mut self) -> TrackingAccuracy {
        self.pipeline.tracking_accuracy()
    }

    pub fn set_perception_paused(&mut self, paused: bool) {
        self.pipeline.set_perception_paused(paused);
    }

    pub fn reset_perception(&mut self) {
        self.pipeline.reset_perception();
    }
}

impl<P: SensorPipeline> Drop for AcquiredFrame<'_, P> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.pipeline.release_frame(frame);
        }
    }
}
