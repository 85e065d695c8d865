use thiserror::Error;

use crate::pipeline::{AcquiredFrame, SensorPipeline};
use crate::types::{CameraPose, TrackingAccuracy, TrackingMode};

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("sample is missing its color or depth buffer")]
    Incomplete,
}

/// What one tick observed, depending on the lifecycle mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickSample {
    /// Calibration phase: confidence score of the accumulated scene.
    Scene { quality: f32 },
    /// Live tracking: pose and advisory accuracy read from the session.
    Tracked {
        pose: CameraPose,
        accuracy: TrackingAccuracy,
    },
}

/// Extracts the sample a tick needs for the given mode.
///
/// Calibrating reads the raw sensor streams and scores the scene; Tracking
/// reads the perception session's sample, pose and accuracy. Both validate
/// that color and depth are present. Issues no session control calls.
pub fn sample_for_mode<P: SensorPipeline>(
    frame: &mut AcquiredFrame<'_, P>,
    mode: TrackingMode,
) -> Result<TickSample, SampleError> {
    match mode {
        TrackingMode::Calibrating => {
            let sample = frame.raw_sample().ok_or(SampleError::Incomplete)?;
            if !sample.is_complete() {
                return Err(SampleError::Incomplete);
            }
            let quality = frame.scene_quality(&sample);
            Ok(TickSample::Scene { quality })
        }
        TrackingMode::Tracking => {
            let sample = frame.perception_sample().ok_or(SampleError::Incomplete)?;
            if !sample.is_complete() {
                return Err(SampleError::Incomplete);
            }
            Ok(TickSample::Tracked {
                pose: frame.camera_pose(),
                accuracy: frame.tracking_accuracy(),
            })
        }
    }
}
