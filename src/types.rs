use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Camera pose as a row-major 3x4 `[R|T]` matrix packed into 12 floats.
///
/// Rotation rows sit at indices 0,1,2 / 4,5,6 / 8,9,10 and the translation
/// (meters) at 3, 7, 11, so the translation column is interleaved with the
/// rotation rows. Downstream consumers rely on this exact packing, so the
/// flat layout is the canonical representation and the typed accessors
/// unpack on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose([f32; 12]);

impl CameraPose {
    /// Identity rotation, zero translation.
    pub const IDENTITY: CameraPose = CameraPose([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    ]);

    pub fn from_raw(raw: [f32; 12]) -> CameraPose {
        CameraPose(raw)
    }

    pub fn from_parts(rotation: &na::Matrix3<f32>, translation: &na::Vector3<f32>) -> CameraPose {
        let r = rotation;
        let t = translation;
        CameraPose([
            r[(0, 0)],
            r[(0, 1)],
            r[(0, 2)],
            t.x,
            r[(1, 0)],
            r[(1, 1)],
            r[(1, 2)],
            t.y,
            r[(2, 0)],
            r[(2, 1)],
            r[(2, 2)],
            t.z,
        ])
    }

    pub fn as_raw(&self) -> &[f32; 12] {
        &self.0
    }

    /// The 3x3 rotation submatrix.
    pub fn rotation(&self) -> na::Matrix3<f32> {
        let p = &self.0;
        na::Matrix3::new(p[0], p[1], p[2], p[4], p[5], p[6], p[8], p[9], p[10])
    }

    /// Translation in meters.
    pub fn translation(&self) -> na::Vector3<f32> {
        na::Vector3::new(self.0[3], self.0[7], self.0[11])
    }
}

/// Lifecycle phase of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    /// Building scene confidence; perception is paused, no real poses yet.
    Calibrating,
    /// Live tracking against the accumulated scene reference.
    Tracking,
}

impl Default for TrackingMode {
    fn default() -> Self {
        Self::Calibrating
    }
}

/// Confidence level reported by the sensor pipeline while tracking.
///
/// Advisory metadata only, never used for gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingAccuracy {
    High,
    Medium,
    Low,
    Failed,
}

impl Default for TrackingAccuracy {
    fn default() -> Self {
        Self::High
    }
}

/// Outbound pose record handed to the consumer.
///
/// Quaternion components are ordered x, y, z, w.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedPose {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
}
