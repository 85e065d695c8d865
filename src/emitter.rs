use nalgebra as na;

use crate::types::{CameraPose, TrackedPose};

/// Consumer of tracked poses.
pub trait PoseSink {
    fn send_pose(&mut self, channel: usize, pose: &TrackedPose);
}

impl PoseSink for Box<dyn PoseSink> {
    fn send_pose(&mut self, channel: usize, pose: &TrackedPose) {
        self.as_mut().send_pose(channel, pose);
    }
}

/// Packages translation + rotation into the outbound record and hands it
/// to the consumer. Exactly one notification per call, no buffering.
pub fn emit_pose<S: PoseSink>(
    sink: &mut S,
    channel: usize,
    pose: &CameraPose,
    rotation: &na::UnitQuaternion<f32>,
) {
    let t = pose.translation();
    let q = rotation.coords;
    let record = TrackedPose {
        translation: [t.x, t.y, t.z],
        rotation: [q.x, q.y, q.z, q.w],
    };
    sink.send_pose(channel, &record);
}

/// Pose consumer that writes to the log facade.
pub struct LogPoseSink;

impl PoseSink for LogPoseSink {
    fn send_pose(&mut self, channel: usize, pose: &TrackedPose) {
        let [x, y, z] = pose.translation;
        let [qx, qy, qz, qw] = pose.rotation;
        log::debug!(
            "pose[{}] t=({:.3}, {:.3}, {:.3}) q=({:.4}, {:.4}, {:.4}, {:.4})",
            channel,
            x,
            y,
            z,
            qx,
            qy,
            qz,
            qw
        );
    }
}
