use std::path::PathBuf;

use rerun::RecordingStream;

use crate::emitter::PoseSink;
use crate::types::TrackedPose;

/// Opaque on-screen view of the reconstruction volume.
///
/// The tracker only creates and drops these; dropping tears the view down.
pub trait VolumeView {}

/// Creates volume views by window title.
pub trait VolumeViewFactory {
    fn create(&mut self, title: &str) -> Box<dyn VolumeView>;
}

impl VolumeViewFactory for Box<dyn VolumeViewFactory> {
    fn create(&mut self, title: &str) -> Box<dyn VolumeView> {
        self.as_mut().create(title)
    }
}

/// Headless stand-in for environments without a viewer.
pub struct NullVolumeFactory;

struct NullVolume;

impl VolumeView for NullVolume {}

impl VolumeViewFactory for NullVolumeFactory {
    fn create(&mut self, _title: &str) -> Box<dyn VolumeView> {
        Box::new(NullVolume)
    }
}

/// Volume views backed by rerun recordings, one `.rrd` file per view,
/// named by title.
pub struct RerunVolumeFactory {
    output_dir: PathBuf,
}

impl RerunVolumeFactory {
    pub fn new(output_dir: impl Into<PathBuf>) -> RerunVolumeFactory {
        RerunVolumeFactory {
            output_dir: output_dir.into(),
        }
    }
}

struct RerunVolume {
    _recording: RecordingStream,
}

impl VolumeView for RerunVolume {}

impl VolumeViewFactory for RerunVolumeFactory {
    fn create(&mut self, title: &str) -> Box<dyn VolumeView> {
        let path = self.output_dir.join(format!("{}.rrd", title));
        match rerun::RecordingStreamBuilder::new(title.to_string()).save(&path) {
            Ok(recording) => Box::new(RerunVolume {
                _recording: recording,
            }),
            Err(err) => {
                log::warn!("failed to open volume recording {}: {}", path.display(), err);
                Box::new(NullVolume)
            }
        }
    }
}

/// Pose consumer that logs the live pose and the accumulated trajectory to
/// a rerun recording.
pub struct RerunPoseSink {
    recording: RecordingStream,
    tick: i64,
    trail: Vec<(f32, f32, f32)>,
}

impl RerunPoseSink {
    pub fn new(recording: RecordingStream) -> RerunPoseSink {
        RerunPoseSink {
            recording,
            tick: 0,
            trail: Vec::new(),
        }
    }
}

impl PoseSink for RerunPoseSink {
    fn send_pose(&mut self, channel: usize, pose: &TrackedPose) {
        self.tick += 1;
        self.recording.set_time_sequence("tick", self.tick);

        let [x, y, z] = pose.translation;
        self.trail.push((x, y, z));

        self.recording
            .log(
                format!("tracker/{}/pose", channel),
                &rerun::Transform3D::from_translation_rotation(
                    [x, y, z],
                    rerun::Quaternion::from_xyzw(pose.rotation),
                ),
            )
            .unwrap();
        self.recording
            .log(
                format!("tracker/{}/trail", channel),
                &rerun::Points3D::new(self.trail.iter().copied()),
            )
            .unwrap();
    }
}
