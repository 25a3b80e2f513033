// src/switcher.rs
use crate::clock::PlaybackMode;
use crate::registry::{CameraId, ControllerRegistry};
use crate::timeline::{TimeRange, Timestamp};

/// Tracks which camera is primary and where a newly promoted primary opens.
#[derive(Debug, Clone)]
pub struct CameraSwitcher {
    active_camera: CameraId,
    playback_start: Timestamp,
}

impl CameraSwitcher {
    pub fn new(camera: impl Into<CameraId>, start_time: Timestamp) -> Self {
        Self {
            active_camera: camera.into(),
            playback_start: start_time,
        }
    }

    pub fn active_camera(&self) -> &str {
        &self.active_camera
    }

    pub fn playback_start(&self) -> Timestamp {
        self.playback_start
    }

    pub fn set_playback_start(&mut self, t: Timestamp) {
        self.playback_start = t;
    }

    /// Makes `camera` primary, carrying `current_time` over as its start.
    ///
    /// The promoted handle (if registered) is opened at the carried time; the
    /// demoted one is parked there with a scrub and stays scrub-only.
    pub fn switch_to(
        &mut self,
        camera: &str,
        current_time: Timestamp,
        mode: PlaybackMode,
        chunk: &TimeRange,
        registry: &mut ControllerRegistry,
    ) -> bool {
        if camera == self.active_camera {
            return false;
        }

        self.playback_start = current_time;
        let previous = registry.promote(camera);
        self.active_camera = camera.to_string();

        self.open_primary(chunk, mode, registry);
        if let Some(previous) = previous {
            registry.scrub_one(&previous, current_time);
        }
        true
    }

    /// Loads `chunk` into the primary and seeks it to the playback start.
    /// Autoplays unless the user is mid-scrub.
    pub fn open_primary(
        &self,
        chunk: &TimeRange,
        mode: PlaybackMode,
        registry: &mut ControllerRegistry,
    ) -> bool {
        if !registry.load_primary(chunk, self.playback_start) {
            return false;
        }
        registry.seek_primary(self.playback_start, mode == PlaybackMode::Playing)
    }
}
