// src/registry.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::clock::PlaybackMode;
use crate::timeline::{TimeRange, Timestamp};

pub type CameraId = String;

// --- PLAYER CAPABILITY ---

/// What the core asks of a player. Implementations must not block; a player
/// that cannot honor a command right now drops it.
pub trait PlayerHandle: Send {
    /// Swap the player's data source to `chunk` and park it at `start_at`.
    fn load(&mut self, chunk: &TimeRange, start_at: Timestamp);
    /// Reposition and, when `autoplay` is set, resume playback.
    fn seek_to(&mut self, timestamp: Timestamp, autoplay: bool);
    /// Reposition the displayed frame without playing.
    fn scrub_to(&mut self, timestamp: Timestamp);
}

/// A single player instruction, as recorded or sent over the webview bridge.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerCommand {
    Load { chunk: TimeRange, start_at: Timestamp },
    Seek { timestamp: Timestamp, autoplay: bool },
    Scrub { timestamp: Timestamp },
}

/// Handle that only records what it was told. Shares its log across clones,
/// so a test can keep one clone and register the other.
#[derive(Clone, Default, Debug)]
pub struct CommandRecorder {
    log: Arc<Mutex<Vec<PlayerCommand>>>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }

    pub fn seeks(&self) -> Vec<(Timestamp, bool)> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                PlayerCommand::Seek {
                    timestamp,
                    autoplay,
                } => Some((timestamp, autoplay)),
                _ => None,
            })
            .collect()
    }

    pub fn scrubs(&self) -> Vec<Timestamp> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                PlayerCommand::Scrub { timestamp } => Some(timestamp),
                _ => None,
            })
            .collect()
    }

    pub fn loads(&self) -> Vec<(TimeRange, Timestamp)> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                PlayerCommand::Load { chunk, start_at } => Some((chunk, start_at)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, command: PlayerCommand) {
        if let Ok(mut log) = self.log.lock() {
            log.push(command);
        }
    }
}

impl PlayerHandle for CommandRecorder {
    fn load(&mut self, chunk: &TimeRange, start_at: Timestamp) {
        self.push(PlayerCommand::Load {
            chunk: *chunk,
            start_at,
        });
    }

    fn seek_to(&mut self, timestamp: Timestamp, autoplay: bool) {
        self.push(PlayerCommand::Seek {
            timestamp,
            autoplay,
        });
    }

    fn scrub_to(&mut self, timestamp: Timestamp) {
        self.push(PlayerCommand::Scrub { timestamp });
    }
}

// --- REGISTRY ---

/// Player handles keyed by camera, plus the label of which camera is primary.
///
/// Handles show up asynchronously and may be missing at any moment; every
/// operation against a missing handle is a no-op. Only the primary can be
/// sought, secondaries are scrub-only.
pub struct ControllerRegistry {
    primary_camera: CameraId,
    handles: HashMap<CameraId, Box<dyn PlayerHandle>>,
}

impl ControllerRegistry {
    pub fn new(primary_camera: impl Into<CameraId>) -> Self {
        Self {
            primary_camera: primary_camera.into(),
            handles: HashMap::new(),
        }
    }

    pub fn primary_camera(&self) -> &str {
        &self.primary_camera
    }

    pub fn has_primary(&self) -> bool {
        self.handles.contains_key(&self.primary_camera)
    }

    pub fn is_registered(&self, camera: &str) -> bool {
        self.handles.contains_key(camera)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Registered cameras other than the primary, sorted.
    pub fn secondary_cameras(&self) -> Vec<&str> {
        let mut cameras: Vec<&str> = self
            .handles
            .keys()
            .map(String::as_str)
            .filter(|cam| *cam != self.primary_camera)
            .collect();
        cameras.sort_unstable();
        cameras
    }

    /// Registers the handle of the current primary camera. Returns true when
    /// an earlier handle was replaced.
    pub fn register_primary(&mut self, handle: Box<dyn PlayerHandle>) -> bool {
        let camera = self.primary_camera.clone();
        log::debug!("Registering primary player for {}", camera);
        self.handles.insert(camera, handle).is_some()
    }

    /// Registers a preview handle. Last writer wins per camera.
    pub fn register_secondary(
        &mut self,
        camera: impl Into<CameraId>,
        handle: Box<dyn PlayerHandle>,
    ) -> bool {
        let camera = camera.into();
        if camera == self.primary_camera {
            log::warn!(
                "Preview player registered for primary camera {}, replacing primary handle",
                camera
            );
        } else {
            log::debug!("Registering preview player for {}", camera);
        }
        self.handles.insert(camera, handle).is_some()
    }

    pub fn unregister(&mut self, camera: &str) -> bool {
        let removed = self.handles.remove(camera).is_some();
        if removed {
            log::debug!("Unregistered player for {}", camera);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.handles.clear();
    }

    /// Relabels `camera` as primary. The handles themselves are kept; the old
    /// primary becomes a secondary. Returns the previous primary camera.
    pub fn promote(&mut self, camera: &str) -> Option<CameraId> {
        if camera == self.primary_camera {
            return None;
        }
        let previous = std::mem::replace(&mut self.primary_camera, camera.to_string());
        log::debug!("Promoted {} to primary (was {})", camera, previous);
        Some(previous)
    }

    pub fn seek_primary(&mut self, timestamp: Timestamp, autoplay: bool) -> bool {
        match self.handles.get_mut(&self.primary_camera) {
            Some(handle) => {
                handle.seek_to(timestamp, autoplay);
                true
            }
            None => false,
        }
    }

    pub fn load_primary(&mut self, chunk: &TimeRange, start_at: Timestamp) -> bool {
        match self.handles.get_mut(&self.primary_camera) {
            Some(handle) => {
                handle.load(chunk, start_at);
                true
            }
            None => false,
        }
    }

    pub fn scrub_one(&mut self, camera: &str, timestamp: Timestamp) -> bool {
        match self.handles.get_mut(camera) {
            Some(handle) => {
                handle.scrub_to(timestamp);
                true
            }
            None => false,
        }
    }

    /// Scrubs every secondary to `timestamp`, and the primary too while the
    /// user is scrubbing. Returns how many handles were driven.
    pub fn broadcast_scrub(&mut self, timestamp: Timestamp, mode: PlaybackMode) -> usize {
        let include_primary = mode == PlaybackMode::Scrubbing;
        let mut driven = 0;
        for (camera, handle) in self.handles.iter_mut() {
            if *camera == self.primary_camera && !include_primary {
                continue;
            }
            handle.scrub_to(timestamp);
            driven += 1;
        }
        driven
    }

    /// Loads `chunk` into every secondary, parked at `start_at`.
    pub fn load_secondaries(&mut self, chunk: &TimeRange, start_at: Timestamp) -> usize {
        let mut driven = 0;
        for (camera, handle) in self.handles.iter_mut() {
            if *camera == self.primary_camera {
                continue;
            }
            handle.load(chunk, start_at);
            driven += 1;
        }
        driven
    }
}
