// src/cameras.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::registry::CameraId;

/// Frames wider than this ratio get the wide layout.
const WIDE_ASPECT_RATIO: f64 = 2.0;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AspectClass {
    #[default]
    Video,
    Wide,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DetectSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct CameraInfo {
    #[serde(default)]
    pub detect: Option<DetectSize>,
}

/// Every known camera and its frame size, read from the NVR config
/// (`{"cameras": {"<name>": {"detect": {"width": .., "height": ..}}}}`).
/// Unknown keys are ignored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct CameraDirectory {
    #[serde(default)]
    pub cameras: BTreeMap<CameraId, CameraInfo>,
}

impl CameraDirectory {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CameraId>,
    {
        Self {
            cameras: names
                .into_iter()
                .map(|name| (name.into(), CameraInfo::default()))
                .collect(),
        }
    }

    pub fn camera_ids(&self) -> Vec<CameraId> {
        self.cameras.keys().cloned().collect()
    }

    pub fn contains(&self, camera: &str) -> bool {
        self.cameras.contains_key(camera)
    }

    pub fn aspect_ratio(&self, camera: &str) -> Option<f64> {
        let detect = self.cameras.get(camera)?.detect?;
        if detect.height == 0 {
            return None;
        }
        Some(f64::from(detect.width) / f64::from(detect.height))
    }

    pub fn aspect_class(&self, camera: &str) -> AspectClass {
        match self.aspect_ratio(camera) {
            Some(ratio) if ratio > WIDE_ASPECT_RATIO => AspectClass::Wide,
            _ => AspectClass::Video,
        }
    }
}
