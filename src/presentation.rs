// src/presentation.rs
//
// Two layouts over the same Session. Neither holds state of its own; they
// only decide which cameras get a player and how a camera is picked.

use serde::{Deserialize, Serialize};

use crate::cameras::{AspectClass, CameraDirectory};
use crate::motion::MotionOverlay;
use crate::registry::CameraId;
use crate::review::{ReviewSegment, ReviewSeverity, TimelineProps};
use crate::session::Session;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewLayout {
    /// Main player plus a strip of preview players; click a preview to switch.
    Desktop,
    /// Single player; switch through a camera dropdown.
    Mobile,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CameraOption {
    pub id: CameraId,
    pub label: String,
    pub selected: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    pub layout: ViewLayout,
    pub main_camera: CameraId,
    pub main_aspect: AspectClass,
    pub preview_cameras: Vec<CameraId>,
    pub camera_menu: Vec<CameraOption>,
    pub timeline: TimelineProps,
}

impl ViewModel {
    pub fn build(
        layout: ViewLayout,
        session: &Session,
        directory: &CameraDirectory,
        reviews: &[ReviewSegment],
        severity: ReviewSeverity,
        motion: &MotionOverlay,
    ) -> Self {
        let main_camera = session.active_camera().to_string();

        let (preview_cameras, camera_menu) = match layout {
            ViewLayout::Desktop => (
                session
                    .cameras()
                    .iter()
                    .filter(|cam| **cam != main_camera)
                    .cloned()
                    .collect(),
                Vec::new(),
            ),
            ViewLayout::Mobile => (
                Vec::new(),
                session
                    .cameras()
                    .iter()
                    .map(|cam| CameraOption {
                        id: cam.clone(),
                        label: camera_label(cam),
                        selected: *cam == main_camera,
                    })
                    .collect(),
            ),
        };

        Self {
            layout,
            main_aspect: directory.aspect_class(&main_camera),
            main_camera,
            preview_cameras,
            camera_menu,
            timeline: session.timeline_props(reviews, severity, motion),
        }
    }
}

/// `front_door` -> `Front Door`
pub fn camera_label(camera: &str) -> String {
    camera
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
