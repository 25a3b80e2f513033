// src/review.rs
use serde::{Deserialize, Serialize};

use crate::motion::MotionSample;
use crate::timeline::Timestamp;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSeverity {
    Alert,
    Detection,
    SignificantMotion,
}

impl ReviewSeverity {
    /// Only the motion view draws the motion overlay.
    pub fn needs_motion(&self) -> bool {
        matches!(self, ReviewSeverity::SignificantMotion)
    }
}

/// A reviewable event on one camera. Supplied from outside, never mutated here.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReviewSegment {
    #[serde(default)]
    pub id: String,
    pub camera: String,
    #[serde(rename = "start_time")]
    pub start: Timestamp,
    #[serde(rename = "end_time")]
    pub end: Timestamp,
    pub severity: ReviewSeverity,
}

pub fn filter_for_camera(segments: &[ReviewSegment], camera: &str) -> Vec<ReviewSegment> {
    segments
        .iter()
        .filter(|segment| segment.camera == camera)
        .cloned()
        .collect()
}

/// Everything the timeline widget is handed. Field names follow the widget's
/// props so it can be passed straight through.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineProps {
    pub segment_duration: u32,
    pub timestamp_spread: u32,
    pub timeline_start: Timestamp,
    pub timeline_end: Timestamp,
    pub show_handlebar: bool,
    pub handlebar_time: Timestamp,
    pub events: Vec<ReviewSegment>,
    pub severity_type: ReviewSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_events: Option<Vec<MotionSample>>,
}
