// src/advancer.rs
use serde::{Deserialize, Serialize};

use crate::timeline::{TimeRange, Timestamp};

/// Which edge of its loaded chunk the primary player ran into.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryDirection {
    Forward,
    Backward,
}

/// Picks the next active chunk when the primary player crosses a chunk edge.
///
/// Forward always increments the index and backward decrements it; what that
/// means in wall-clock terms is fixed by the `ChunkOrder` the chunker used.
/// Both ends clamp: no wrap, no error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClipBoundaryAdvancer;

impl ClipBoundaryAdvancer {
    pub fn next_index(
        &self,
        active: usize,
        len: usize,
        direction: BoundaryDirection,
    ) -> Option<usize> {
        match direction {
            BoundaryDirection::Forward if active + 1 < len => Some(active + 1),
            BoundaryDirection::Backward if active > 0 && active < len => Some(active - 1),
            _ => None,
        }
    }

    /// Where playback resumes inside the newly loaded chunk.
    pub fn entry_point(&self, chunk: &TimeRange, direction: BoundaryDirection) -> Timestamp {
        match direction {
            BoundaryDirection::Forward => chunk.start,
            BoundaryDirection::Backward => chunk.end,
        }
    }
}
