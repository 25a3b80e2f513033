// src/clock.rs
use serde::{Deserialize, Serialize};

use crate::timeline::{ChunkSet, Timestamp};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    #[default]
    Playing,
    Scrubbing,
}

/// What a timeline drag update asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrubOutcome {
    /// Inside the loaded chunk (± tolerance): scrub the players here.
    Scrub(Timestamp),
    /// Outside the loaded chunk: switch to this chunk index and let the
    /// players reload before the next scrub.
    Reanchor(usize),
    /// No chunk of the day contains the target. Nothing moves.
    Unanchorable,
    /// Not scrubbing; the primary player owns the clock.
    Ignored,
}

/// Owner of "current time" and the play/scrub mode.
///
/// While `Playing` only primary-player time updates move the clock; while
/// `Scrubbing` only timeline drags do. The mode check is what drops stale
/// updates that arrive from the other side after a transition.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    mode: PlaybackMode,
    current_time: Timestamp,
    tolerance: f64,
}

impl PlaybackClock {
    pub fn new(start_time: Timestamp, tolerance: f64) -> Self {
        Self {
            mode: PlaybackMode::Playing,
            current_time: start_time,
            tolerance,
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_scrubbing(&self) -> bool {
        self.mode == PlaybackMode::Scrubbing
    }

    pub fn current_time(&self) -> Timestamp {
        self.current_time
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Drag started. No player command goes out on entry.
    pub fn begin_drag(&mut self) -> bool {
        if self.mode == PlaybackMode::Scrubbing {
            return false;
        }
        self.mode = PlaybackMode::Scrubbing;
        log::debug!("Scrubbing from {:.3}", self.current_time);
        true
    }

    /// Drag moved the handlebar to `t`. Checks `t` against the active chunk
    /// and picks between scrubbing and re-anchoring.
    pub fn drag_update(&mut self, t: Timestamp, chunks: &ChunkSet, active: usize) -> ScrubOutcome {
        if self.mode != PlaybackMode::Scrubbing {
            return ScrubOutcome::Ignored;
        }

        self.current_time = t;

        let within = chunks
            .get(active)
            .is_some_and(|chunk| chunk.contains_within(t, self.tolerance));
        if within {
            return ScrubOutcome::Scrub(t);
        }

        match chunks.find_containing(t) {
            Some(index) => ScrubOutcome::Reanchor(index),
            None => ScrubOutcome::Unanchorable,
        }
    }

    /// Drag ended. Returns the time the primary must seek (and play) from,
    /// or `None` when there was no drag to end.
    pub fn end_drag(&mut self) -> Option<Timestamp> {
        if self.mode != PlaybackMode::Scrubbing {
            return None;
        }
        self.mode = PlaybackMode::Playing;
        log::debug!("Resuming playback at {:.3}", self.current_time);
        Some(self.current_time)
    }

    /// Time reported by the primary player. Accepted only while playing.
    pub fn time_update(&mut self, t: Timestamp) -> bool {
        if self.mode != PlaybackMode::Playing {
            return false;
        }
        self.current_time = t;
        true
    }

    /// Re-seats the clock at `t` in `Playing`, as a freshly mounted view would be.
    pub fn reset(&mut self, t: Timestamp) {
        self.mode = PlaybackMode::Playing;
        self.current_time = t;
    }
}
