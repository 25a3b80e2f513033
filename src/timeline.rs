// src/timeline.rs
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::config::ReviewConfig;

// --- CONSTANTS ---
pub const DAY_SECS: f64 = 86_400.0;

/// Seconds since the Unix epoch. Players report fractional seconds.
pub type Timestamp = f64;

// --- DATA STRUCTURES ---

/// A closed interval `[start, end]` of recording time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: Timestamp) -> bool {
        self.start <= t && t <= self.end
    }

    /// Same as `contains` but with the range widened by `tolerance` on both sides.
    pub fn contains_within(&self, t: Timestamp, tolerance: f64) -> bool {
        self.start - tolerance <= t && t <= self.end + tolerance
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Human readable form used in log lines, e.g. `2024-03-01 14:00 → 15:00`.
    pub fn label(&self, offset: FixedOffset) -> String {
        let fmt = |t: Timestamp, pattern: &str| {
            DateTime::from_timestamp(t.floor() as i64, 0)
                .map(|dt| dt.with_timezone(&offset).format(pattern).to_string())
                .unwrap_or_else(|| format!("{:.0}", t))
        };
        format!("{} → {}", fmt(self.start, "%Y-%m-%d %H:%M"), fmt(self.end, "%H:%M"))
    }
}

/// Index direction of the chunk list. One setting drives the chunker,
/// the boundary advancer and the timeline bounds.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChunkOrder {
    /// Index 0 is the earliest chunk of the day; forward playback increments the index.
    #[default]
    OldestFirst,
    /// Index 0 is the most recent chunk of the day.
    NewestFirst,
}

/// A day window split into fixed-duration chunks with no gaps and no overlaps.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChunkSet {
    pub day_start: Timestamp,
    pub day_end: Timestamp,
    pub ranges: Vec<TimeRange>,
    pub order: ChunkOrder,
}

impl ChunkSet {
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TimeRange> {
        self.ranges.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.ranges.len().saturating_sub(1)
    }

    /// First chunk (in stored order) whose closed interval contains `t`.
    /// Chunks share their edges, so an edge timestamp resolves to the one scanned first.
    pub fn find_containing(&self, t: Timestamp) -> Option<usize> {
        self.ranges.iter().position(|r| r.contains(t))
    }

    /// Containing chunk, or the chunk at the day edge closest to `t`.
    pub fn nearest_index(&self, t: Timestamp) -> usize {
        if let Some(index) = self.find_containing(t) {
            return index;
        }

        let (earliest, latest) = match self.order {
            ChunkOrder::OldestFirst => (0, self.last_index()),
            ChunkOrder::NewestFirst => (self.last_index(), 0),
        };
        if t < self.day_start {
            earliest
        } else {
            latest
        }
    }

    /// Drops chunks that have not started yet at `now`. The chunk containing
    /// `now` stays, and at least one chunk always remains.
    pub fn trim_future(&mut self, now: Timestamp) {
        let earliest = self
            .ranges
            .iter()
            .copied()
            .min_by(|a, b| a.start.total_cmp(&b.start));

        self.ranges.retain(|r| r.start <= now);

        if self.ranges.is_empty() {
            self.ranges.extend(earliest);
        }

        if let Some(end) = self.ranges.iter().map(|r| r.end).reduce(f64::max) {
            self.day_end = end;
        }
    }

    /// `(timeline_start, timeline_end)` for the timeline widget. The widget
    /// draws newest at the top whatever the index order, so it always starts
    /// at the day's end.
    pub fn timeline_bounds(&self) -> (Timestamp, Timestamp) {
        (self.day_end, self.day_start)
    }
}

// --- THE CHUNKER ---

/// Splits the day containing a reference timestamp into chunks.
/// Pure and deterministic: same input, same `ChunkSet`.
#[derive(Clone, Copy, Debug)]
pub struct TimeChunker {
    chunk_duration: f64,
    utc_offset_secs: i32,
    order: ChunkOrder,
}

impl TimeChunker {
    pub fn new(chunk_duration_secs: u32, utc_offset_secs: i32, order: ChunkOrder) -> Self {
        Self {
            chunk_duration: f64::from(chunk_duration_secs.max(1)),
            utc_offset_secs,
            order,
        }
    }

    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(
            config.chunk_duration_secs,
            config.utc_offset_secs,
            config.chunk_order,
        )
    }

    pub fn order(&self) -> ChunkOrder {
        self.order
    }

    /// Local midnight (at the configured UTC offset) at or before `t`.
    pub fn day_start(&self, t: Timestamp) -> Timestamp {
        let local = t + f64::from(self.utc_offset_secs);
        t - local.rem_euclid(DAY_SECS)
    }

    pub fn chunk(&self, reference: Timestamp) -> ChunkSet {
        let day_start = self.day_start(reference);
        let day_end = day_start + DAY_SECS;
        let count = (DAY_SECS / self.chunk_duration).ceil() as usize;

        let mut ranges: Vec<TimeRange> = (0..count)
            .map(|i| {
                let start = day_start + i as f64 * self.chunk_duration;
                let end = (start + self.chunk_duration).min(day_end);
                TimeRange::new(start, end)
            })
            .collect();

        if self.order == ChunkOrder::NewestFirst {
            ranges.reverse();
        }

        ChunkSet {
            day_start,
            day_end,
            ranges,
            order: self.order,
        }
    }
}
