// src/session.rs
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::advancer::{BoundaryDirection, ClipBoundaryAdvancer};
use crate::clock::{PlaybackClock, PlaybackMode, ScrubOutcome};
use crate::config::ReviewConfig;
use crate::motion::{MotionOverlay, MotionQuery};
use crate::registry::{CameraId, ControllerRegistry, PlayerHandle};
use crate::review::{filter_for_camera, ReviewSegment, ReviewSeverity, TimelineProps};
use crate::switcher::CameraSwitcher;
use crate::timeline::{ChunkSet, TimeChunker, TimeRange, Timestamp};

// --- INPUTS ---

/// What a view mounts with.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionInit {
    pub camera: CameraId,
    pub start_time: Timestamp,
    #[serde(default)]
    pub cameras: Vec<CameraId>,
    /// Wall clock at mount; chunks after it are hidden when configured.
    #[serde(default)]
    pub now: Option<Timestamp>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineEvent {
    DraggingChanged { dragging: bool },
    HandlebarMoved { timestamp: Timestamp },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    TimeUpdate { timestamp: Timestamp },
    BoundaryCrossed { direction: BoundaryDirection },
}

/// Read-only view of the session, sent to the frontend after every change.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub active_camera: CameraId,
    pub active_chunk_index: usize,
    pub active_chunk: TimeRange,
    pub chunk_count: usize,
    pub day_start: Timestamp,
    pub day_end: Timestamp,
    pub current_time: Timestamp,
    pub mode: PlaybackMode,
    pub playback_start: Timestamp,
}

// --- THE SESSION ---

/// Mutable root of one review view: the chunked day, the active chunk, the
/// clock, the player handles and the primary camera. Exclusively owned by
/// the view that created it.
pub struct Session {
    config: ReviewConfig,
    offset: FixedOffset,
    chunker: TimeChunker,
    advancer: ClipBoundaryAdvancer,
    chunks: ChunkSet,
    active_chunk: usize,
    clock: PlaybackClock,
    registry: ControllerRegistry,
    switcher: CameraSwitcher,
    cameras: Vec<CameraId>,
    trim_at: Option<Timestamp>,
    closed: bool,
}

impl Session {
    pub fn new(config: ReviewConfig, init: SessionInit) -> Self {
        let offset = config.utc_offset().unwrap_or_else(|_| Utc.fix());
        let chunker = TimeChunker::from_config(&config);
        let trim_at = init.now.filter(|_| config.hide_future_chunks);
        let chunks = build_chunks(&chunker, init.start_time, trim_at);
        let active_chunk = chunks.nearest_index(init.start_time);

        log::info!(
            "Review session on {} at {:.3}, chunk {}/{} ({})",
            init.camera,
            init.start_time,
            active_chunk,
            chunks.len(),
            chunks.ranges[active_chunk].label(offset)
        );

        let mut cameras = init.cameras;
        if !cameras.contains(&init.camera) {
            cameras.insert(0, init.camera.clone());
        }

        Self {
            clock: PlaybackClock::new(init.start_time, config.scrub_tolerance_secs),
            registry: ControllerRegistry::new(init.camera.clone()),
            switcher: CameraSwitcher::new(init.camera, init.start_time),
            advancer: ClipBoundaryAdvancer,
            config,
            offset,
            chunker,
            chunks,
            active_chunk,
            cameras,
            trim_at,
            closed: false,
        }
    }

    // --- ACCESSORS ---

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn chunks(&self) -> &ChunkSet {
        &self.chunks
    }

    pub fn active_chunk_index(&self) -> usize {
        self.active_chunk
    }

    pub fn active_chunk(&self) -> TimeRange {
        self.chunks.ranges[self.active_chunk]
    }

    pub fn active_camera(&self) -> &str {
        self.switcher.active_camera()
    }

    pub fn current_time(&self) -> Timestamp {
        self.clock.current_time()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.clock.mode()
    }

    pub fn playback_start(&self) -> Timestamp {
        self.switcher.playback_start()
    }

    pub fn cameras(&self) -> &[CameraId] {
        &self.cameras
    }

    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active_camera: self.active_camera().to_string(),
            active_chunk_index: self.active_chunk,
            active_chunk: self.active_chunk(),
            chunk_count: self.chunks.len(),
            day_start: self.chunks.day_start,
            day_end: self.chunks.day_end,
            current_time: self.current_time(),
            mode: self.mode(),
            playback_start: self.playback_start(),
        }
    }

    // --- PLAYER REGISTRATION ---

    /// The active camera's player is ready. It is opened on the active chunk
    /// at the playback start, or at the current time once the view has moved
    /// away from it.
    pub fn register_primary(&mut self, handle: Box<dyn PlayerHandle>) {
        if self.closed {
            return;
        }
        self.registry.register_primary(handle);
        let chunk = self.active_chunk();
        let start = self.playback_start();
        if !chunk.contains_within(start, self.clock.tolerance()) {
            let now = self.current_time();
            log::debug!(
                "Playback start {:.3} left chunk {}, opening at {:.3}",
                start,
                self.active_chunk,
                now
            );
            self.switcher.set_playback_start(now);
        }
        self.switcher
            .open_primary(&chunk, self.clock.mode(), &mut self.registry);
    }

    /// A preview player is ready. It gets the active chunk and is parked on
    /// the current time.
    pub fn register_secondary(&mut self, camera: &str, handle: Box<dyn PlayerHandle>) {
        if self.closed {
            return;
        }
        if camera == self.active_camera() {
            log::warn!("Ignoring preview registration for primary camera {}", camera);
            return;
        }

        let mut handle = handle;
        let now = self.current_time();
        handle.load(&self.active_chunk(), now);
        handle.scrub_to(now);
        self.registry.register_secondary(camera, handle);
    }

    /// Convenience for bridges that only know a camera id: registers as
    /// primary when `camera` is the active one, as a preview otherwise.
    pub fn register(&mut self, camera: &str, handle: Box<dyn PlayerHandle>) {
        if camera == self.active_camera() {
            self.register_primary(handle);
        } else {
            self.register_secondary(camera, handle);
        }
    }

    pub fn unregister(&mut self, camera: &str) -> bool {
        self.registry.unregister(camera)
    }

    // --- TIMELINE ---

    pub fn handle_timeline(&mut self, event: TimelineEvent) -> Option<ScrubOutcome> {
        match event {
            TimelineEvent::DraggingChanged { dragging } => {
                self.set_dragging(dragging);
                None
            }
            TimelineEvent::HandlebarMoved { timestamp } => Some(self.move_handlebar(timestamp)),
        }
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        if self.closed {
            return;
        }

        if dragging {
            if self.clock.begin_drag() {
                log::debug!("Timeline drag started at {:.3}", self.current_time());
            }
            return;
        }

        if let Some(resume_at) = self.clock.end_drag() {
            log::info!("Drag released, resuming playback at {:.3}", resume_at);
            self.switcher.set_playback_start(resume_at);
            self.registry.seek_primary(resume_at, true);
        }
    }

    /// The handlebar moved during a drag.
    pub fn move_handlebar(&mut self, timestamp: Timestamp) -> ScrubOutcome {
        if self.closed {
            return ScrubOutcome::Ignored;
        }

        let outcome = self
            .clock
            .drag_update(timestamp, &self.chunks, self.active_chunk);

        match outcome {
            ScrubOutcome::Scrub(t) => {
                self.registry.broadcast_scrub(t, PlaybackMode::Scrubbing);
            }
            ScrubOutcome::Reanchor(index) => {
                // players reload first; the next drag update scrubs them
                self.activate_chunk(index, timestamp);
            }
            ScrubOutcome::Unanchorable => {
                log::warn!(
                    "Scrub target {:.3} is outside the loaded day, holding chunk {}",
                    timestamp,
                    self.active_chunk
                );
            }
            ScrubOutcome::Ignored => {
                log::debug!("Handlebar moved to {:.3} while playing, ignored", timestamp);
            }
        }

        outcome
    }

    // --- PLAYERS ---

    /// A notification from the player of `camera`. Only the primary drives
    /// the session; previews never do.
    pub fn handle_player(&mut self, camera: &str, event: PlayerEvent) {
        if self.closed {
            return;
        }
        if camera != self.active_camera() {
            log::debug!("Ignoring {:?} from non-primary camera {}", event, camera);
            return;
        }

        match event {
            PlayerEvent::TimeUpdate { timestamp } => self.on_time_update(timestamp),
            PlayerEvent::BoundaryCrossed { direction } => {
                self.on_boundary_crossed(direction);
            }
        }
    }

    fn on_time_update(&mut self, timestamp: Timestamp) {
        if !self.clock.time_update(timestamp) {
            return;
        }
        // previews show whole-second frames
        self.registry
            .broadcast_scrub(timestamp.floor(), PlaybackMode::Playing);
    }

    /// Moves to the neighbouring chunk after the primary hit a chunk edge.
    /// Returns the new index, or `None` when clamped at either end or while
    /// the timeline is being dragged.
    pub fn on_boundary_crossed(&mut self, direction: BoundaryDirection) -> Option<usize> {
        if self.clock.is_scrubbing() {
            log::debug!("Boundary {:?} during scrub, ignored", direction);
            return None;
        }

        let Some(next) = self
            .advancer
            .next_index(self.active_chunk, self.chunks.len(), direction)
        else {
            log::debug!(
                "Boundary {:?} at chunk {} of {}, staying",
                direction,
                self.active_chunk,
                self.chunks.len()
            );
            return None;
        };

        let entry = self.advancer.entry_point(&self.chunks.ranges[next], direction);
        self.activate_chunk(next, entry);
        self.clock.reset(entry);
        self.switcher.set_playback_start(entry);
        self.registry.seek_primary(entry, true);
        Some(next)
    }

    // --- CAMERA SWITCH ---

    pub fn switch_camera(&mut self, camera: &str) -> bool {
        if self.closed {
            return false;
        }
        if !self.cameras.iter().any(|c| c == camera) {
            log::warn!("Unknown camera {}, staying on {}", camera, self.active_camera());
            return false;
        }

        let from = self.active_camera().to_string();
        let chunk = self.active_chunk();
        let switched = self.switcher.switch_to(
            camera,
            self.clock.current_time(),
            self.clock.mode(),
            &chunk,
            &mut self.registry,
        );

        if switched {
            log::info!(
                "Switched main camera {} -> {} at {:.3}",
                from,
                camera,
                self.playback_start()
            );
        }
        switched
    }

    // --- DAY CHANGE ---

    /// Re-seats the session at `t`. The chunk set is rebuilt only when `t`
    /// lies in another day window. Returns true when the day changed.
    pub fn set_reference_time(&mut self, t: Timestamp) -> bool {
        if self.closed {
            return false;
        }

        let day_changed = self.chunker.day_start(t) != self.chunks.day_start;
        if day_changed {
            self.chunks = build_chunks(&self.chunker, t, self.trim_at);
        }

        self.clock.reset(t);
        self.switcher.set_playback_start(t);

        let index = self.chunks.nearest_index(t);
        self.activate_chunk(index, t);
        self.registry.seek_primary(t, true);

        log::info!(
            "Reference time {:.3}, chunk {} ({}){}",
            t,
            index,
            self.chunks.ranges[index].label(self.offset),
            if day_changed { ", new day" } else { "" }
        );
        day_changed
    }

    // --- TEARDOWN ---

    /// Drops every player handle. Nothing is dispatched afterwards.
    pub fn teardown(&mut self) {
        if !self.closed {
            log::info!("Closing review session on {}", self.active_camera());
        }
        self.registry.clear();
        self.closed = true;
    }

    // --- TIMELINE WIDGET ---

    pub fn visible_reviews(&self, reviews: &[ReviewSegment]) -> Vec<ReviewSegment> {
        filter_for_camera(reviews, self.active_camera())
    }

    /// The motion overlay query, only for severities that draw one.
    pub fn motion_query(&self, severity: ReviewSeverity) -> Option<MotionQuery> {
        severity.needs_motion().then(|| MotionQuery {
            after: self.chunks.day_start,
            before: self.chunks.day_end,
            scale: self.config.motion_scale(),
            cameras: self.active_camera().to_string(),
        })
    }

    pub fn timeline_props(
        &self,
        reviews: &[ReviewSegment],
        severity: ReviewSeverity,
        motion: &MotionOverlay,
    ) -> TimelineProps {
        let (timeline_start, timeline_end) = self.chunks.timeline_bounds();
        TimelineProps {
            segment_duration: self.config.segment_duration_secs,
            timestamp_spread: self.config.timestamp_spread_secs,
            timeline_start,
            timeline_end,
            show_handlebar: true,
            handlebar_time: self.current_time(),
            events: self.visible_reviews(reviews),
            severity_type: severity,
            motion_events: self
                .motion_query(severity)
                .map(|query| motion.samples(&query).to_vec()),
        }
    }

    // --- INTERNALS ---

    fn activate_chunk(&mut self, index: usize, start_at: Timestamp) {
        if index >= self.chunks.len() {
            return;
        }
        let changed = index != self.active_chunk;
        self.active_chunk = index;

        let chunk = self.active_chunk();
        if changed {
            log::info!("Active chunk {} ({})", index, chunk.label(self.offset));
        }
        self.registry.load_primary(&chunk, start_at);
        self.registry.load_secondaries(&chunk, start_at);
    }
}

fn build_chunks(
    chunker: &TimeChunker,
    reference: Timestamp,
    trim_at: Option<Timestamp>,
) -> ChunkSet {
    let mut chunks = chunker.chunk(reference);
    if let Some(now) = trim_at {
        chunks.trim_future(now);
    }
    chunks
}
