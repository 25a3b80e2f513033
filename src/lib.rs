// src/lib.rs
//
// Core of the recording review screen: a day of recordings split into
// chunks, one clock that is either following the main player or following
// the timeline drag, and the player handles kept in step with it.

pub mod advancer;
pub mod cameras;
pub mod clock;
pub mod config;
pub mod logging;
pub mod motion;
pub mod presentation;
pub mod registry;
pub mod review;
pub mod session;
pub mod switcher;
pub mod timeline;

#[cfg(feature = "desktop")]
pub mod desktop;

pub use advancer::{BoundaryDirection, ClipBoundaryAdvancer};
pub use cameras::{AspectClass, CameraDirectory, CameraInfo};
pub use clock::{PlaybackClock, PlaybackMode, ScrubOutcome};
pub use config::{ConfigError, ConfigManager, ReviewConfig};
pub use logging::init_logging;
pub use motion::{
    HttpMotionLookup, MotionError, MotionLookup, MotionOverlay, MotionQuery, MotionSample,
};
pub use presentation::{camera_label, CameraOption, ViewLayout, ViewModel};
pub use registry::{CameraId, CommandRecorder, ControllerRegistry, PlayerCommand, PlayerHandle};
pub use review::{ReviewSegment, ReviewSeverity, TimelineProps};
pub use session::{PlayerEvent, Session, SessionInit, SessionSnapshot, TimelineEvent};
pub use switcher::CameraSwitcher;
pub use timeline::{ChunkOrder, ChunkSet, TimeChunker, TimeRange, Timestamp};

#[cfg(feature = "desktop")]
pub use desktop::run;
