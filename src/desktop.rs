// src/desktop.rs
//
// Tauri bridge: the webview's players and timeline call these commands, and
// player instructions go back out as `PLAYER_COMMAND` events.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tauri::{AppHandle, Emitter, Manager, State};
use uuid::Uuid;

use crate::cameras::CameraDirectory;
use crate::config::ConfigManager;
use crate::logging::init_logging;
use crate::motion::{HttpMotionLookup, MotionLookup, MotionOverlay, MotionSample};
use crate::presentation::{ViewLayout, ViewModel};
use crate::registry::{CameraId, PlayerCommand, PlayerHandle};
use crate::review::{ReviewSegment, ReviewSeverity};
use crate::session::{PlayerEvent, Session, SessionInit, SessionSnapshot, TimelineEvent};
use crate::timeline::{TimeRange, Timestamp};

// --- EVENT NAMES ---
pub const PLAYER_COMMAND_EVENT: &str = "PLAYER_COMMAND";
pub const SESSION_UPDATE_EVENT: &str = "SESSION_UPDATE";
pub const MOTION_UPDATE_EVENT: &str = "MOTION_UPDATE";

// --- PAYLOADS ---

#[derive(Serialize, Clone, Debug)]
pub struct PlayerCommandEvent {
    pub session_id: Uuid,
    pub camera: CameraId,
    pub command: PlayerCommand,
}

#[derive(Serialize, Clone, Debug)]
pub struct SessionUpdateEvent {
    pub session_id: Uuid,
    pub snapshot: SessionSnapshot,
}

#[derive(Serialize, Clone, Debug)]
pub struct MotionUpdateEvent {
    pub session_id: Uuid,
    pub samples: Vec<MotionSample>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SessionOpened {
    pub session_id: Uuid,
    pub snapshot: SessionSnapshot,
}

// --- PLAYER HANDLE OVER THE WEBVIEW ---

/// Player living in the webview. Commands are fire-and-forget events; a
/// failed emit is logged and dropped like any command to an absent player.
pub struct TauriPlayerHandle {
    app: AppHandle,
    session_id: Uuid,
    camera: CameraId,
}

impl TauriPlayerHandle {
    pub fn new(app: AppHandle, session_id: Uuid, camera: impl Into<CameraId>) -> Self {
        Self {
            app,
            session_id,
            camera: camera.into(),
        }
    }

    fn send(&self, command: PlayerCommand) {
        let payload = PlayerCommandEvent {
            session_id: self.session_id,
            camera: self.camera.clone(),
            command,
        };
        if let Err(e) = self.app.emit(PLAYER_COMMAND_EVENT, payload) {
            log::warn!("Failed to send player command to {}: {}", self.camera, e);
        }
    }
}

impl PlayerHandle for TauriPlayerHandle {
    fn load(&mut self, chunk: &TimeRange, start_at: Timestamp) {
        self.send(PlayerCommand::Load {
            chunk: *chunk,
            start_at,
        });
    }

    fn seek_to(&mut self, timestamp: Timestamp, autoplay: bool) {
        self.send(PlayerCommand::Seek {
            timestamp,
            autoplay,
        });
    }

    fn scrub_to(&mut self, timestamp: Timestamp) {
        self.send(PlayerCommand::Scrub { timestamp });
    }
}

// --- MANAGED STATE ---

struct SessionEntry {
    session: Session,
    motion: MotionOverlay,
}

/// Open review sessions, one per view. Sessions never share handles.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl SessionStore {
    fn with_session<T>(
        &self,
        session_id: Uuid,
        f: impl FnOnce(&mut SessionEntry) -> T,
    ) -> Result<T, String> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| "Failed to lock sessions".to_string())?;
        let entry = sessions
            .get_mut(&session_id)
            .ok_or_else(|| format!("Unknown session {}", session_id))?;
        Ok(f(entry))
    }
}

#[derive(Default)]
pub struct CameraDirectoryState(pub Mutex<CameraDirectory>);

fn emit_snapshot(app: &AppHandle, session_id: Uuid, snapshot: &SessionSnapshot) {
    let payload = SessionUpdateEvent {
        session_id,
        snapshot: snapshot.clone(),
    };
    if let Err(e) = app.emit(SESSION_UPDATE_EVENT, payload) {
        log::warn!("Failed to emit session update: {}", e);
    }
}

// --- COMMANDS ---

/// Loads the camera list and frame sizes from the NVR config JSON.
#[tauri::command]
pub fn set_camera_directory(
    directory: State<'_, CameraDirectoryState>,
    config_json: String,
) -> Result<Vec<CameraId>, String> {
    let parsed = CameraDirectory::from_json(&config_json).map_err(|e| e.to_string())?;
    let ids = parsed.camera_ids();
    *directory.0.lock().map_err(|_| "Failed to lock camera directory")? = parsed;
    Ok(ids)
}

#[tauri::command]
pub fn open_review_session(
    app: AppHandle,
    store: State<'_, SessionStore>,
    config: State<'_, ConfigManager>,
    directory: State<'_, CameraDirectoryState>,
    mut init: SessionInit,
) -> Result<SessionOpened, String> {
    if init.cameras.is_empty() {
        let directory = directory
            .0
            .lock()
            .map_err(|_| "Failed to lock camera directory")?;
        init.cameras = directory.camera_ids();
    }

    let session_id = Uuid::new_v4();
    let session = Session::new(config.get(), init);
    let snapshot = session.snapshot();

    store
        .sessions
        .lock()
        .map_err(|_| "Failed to lock sessions")?
        .insert(
            session_id,
            SessionEntry {
                session,
                motion: MotionOverlay::new(),
            },
        );

    log::info!("Opened review session {}", session_id);
    emit_snapshot(&app, session_id, &snapshot);
    Ok(SessionOpened {
        session_id,
        snapshot,
    })
}

#[tauri::command]
pub fn close_review_session(
    store: State<'_, SessionStore>,
    session_id: Uuid,
) -> Result<(), String> {
    let removed = store
        .sessions
        .lock()
        .map_err(|_| "Failed to lock sessions")?
        .remove(&session_id);

    if let Some(mut entry) = removed {
        entry.session.teardown();
    }
    Ok(())
}

/// A player in the webview finished loading and can take commands.
#[tauri::command]
pub fn player_ready(
    app: AppHandle,
    store: State<'_, SessionStore>,
    session_id: Uuid,
    camera: CameraId,
) -> Result<SessionSnapshot, String> {
    let handle = TauriPlayerHandle::new(app.clone(), session_id, camera.clone());
    let snapshot = store.with_session(session_id, |entry| {
        entry.session.register(&camera, Box::new(handle));
        entry.session.snapshot()
    })?;
    emit_snapshot(&app, session_id, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub fn player_removed(
    store: State<'_, SessionStore>,
    session_id: Uuid,
    camera: CameraId,
) -> Result<bool, String> {
    store.with_session(session_id, |entry| entry.session.unregister(&camera))
}

#[tauri::command]
pub fn player_event(
    app: AppHandle,
    store: State<'_, SessionStore>,
    session_id: Uuid,
    camera: CameraId,
    event: PlayerEvent,
) -> Result<SessionSnapshot, String> {
    let snapshot = store.with_session(session_id, |entry| {
        entry.session.handle_player(&camera, event);
        entry.session.snapshot()
    })?;
    emit_snapshot(&app, session_id, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub fn timeline_event(
    app: AppHandle,
    store: State<'_, SessionStore>,
    session_id: Uuid,
    event: TimelineEvent,
) -> Result<SessionSnapshot, String> {
    let snapshot = store.with_session(session_id, |entry| {
        entry.session.handle_timeline(event);
        entry.session.snapshot()
    })?;
    emit_snapshot(&app, session_id, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub fn select_camera(
    app: AppHandle,
    store: State<'_, SessionStore>,
    session_id: Uuid,
    camera: CameraId,
) -> Result<bool, String> {
    let (switched, snapshot) = store.with_session(session_id, |entry| {
        let switched = entry.session.switch_camera(&camera);
        (switched, entry.session.snapshot())
    })?;
    if switched {
        emit_snapshot(&app, session_id, &snapshot);
    }
    Ok(switched)
}

#[tauri::command]
pub fn set_reference_time(
    app: AppHandle,
    store: State<'_, SessionStore>,
    session_id: Uuid,
    timestamp: Timestamp,
) -> Result<SessionSnapshot, String> {
    let snapshot = store.with_session(session_id, |entry| {
        entry.session.set_reference_time(timestamp);
        entry.session.snapshot()
    })?;
    emit_snapshot(&app, session_id, &snapshot);
    Ok(snapshot)
}

#[tauri::command]
pub fn get_view_model(
    store: State<'_, SessionStore>,
    directory: State<'_, CameraDirectoryState>,
    session_id: Uuid,
    layout: ViewLayout,
    reviews: Vec<ReviewSegment>,
    severity: ReviewSeverity,
) -> Result<ViewModel, String> {
    let directory = directory
        .0
        .lock()
        .map_err(|_| "Failed to lock camera directory")?
        .clone();
    store.with_session(session_id, |entry| {
        ViewModel::build(
            layout,
            &entry.session,
            &directory,
            &reviews,
            severity,
            &entry.motion,
        )
    })
}

/// Kicks off the motion lookup for the session's active camera and day.
/// Returns whatever is cached right now; fresh samples follow as a
/// `MOTION_UPDATE` event.
#[tauri::command]
pub async fn refresh_motion(
    app: AppHandle,
    store: State<'_, SessionStore>,
    config: State<'_, ConfigManager>,
    session_id: Uuid,
    severity: ReviewSeverity,
) -> Result<Vec<MotionSample>, String> {
    let (query, cached, start_fetch) = store.with_session(session_id, |entry| {
        match entry.session.motion_query(severity) {
            Some(query) => {
                let start_fetch = entry.motion.begin(&query);
                let cached = entry.motion.samples(&query).to_vec();
                (Some(query), cached, start_fetch)
            }
            None => (None, Vec::new(), false),
        }
    })?;

    let Some(query) = query.filter(|_| start_fetch) else {
        return Ok(cached);
    };

    let lookup = match HttpMotionLookup::from_config(&config.get()) {
        Ok(lookup) => lookup,
        Err(e) => {
            store.with_session(session_id, |entry| entry.motion.complete(&query, Err(e)))?;
            return Ok(cached);
        }
    };
    tauri::async_runtime::spawn(async move {
        let result = lookup.lookup(&query).await;
        let store = app.state::<SessionStore>();
        let samples = store.with_session(session_id, |entry| {
            entry.motion.complete(&query, result);
            entry.motion.samples(&query).to_vec()
        });

        match samples {
            Ok(samples) => {
                let payload = MotionUpdateEvent {
                    session_id,
                    samples,
                };
                if let Err(e) = app.emit(MOTION_UPDATE_EVENT, payload) {
                    log::warn!("Failed to emit motion update: {}", e);
                }
            }
            Err(e) => log::debug!("Motion result dropped: {}", e),
        }
    });

    Ok(cached)
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            let config_path = app.path().app_config_dir()?.join("review.json");
            let config = ConfigManager::load(&config_path)?;
            init_logging(&config.get().log_level);
            if config.loaded_from_file() {
                log::info!("Config loaded from {:?}", config_path);
            } else {
                log::info!("No config at {:?}, using defaults", config_path);
            }

            app.manage(config);
            app.manage(SessionStore::default());
            app.manage(CameraDirectoryState::default());
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            set_camera_directory,
            open_review_session,
            close_review_session,
            player_ready,
            player_removed,
            player_event,
            timeline_event,
            select_camera,
            set_reference_time,
            get_view_model,
            refresh_motion
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
