// Desktop bridge
// Tauri-backed script sink, track view notifications and window construction

use serde::Serialize;
use tauri::{AppHandle, Emitter, LogicalSize, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

use crate::config::{WindowLayout, RENDER_WINDOW, TRACK_WINDOW};
use crate::player::TrackView;
use crate::surface::{ScriptSink, SurfaceError, SurfaceResult};

pub const LANES_CHANGED_EVENT: &str = "lanes-changed";
pub const SURFACE_RESIZED_EVENT: &str = "surface-resized";
pub const PLAYBACK_TOGGLE_EVENT: &str = "playback-toggle";
pub const PLAYBACK_STATE_EVENT: &str = "playback-state";

/// Evaluates surface scripts in the render webview
pub struct WebviewSink {
    app: AppHandle,
}

impl WebviewSink {
    pub fn new(app: AppHandle) -> Self {
        WebviewSink { app }
    }

    fn render_window(&self) -> SurfaceResult<WebviewWindow> {
        self.app
            .get_webview_window(RENDER_WINDOW.label)
            .ok_or(SurfaceError::Unavailable)
    }
}

impl ScriptSink for WebviewSink {
    fn evaluate(&self, script: &str) -> SurfaceResult<()> {
        self.render_window()?
            .eval(script)
            .map_err(|e| SurfaceError::Dispatch(e.to_string()))
    }

    fn resize(&self, width: u32, height: u32) -> SurfaceResult<()> {
        self.render_window()?
            .set_size(LogicalSize::new(width as f64, height as f64))
            .map_err(|e| SurfaceError::Resize(e.to_string()))
    }
}

#[derive(Clone, Serialize)]
struct SurfaceSize {
    width: u32,
    height: u32,
}

#[derive(Clone, Serialize)]
struct PlaybackState {
    playing: bool,
}

/// Forwards track view notifications to the track window as events
pub struct TrackWindow {
    app: AppHandle,
}

impl TrackWindow {
    pub fn new(app: AppHandle) -> Self {
        TrackWindow { app }
    }

    fn emit<S: Serialize + Clone>(&self, event: &str, payload: S) {
        if let Err(e) = self.app.emit_to(TRACK_WINDOW.label, event, payload) {
            log::error!("Failed to emit {} to track window: {}", event, e);
        }
    }
}

impl TrackView for TrackWindow {
    fn refresh_lanes(&self) {
        self.emit(LANES_CHANGED_EVENT, ());
    }

    fn surface_resized(&self, width: u32, height: u32) {
        self.emit(SURFACE_RESIZED_EVENT, SurfaceSize { width, height });
    }

    fn request_playback_toggle(&self) {
        self.emit(PLAYBACK_TOGGLE_EVENT, ());
    }

    fn playback_state(&self, playing: bool) {
        self.emit(PLAYBACK_STATE_EVENT, PlaybackState { playing });
    }
}

/// Create one of the application windows from its fixed layout
pub fn build_window(app: &AppHandle, layout: &WindowLayout) -> tauri::Result<WebviewWindow> {
    let builder = WebviewWindowBuilder::new(app, layout.label, WebviewUrl::App(layout.url.into()))
        .title(layout.title)
        .inner_size(layout.width, layout.height)
        .position(layout.x, layout.y)
        .decorations(layout.decorations)
        .always_on_top(layout.always_on_top);

    // Transparent windows on macOS need the private API feature
    #[cfg(not(target_os = "macos"))]
    let builder = builder.transparent(layout.label == RENDER_WINDOW.label);

    builder.build()
}
