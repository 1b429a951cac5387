// Tauri IPC Commands
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use tauri::{AppHandle, Manager, State};

use crate::assets::ImageServer;
use crate::config::AppConfig;
use crate::playback::ClickToPlay;
use crate::player::{
    view_index, AddReferenceReply, BlockReply, LanePlayRequest, PlayReply, Player, RenderSize,
    SurfaceSizeReply,
};
use crate::state::{
    Block, BlockSnapshot, FirstBlock, LaneEntryInput, LaneSummary, LocatedBlock,
    NewReferenceInput, Status, TrackSnapshot,
};

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

type CommandResult<T> = Result<T, CommandError>;

/// The player, shared by every window
pub struct PlayerState(pub Mutex<Player>);

impl PlayerState {
    /// Lock the player, recovering from a poisoned lock
    pub fn lock(&self) -> MutexGuard<'_, Player> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the player unless another caller holds it
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Player>> {
        match self.0.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}

pub struct ClickState(pub Arc<ClickToPlay>);

/// Keeps the image server alive for the lifetime of the app
pub struct ImageServerState(pub Mutex<Option<ImageServer>>);

fn invalid_lane(lane_index: i64) -> Status {
    Status::error(format!("Invalid lane index: {}", lane_index))
}

fn invalid_position(lane_index: i64, index: i64) -> Status {
    Status::error(format!("Invalid block index {} in lane {}", index, lane_index))
}

// ==================== BLOCK COMMANDS ====================

#[tauri::command]
pub fn get_all_blocks(player: State<'_, PlayerState>) -> CommandResult<BlockSnapshot> {
    Ok(player.lock().get_all_blocks())
}

#[tauri::command]
pub fn add_block(player: State<'_, PlayerState>) -> CommandResult<BlockSnapshot> {
    Ok(player.lock().add_block())
}

/// Select a block and return its code, or an empty string for a bad index
#[tauri::command]
pub fn select_block(player: State<'_, PlayerState>, index: i64) -> CommandResult<String> {
    Ok(match view_index(index) {
        Some(index) => player.lock().select_block(index),
        None => String::new(),
    })
}

#[tauri::command]
pub fn update_block(player: State<'_, PlayerState>, code: String) -> CommandResult<BlockSnapshot> {
    Ok(player.lock().update_block(&code))
}

#[tauri::command]
pub fn update_block_name(
    player: State<'_, PlayerState>,
    index: i64,
    name: String,
) -> CommandResult<BlockSnapshot> {
    let mut player = player.lock();
    Ok(match view_index(index) {
        Some(index) => player.update_block_name(index, &name),
        None => player.get_all_blocks(),
    })
}

#[tauri::command]
pub fn get_block_by_id(
    player: State<'_, PlayerState>,
    block_id: String,
) -> CommandResult<Option<LocatedBlock>> {
    Ok(player.lock().get_block_by_id(&block_id))
}

#[tauri::command]
pub fn reorder_blocks(
    player: State<'_, PlayerState>,
    blocks: Vec<Block>,
    moved_block_id: Option<String>,
) -> CommandResult<BlockSnapshot> {
    Ok(player.lock().reorder_blocks(blocks, moved_block_id))
}

#[tauri::command]
pub fn delete_block(player: State<'_, PlayerState>, index: i64) -> CommandResult<BlockReply> {
    Ok(match view_index(index) {
        Some(index) => player.lock().delete_block(index),
        None => BlockReply::Status(Status::error("Invalid block index")),
    })
}

#[tauri::command]
pub fn load_first_block(player: State<'_, PlayerState>) -> CommandResult<FirstBlock> {
    Ok(player.lock().load_first_block())
}

#[tauri::command]
pub fn add_block_to_track(
    player: State<'_, PlayerState>,
    index: i64,
    lane_index: i64,
) -> CommandResult<Status> {
    Ok(match (view_index(index), view_index(lane_index)) {
        (Some(index), Some(lane)) => player.lock().add_block_to_track(index, lane),
        (None, _) => Status::error("Invalid block index"),
        (_, None) => invalid_lane(lane_index),
    })
}

// ==================== TRACK COMMANDS ====================

#[tauri::command]
pub fn get_track_blocks(player: State<'_, PlayerState>) -> CommandResult<TrackSnapshot> {
    Ok(player.lock().get_track_blocks())
}

#[tauri::command]
pub fn get_lanes(player: State<'_, PlayerState>) -> CommandResult<Vec<LaneSummary>> {
    Ok(player.lock().lane_summary())
}

#[tauri::command]
pub fn save_track_blocks(
    player: State<'_, PlayerState>,
    track_blocks: Vec<Vec<LaneEntryInput>>,
) -> CommandResult<Status> {
    Ok(player.lock().save_track_blocks(&track_blocks))
}

#[tauri::command]
pub fn add_track_block(
    player: State<'_, PlayerState>,
    block_data: NewReferenceInput,
    lane_index: i64,
) -> CommandResult<AddReferenceReply> {
    Ok(match view_index(lane_index) {
        Some(lane) => player.lock().add_track_block(&block_data, lane),
        None => AddReferenceReply {
            status: invalid_lane(lane_index),
            track_blocks: None,
        },
    })
}

#[tauri::command]
pub fn remove_track_block(
    player: State<'_, PlayerState>,
    lane_index: i64,
    index: i64,
) -> CommandResult<Status> {
    Ok(match (view_index(lane_index), view_index(index)) {
        (Some(lane), Some(position)) => player.lock().remove_track_block(lane, position),
        _ => invalid_position(lane_index, index),
    })
}

#[tauri::command]
pub fn move_track_block(
    player: State<'_, PlayerState>,
    lane_index: i64,
    from: i64,
    to: i64,
) -> CommandResult<Status> {
    Ok(
        match (view_index(lane_index), view_index(from), view_index(to)) {
            (Some(lane), Some(from), Some(to)) => player.lock().move_track_block(lane, from, to),
            (_, None, _) => invalid_position(lane_index, from),
            _ => invalid_position(lane_index, to),
        },
    )
}

#[tauri::command]
pub fn update_block_bars(
    player: State<'_, PlayerState>,
    lane_index: i64,
    index: i64,
    bars: u32,
) -> CommandResult<Status> {
    Ok(match (view_index(lane_index), view_index(index)) {
        (Some(lane), Some(position)) => player.lock().update_block_bars(lane, position, bars),
        _ => invalid_position(lane_index, index),
    })
}

#[tauri::command]
pub fn retime_track(player: State<'_, PlayerState>) -> CommandResult<Status> {
    Ok(player.lock().retime_track())
}

#[tauri::command]
pub fn update_bpm(player: State<'_, PlayerState>, bpm: f64) -> CommandResult<Status> {
    Ok(player.lock().update_bpm(bpm))
}

#[tauri::command]
pub fn update_delay(player: State<'_, PlayerState>, delay: u64) -> CommandResult<Status> {
    Ok(player.lock().update_delay(delay))
}

#[tauri::command]
pub fn get_render_size(player: State<'_, PlayerState>) -> CommandResult<RenderSize> {
    Ok(player.lock().get_render_size())
}

#[tauri::command]
pub fn update_render_size(
    player: State<'_, PlayerState>,
    width: u32,
    height: u32,
) -> CommandResult<SurfaceSizeReply> {
    Ok(player.lock().update_render_size(width, height))
}

// ==================== RENDER COMMANDS ====================

#[tauri::command]
pub fn play_lanes(
    player: State<'_, PlayerState>,
    lanes: Vec<LanePlayRequest>,
) -> CommandResult<PlayReply> {
    Ok(player.lock().play_lanes(&lanes))
}

#[tauri::command]
pub fn update_single_lane(
    player: State<'_, PlayerState>,
    lane_index: i64,
    code: String,
) -> CommandResult<Status> {
    Ok(match view_index(lane_index) {
        Some(lane) => player.lock().update_single_lane(lane, &code),
        None => invalid_lane(lane_index),
    })
}

#[tauri::command]
pub fn clear_all_lanes(player: State<'_, PlayerState>) -> CommandResult<Status> {
    Ok(player.lock().clear_all_lanes())
}

#[tauri::command]
pub fn clear_lane(player: State<'_, PlayerState>, lane_index: i64) -> CommandResult<Status> {
    Ok(match view_index(lane_index) {
        Some(lane) => player.lock().clear_lane(lane),
        None => invalid_lane(lane_index),
    })
}

#[tauri::command]
pub fn clear_single_preview(player: State<'_, PlayerState>) -> CommandResult<Status> {
    Ok(player.lock().clear_single_preview())
}

// ==================== PLAYBACK COMMANDS ====================

/// Start or stop the track; returns whether it is now playing
#[tauri::command]
pub fn toggle_playback(
    player: State<'_, PlayerState>,
    start_index: Option<i64>,
) -> CommandResult<bool> {
    // A negative start index plays from the top
    Ok(player.lock().toggle_playback(start_index.and_then(view_index)))
}

#[tauri::command]
pub fn stop_playback(player: State<'_, PlayerState>) -> CommandResult<()> {
    player.lock().stop_playback();
    Ok(())
}

#[tauri::command]
pub fn is_playing(player: State<'_, PlayerState>) -> CommandResult<bool> {
    Ok(player.lock().is_playing())
}

#[tauri::command]
pub fn set_click_to_play(click: State<'_, ClickState>, enabled: bool) -> CommandResult<()> {
    click.0.set_enabled(enabled);
    Ok(())
}

#[tauri::command]
pub fn get_click_to_play(click: State<'_, ClickState>) -> CommandResult<bool> {
    Ok(click.0.is_enabled())
}

/// A click landed on the render surface
#[tauri::command]
pub fn render_clicked(app: AppHandle, click: State<'_, ClickState>) -> CommandResult<bool> {
    let view = crate::bridge::TrackWindow::new(app);
    Ok(click.0.on_click(&view))
}

// ==================== WINDOW COMMANDS ====================

#[tauri::command]
pub fn hide_all_windows(app: AppHandle) -> CommandResult<()> {
    for window in app.webview_windows().values() {
        window.hide()?;
    }
    Ok(())
}

#[tauri::command]
pub fn show_all_windows(app: AppHandle) -> CommandResult<()> {
    for window in app.webview_windows().values() {
        window.show()?;
    }
    Ok(())
}

#[tauri::command]
pub fn get_image_server_url(config: State<'_, AppConfig>) -> CommandResult<String> {
    Ok(format!("http://localhost:{}", config.image_server_port))
}
