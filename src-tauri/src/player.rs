// Player controller
// Owns both stores, the render surface and the running sequencer, and
// carries every flow that crosses between them

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::playback::{bars_to_duration_ms, CueSheet, Sequencer};
use crate::state::{
    Block, BlockSnapshot, BlockStore, FirstBlock, Lane, LaneEntryInput, LaneStore, LaneSummary,
    LocatedBlock, NewReferenceInput, Status, TrackSnapshot, DEFAULT_BARS,
};
use crate::surface::Surface;

/// Notifications for the track sequencer view
pub trait TrackView: Send + Sync {
    /// Lanes or the blocks they reference changed; re-read the track
    fn refresh_lanes(&self);

    /// The render surface now has these dimensions
    fn surface_resized(&self, width: u32, height: u32);

    /// Ask the view to start or stop playback, as if its play button was hit
    fn request_playback_toggle(&self);

    /// Playback started or stopped
    fn playback_state(&self, playing: bool);
}

/// Reply for operations that return the block list or an error token
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockReply {
    Snapshot(BlockSnapshot),
    Status(Status),
}

/// Reply for appending a reference to a lane
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddReferenceReply {
    #[serde(flatten)]
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_blocks: Option<Vec<Lane>>,
}

/// Separate outcomes of storing a new surface size and resizing the window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceSizeReply {
    pub persist: Status,
    pub resize: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

/// Script to show in one lane
#[derive(Debug, Clone, Deserialize)]
pub struct LanePlayRequest {
    #[serde(default)]
    pub lane_index: i64,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayReply {
    #[serde(flatten)]
    pub status: Status,
    pub lanes_played: usize,
}

/// Index sent by a view; negative values address nothing
pub fn view_index(index: i64) -> Option<usize> {
    usize::try_from(index).ok()
}

pub struct Player {
    blocks: BlockStore,
    lanes: LaneStore,
    surface: Arc<dyn Surface>,
    track_view: Arc<dyn TrackView>,
    sequencer: Option<Sequencer>,
}

impl Player {
    pub fn new(
        blocks: BlockStore,
        lanes: LaneStore,
        surface: Arc<dyn Surface>,
        track_view: Arc<dyn TrackView>,
    ) -> Self {
        Player {
            blocks,
            lanes,
            surface,
            track_view,
            sequencer: None,
        }
    }

    /// Load both stores from the configured data directory
    pub fn load(
        config: &AppConfig,
        surface: Arc<dyn Surface>,
        track_view: Arc<dyn TrackView>,
    ) -> Self {
        let blocks = BlockStore::load(config.blocks_path());
        let lanes = LaneStore::load(config.track_path());
        Player::new(blocks, lanes, surface, track_view)
    }

    pub fn block_store(&self) -> &BlockStore {
        &self.blocks
    }

    pub fn lane_store(&self) -> &LaneStore {
        &self.lanes
    }

    // ==================== BLOCKS ====================

    pub fn get_all_blocks(&self) -> BlockSnapshot {
        self.blocks.snapshot()
    }

    pub fn add_block(&mut self) -> BlockSnapshot {
        self.blocks.add()
    }

    pub fn select_block(&mut self, index: usize) -> String {
        self.blocks.select(index)
    }

    /// Store new code for the selected block, preview it and refresh the track
    pub fn update_block(&mut self, code: &str) -> BlockSnapshot {
        if self.blocks.update_code(code) {
            if let Err(e) = self.surface.show_single(code) {
                log::error!("Error updating preview: {}", e);
            }
            self.track_view.refresh_lanes();
        }
        self.blocks.snapshot()
    }

    pub fn update_block_name(&mut self, index: usize, name: &str) -> BlockSnapshot {
        if self.blocks.rename(index, name) {
            self.track_view.refresh_lanes();
        }
        self.blocks.snapshot()
    }

    pub fn get_block_by_id(&self, block_id: &str) -> Option<LocatedBlock> {
        self.blocks.find_by_id(block_id)
    }

    pub fn reorder_blocks(&mut self, blocks: Vec<Block>, moved_id: Option<String>) -> BlockSnapshot {
        let snapshot = self.blocks.reorder(blocks, moved_id);
        self.track_view.refresh_lanes();
        snapshot
    }

    pub fn delete_block(&mut self, index: usize) -> BlockReply {
        match self.blocks.delete(index) {
            Some(snapshot) => {
                self.track_view.refresh_lanes();
                BlockReply::Snapshot(snapshot)
            }
            None => BlockReply::Status(Status::error("Invalid block index")),
        }
    }

    pub fn load_first_block(&mut self) -> FirstBlock {
        self.blocks.load_first()
    }

    /// Append a reference to block `index` in `lane_index`, timed at the default bar count
    pub fn add_block_to_track(&mut self, index: usize, lane_index: usize) -> Status {
        let Some(block) = self.blocks.blocks().get(index) else {
            return Status::error("Invalid block index");
        };
        let input = NewReferenceInput {
            id: Some(block.id.clone()),
            duration: Some(bars_to_duration_ms(self.lanes.config().bpm, DEFAULT_BARS)),
            bars: Some(DEFAULT_BARS),
            ..Default::default()
        };
        let status = self.add_track_block(&input, lane_index).status;
        if status.is_success() {
            self.track_view.refresh_lanes();
        }
        status
    }

    // ==================== LANES ====================

    pub fn get_track_blocks(&self) -> TrackSnapshot {
        self.lanes.resolve_for_playback(self.blocks.blocks())
    }

    pub fn lane_summary(&self) -> Vec<LaneSummary> {
        self.lanes.lane_summary()
    }

    pub fn save_track_blocks(&mut self, lanes: &[Vec<LaneEntryInput>]) -> Status {
        self.lanes.save(lanes).into()
    }

    pub fn add_track_block(&mut self, block_data: &NewReferenceInput, lane_index: usize) -> AddReferenceReply {
        match self.lanes.add_reference(block_data, lane_index) {
            Ok(lanes) => AddReferenceReply {
                status: Status::Success,
                track_blocks: Some(lanes.to_vec()),
            },
            Err(e) => AddReferenceReply {
                status: Status::error(e.to_string()),
                track_blocks: None,
            },
        }
    }

    pub fn remove_track_block(&mut self, lane_index: usize, index: usize) -> Status {
        let status: Status = self.lanes.remove_reference(lane_index, index).map(|_| ()).into();
        self.refresh_on_success(status)
    }

    pub fn move_track_block(&mut self, lane_index: usize, from: usize, to: usize) -> Status {
        let status = self.lanes.move_reference(lane_index, from, to).into();
        self.refresh_on_success(status)
    }

    pub fn update_block_bars(&mut self, lane_index: usize, index: usize, bars: u32) -> Status {
        let status = self.lanes.set_bars(lane_index, index, bars).into();
        self.refresh_on_success(status)
    }

    pub fn retime_track(&mut self) -> Status {
        let status = self.lanes.retime().into();
        self.refresh_on_success(status)
    }

    /// Change the tempo and retime every reference to it
    pub fn update_bpm(&mut self, bpm: f64) -> Status {
        let status = self.lanes.set_bpm(bpm).and_then(|_| self.lanes.retime()).into();
        self.refresh_on_success(status)
    }

    pub fn update_delay(&mut self, delay_ms: u64) -> Status {
        self.lanes.set_delay(delay_ms).into()
    }

    /// Apply the stored surface size to the render surface, e.g. at startup
    pub fn restore_render_size(&self) -> Status {
        let config = self.lanes.config();
        let (width, height) = (config.surface_width, config.surface_height);
        match self.surface.resize(width, height) {
            Ok(()) => {
                log::info!("Render surface restored to {}x{}", width, height);
                Status::Success
            }
            Err(e) => {
                log::error!("Error restoring render size {}x{}: {}", width, height, e);
                Status::error(e.to_string())
            }
        }
    }

    pub fn get_render_size(&self) -> RenderSize {
        let config = self.lanes.config();
        RenderSize {
            width: config.surface_width,
            height: config.surface_height,
        }
    }

    /// Store and apply a new surface size
    ///
    /// Both steps are attempted; their outcomes are reported separately.
    pub fn update_render_size(&mut self, width: u32, height: u32) -> SurfaceSizeReply {
        if width == 0 || height == 0 {
            let invalid = Status::error(format!("Invalid render size {}x{}", width, height));
            return SurfaceSizeReply {
                persist: invalid.clone(),
                resize: invalid,
            };
        }

        let resize = match self.surface.resize(width, height) {
            Ok(()) => Status::Success,
            Err(e) => {
                log::error!("Error resizing render window: {}", e);
                Status::error(e.to_string())
            }
        };
        let persist = self.lanes.set_surface_size(width, height).into();

        SurfaceSizeReply { persist, resize }
    }

    /// The user resized the render window by hand
    pub fn record_render_size(&mut self, width: u32, height: u32) -> Status {
        let status: Status = self.lanes.set_surface_size(width, height).into();
        if status.is_success() {
            self.track_view.surface_resized(width, height);
        }
        status
    }

    // ==================== SURFACE ====================

    /// Clear every lane, then show each non-empty script in its lane
    pub fn play_lanes(&mut self, lanes: &[LanePlayRequest]) -> PlayReply {
        if let Some(bad) = lanes.iter().find(|r| view_index(r.lane_index).is_none()) {
            return PlayReply {
                status: Status::error(format!("Invalid lane index: {}", bad.lane_index)),
                lanes_played: 0,
            };
        }

        if let Err(e) = self.surface.clear(None) {
            log::error!("Error playing multiple lanes: {}", e);
            return PlayReply {
                status: Status::error(e.to_string()),
                lanes_played: 0,
            };
        }

        for request in lanes.iter().filter(|r| !r.code.is_empty()) {
            let lane_index = request.lane_index as usize;
            if let Err(e) = self.surface.show(&request.code, lane_index) {
                log::error!("Error playing multiple lanes: {}", e);
                return PlayReply {
                    status: Status::error(e.to_string()),
                    lanes_played: 0,
                };
            }
        }

        PlayReply {
            status: Status::Success,
            lanes_played: lanes.len(),
        }
    }

    pub fn update_single_lane(&self, lane_index: usize, code: &str) -> Status {
        self.surface.show(code, lane_index).into()
    }

    pub fn clear_all_lanes(&self) -> Status {
        self.surface.clear(None).into()
    }

    pub fn clear_lane(&self, lane_index: usize) -> Status {
        self.surface.clear(Some(lane_index)).into()
    }

    pub fn clear_single_preview(&self) -> Status {
        self.surface.clear_single().into()
    }

    // ==================== PLAYBACK ====================

    pub fn is_playing(&self) -> bool {
        self.sequencer.as_ref().is_some_and(Sequencer::is_running)
    }

    /// Resolve the track and play every lane from `start_index`
    ///
    /// Returns `false` when there is nothing to play.
    pub fn start_playback(&mut self, start_index: Option<usize>) -> bool {
        self.stop_sequencer();

        let track = self.get_track_blocks();
        let sheet = CueSheet::build(&track.track_blocks, track.delay, start_index);
        if sheet.is_empty() {
            log::info!("Nothing to play");
            return false;
        }

        log::info!(
            "Playing {} cues over {} ms",
            sheet.len(),
            sheet.total_ms
        );
        let view = Arc::clone(&self.track_view);
        self.sequencer = Some(Sequencer::start(
            sheet,
            Arc::clone(&self.surface),
            move |_| view.playback_state(false),
        ));
        self.track_view.playback_state(true);
        true
    }

    pub fn stop_playback(&mut self) {
        if self.stop_sequencer() {
            self.track_view.playback_state(false);
        }
    }

    /// Start playback when stopped, stop it when playing; returns the new state
    pub fn toggle_playback(&mut self, start_index: Option<usize>) -> bool {
        if self.is_playing() {
            self.stop_playback();
            false
        } else {
            self.start_playback(start_index)
        }
    }

    fn stop_sequencer(&mut self) -> bool {
        match self.sequencer.take() {
            Some(mut sequencer) => {
                let was_running = sequencer.is_running();
                sequencer.stop();
                was_running
            }
            None => false,
        }
    }

    fn refresh_on_success(&self, status: Status) -> Status {
        if status.is_success() {
            self.track_view.refresh_lanes();
        }
        status
    }
}
