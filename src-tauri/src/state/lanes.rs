// Lane store: lanes of block references, playback config and track_data.json
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::models::{
    Block, Lane, LaneEntryInput, LaneRef, LaneSummary, NewReferenceInput, PlaybackConfig,
    ResolvedBlock, TrackFile, TrackSnapshot,
};
use super::storage::{self, StorageError};
use crate::playback::bars_to_duration_ms;

#[derive(Debug, Error)]
pub enum LaneError {
    #[error("Invalid lane index: {0}")]
    InvalidLane(usize),
    #[error("Invalid block index {index} in lane {lane}")]
    InvalidIndex { lane: usize, index: usize },
    #[error("BPM must be a positive number, got {0}")]
    InvalidBpm(f64),
    #[error("Bar count must be positive")]
    InvalidBars,
    #[error("Surface size must be positive, got {0}x{1}")]
    InvalidSurfaceSize(u32, u32),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type LaneResult<T> = Result<T, LaneError>;

/// Owns the lane set and the playback configuration
///
/// The lane set always holds at least one lane. References are weak: they
/// are joined against the block store on read and never pruned on write.
#[derive(Debug)]
pub struct LaneStore {
    lanes: Vec<Lane>,
    config: PlaybackConfig,
    path: PathBuf,
}

impl LaneStore {
    /// Create a store with one empty lane and default config, without reading `path`
    pub fn new(path: PathBuf) -> Self {
        LaneStore {
            lanes: vec![Vec::new()],
            config: PlaybackConfig::default(),
            path,
        }
    }

    /// Load the store from disk
    ///
    /// Missing or malformed files yield defaults; an empty lane list heals
    /// to a single empty lane.
    pub fn load(path: PathBuf) -> Self {
        let file: TrackFile = storage::load_or_default(&path);
        let mut lanes = file.track_blocks;
        if lanes.is_empty() {
            log::info!("No lanes found, creating default lane");
            lanes.push(Vec::new());
        }

        let defaults = PlaybackConfig::default();
        let bpm = if file.bpm.is_finite() && file.bpm > 0.0 {
            file.bpm
        } else {
            defaults.bpm
        };

        LaneStore {
            lanes,
            config: PlaybackConfig {
                bpm,
                delay_ms: file.delay,
                surface_width: file.render_width.max(1),
                surface_height: file.render_height.max(1),
            },
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Join every reference against `blocks`
    ///
    /// References whose block is gone are skipped in the result but stay in
    /// the store.
    pub fn resolve_for_playback(&self, blocks: &[Block]) -> TrackSnapshot {
        let track_blocks: Vec<Vec<ResolvedBlock>> = self
            .lanes
            .iter()
            .enumerate()
            .map(|(lane_index, lane)| {
                lane.iter()
                    .filter_map(|reference| {
                        let resolved = resolve_reference(reference, blocks);
                        if resolved.is_none() {
                            log::warn!(
                                "Block {} in lane {} not found, skipping",
                                reference.block_id,
                                lane_index + 1
                            );
                        }
                        resolved
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        TrackSnapshot {
            track_blocks,
            bpm: self.config.bpm,
            delay: self.config.delay_ms,
            render_width: self.config.surface_width,
            render_height: self.config.surface_height,
        }
    }

    /// Replace all lanes with reference-only copies of `lanes`
    pub fn save(&mut self, lanes: &[Vec<LaneEntryInput>]) -> LaneResult<()> {
        self.lanes = lanes
            .iter()
            .map(|lane| lane.iter().map(LaneEntryInput::to_reference).collect())
            .collect();
        if self.lanes.is_empty() {
            self.lanes.push(Vec::new());
        }
        self.persist()
    }

    /// Append a reference to `lane_index`, creating empty lanes up to it
    pub fn add_reference(
        &mut self,
        block_data: &NewReferenceInput,
        lane_index: usize,
    ) -> LaneResult<&[Lane]> {
        while self.lanes.len() <= lane_index {
            self.lanes.push(Vec::new());
        }
        self.lanes[lane_index].push(block_data.to_reference());
        self.persist()?;
        Ok(&self.lanes)
    }

    /// Remove one reference from a lane
    pub fn remove_reference(&mut self, lane_index: usize, index: usize) -> LaneResult<LaneRef> {
        let lane = self.lane_mut(lane_index)?;
        if index >= lane.len() {
            return Err(LaneError::InvalidIndex {
                lane: lane_index,
                index,
            });
        }
        let removed = lane.remove(index);
        self.persist()?;
        Ok(removed)
    }

    /// Move a reference within its lane
    pub fn move_reference(&mut self, lane_index: usize, from: usize, to: usize) -> LaneResult<()> {
        let lane = self.lane_mut(lane_index)?;
        let len = lane.len();
        for index in [from, to] {
            if index >= len {
                return Err(LaneError::InvalidIndex {
                    lane: lane_index,
                    index,
                });
            }
        }
        if from == to {
            return Ok(());
        }
        let moved = lane.remove(from);
        lane.insert(to, moved);
        self.persist()
    }

    /// Change a reference's bar count and recompute its duration from the bpm
    pub fn set_bars(&mut self, lane_index: usize, index: usize, bars: u32) -> LaneResult<()> {
        if bars == 0 {
            return Err(LaneError::InvalidBars);
        }
        let bpm = self.config.bpm;
        let reference = self
            .lane_mut(lane_index)?
            .get_mut(index)
            .ok_or(LaneError::InvalidIndex {
                lane: lane_index,
                index,
            })?;
        reference.bars = bars;
        reference.duration = bars_to_duration_ms(bpm, bars);
        self.persist()
    }

    /// Recompute every reference's duration from its bars and the current bpm
    pub fn retime(&mut self) -> LaneResult<()> {
        let bpm = self.config.bpm;
        for reference in self.lanes.iter_mut().flatten() {
            reference.duration = bars_to_duration_ms(bpm, reference.bars);
        }
        self.persist()
    }

    pub fn set_bpm(&mut self, bpm: f64) -> LaneResult<()> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(LaneError::InvalidBpm(bpm));
        }
        self.config.bpm = bpm;
        self.persist()
    }

    pub fn set_delay(&mut self, delay_ms: u64) -> LaneResult<()> {
        self.config.delay_ms = delay_ms;
        self.persist()
    }

    /// Store new surface dimensions
    ///
    /// Only the config is touched; resizing the window is the caller's job.
    pub fn set_surface_size(&mut self, width: u32, height: u32) -> LaneResult<()> {
        if width == 0 || height == 0 {
            return Err(LaneError::InvalidSurfaceSize(width, height));
        }
        self.config.surface_width = width;
        self.config.surface_height = height;
        self.persist()
    }

    /// One summary row per lane, never empty
    pub fn lane_summary(&self) -> Vec<LaneSummary> {
        let mut summary: Vec<LaneSummary> = self
            .lanes
            .iter()
            .enumerate()
            .map(|(i, lane)| LaneSummary {
                lane_index: i,
                lane_name: format!("Lane {}", i + 1),
                block_count: lane.len(),
            })
            .collect();
        if summary.is_empty() {
            summary.push(LaneSummary {
                lane_index: 0,
                lane_name: "Lane 1".to_string(),
                block_count: 0,
            });
        }
        summary
    }

    fn lane_mut(&mut self, lane_index: usize) -> LaneResult<&mut Lane> {
        self.lanes
            .get_mut(lane_index)
            .ok_or(LaneError::InvalidLane(lane_index))
    }

    fn persist(&self) -> LaneResult<()> {
        let file = TrackFile {
            bpm: self.config.bpm,
            delay: self.config.delay_ms,
            track_blocks: self.lanes.clone(),
            render_width: self.config.surface_width,
            render_height: self.config.surface_height,
        };
        storage::write_json(&self.path, &file).map_err(|e| {
            log::error!("Error saving track data to {}: {}", self.path.display(), e);
            LaneError::from(e)
        })
    }
}

fn resolve_reference(reference: &LaneRef, blocks: &[Block]) -> Option<ResolvedBlock> {
    blocks
        .iter()
        .find(|b| b.id == reference.block_id)
        .map(|block| ResolvedBlock {
            block_id: reference.block_id.clone(),
            name: block.name.clone(),
            code: block.code.clone(),
            duration: reference.duration,
            bars: reference.bars,
        })
}
