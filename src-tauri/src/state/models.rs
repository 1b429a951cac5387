// Data models for the block and lane stores
use serde::{Deserialize, Serialize};

/// Fallback reference duration when a caller omits it
pub const DEFAULT_DURATION_MS: u64 = 1000;

/// Fallback bar count when a caller omits it
pub const DEFAULT_BARS: u32 = 8;

pub const DEFAULT_BPM: f64 = 120.0;
pub const DEFAULT_SURFACE_WIDTH: u32 = 1000;
pub const DEFAULT_SURFACE_HEIGHT: u32 = 1000;

/// Script given to every freshly added block
pub const PLACEHOLDER_SKETCH: &str = "// New p5.js sketch\n\
function setup() {\n  createCanvas(400, 400);\n}\n\n\
function draw() {\n  background(220);\n}";

fn default_duration() -> u64 {
    DEFAULT_DURATION_MS
}

fn default_bars() -> u32 {
    DEFAULT_BARS
}

fn default_bpm() -> f64 {
    DEFAULT_BPM
}

fn default_surface_width() -> u32 {
    DEFAULT_SURFACE_WIDTH
}

fn default_surface_height() -> u32 {
    DEFAULT_SURFACE_HEIGHT
}

/// A named, user-authored sketch with a stable id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub name: String,
    pub code: String,
}

/// Blocks plus the current selection, as returned to the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub blocks: Vec<Block>,
    pub selected_code_id: Option<String>,
}

/// On-disk shape of `code_blocks.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlocksFile {
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub selected_code_id: Option<String>,
}

/// A block together with its position in the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedBlock {
    pub block: Block,
    pub index: usize,
}

/// Result of loading the first block into the editor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirstBlock {
    pub code: String,
    pub selected_code_id: Option<String>,
}

/// Non-owning pointer from a lane slot to a block, with timing
///
/// `block_id` may name a block that no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneRef {
    #[serde(default)]
    pub block_id: String,
    #[serde(default = "default_duration")]
    pub duration: u64,
    #[serde(default = "default_bars")]
    pub bars: u32,
}

pub type Lane = Vec<LaneRef>;

/// Lane entry as sent by the track view
///
/// The view may attach resolved `name`/`code` fields; they are accepted
/// here and dropped by [`LaneEntryInput::to_reference`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaneEntryInput {
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub bars: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl LaneEntryInput {
    pub fn to_reference(&self) -> LaneRef {
        LaneRef {
            block_id: self.block_id.clone().unwrap_or_default(),
            duration: self.duration.unwrap_or(DEFAULT_DURATION_MS),
            bars: self.bars.unwrap_or(DEFAULT_BARS),
        }
    }
}

/// Block data handed over when appending a reference to a lane
///
/// Mirrors the editor's block payload: the id lives under `id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReferenceInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub bars: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl NewReferenceInput {
    pub fn to_reference(&self) -> LaneRef {
        LaneRef {
            block_id: self.id.clone().unwrap_or_default(),
            duration: self.duration.unwrap_or(DEFAULT_DURATION_MS),
            bars: self.bars.unwrap_or(DEFAULT_BARS),
        }
    }
}

/// Tempo, start delay and render surface dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub bpm: f64,
    pub delay_ms: u64,
    pub surface_width: u32,
    pub surface_height: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            bpm: DEFAULT_BPM,
            delay_ms: 0,
            surface_width: DEFAULT_SURFACE_WIDTH,
            surface_height: DEFAULT_SURFACE_HEIGHT,
        }
    }
}

/// On-disk shape of `track_data.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackFile {
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    #[serde(default)]
    pub delay: u64,
    #[serde(default)]
    pub track_blocks: Vec<Lane>,
    #[serde(default = "default_surface_width")]
    pub render_width: u32,
    #[serde(default = "default_surface_height")]
    pub render_height: u32,
}

impl Default for TrackFile {
    fn default() -> Self {
        TrackFile {
            bpm: DEFAULT_BPM,
            delay: 0,
            track_blocks: vec![Vec::new()],
            render_width: DEFAULT_SURFACE_WIDTH,
            render_height: DEFAULT_SURFACE_HEIGHT,
        }
    }
}

/// A lane reference joined with the block it points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBlock {
    pub block_id: String,
    pub name: String,
    pub code: String,
    pub duration: u64,
    pub bars: u32,
}

/// Resolved lanes plus playback configuration, as shown by the track view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub track_blocks: Vec<Vec<ResolvedBlock>>,
    pub bpm: f64,
    pub delay: u64,
    pub render_width: u32,
    pub render_height: u32,
}

impl Default for TrackSnapshot {
    fn default() -> Self {
        TrackSnapshot {
            track_blocks: vec![Vec::new()],
            bpm: DEFAULT_BPM,
            delay: 0,
            render_width: DEFAULT_SURFACE_WIDTH,
            render_height: DEFAULT_SURFACE_HEIGHT,
        }
    }
}

/// One row of the lane picker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneSummary {
    pub lane_index: usize,
    pub lane_name: String,
    pub block_count: usize,
}

/// Outcome token returned across the bridge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Status {
    Success,
    Error { message: String },
}

impl Status {
    pub fn error(message: impl Into<String>) -> Self {
        Status::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

impl<E: std::fmt::Display> From<Result<(), E>> for Status {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Status::Success,
            Err(e) => Status::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let ok = serde_json::to_value(Status::Success).unwrap();
        assert_eq!(ok, serde_json::json!({ "status": "success" }));

        let err = serde_json::to_value(Status::error("Invalid block index")).unwrap();
        assert_eq!(
            err,
            serde_json::json!({ "status": "error", "message": "Invalid block index" })
        );
    }

    #[test]
    fn test_lane_entry_drops_resolved_fields() {
        let entry: LaneEntryInput = serde_json::from_value(serde_json::json!({
            "block_id": "abc",
            "name": "Block 1",
            "code": "draw()",
            "duration": 500,
            "bars": 4
        }))
        .unwrap();

        let reference = serde_json::to_value(entry.to_reference()).unwrap();
        assert_eq!(
            reference,
            serde_json::json!({ "block_id": "abc", "duration": 500, "bars": 4 })
        );
    }

    #[test]
    fn test_lane_ref_defaults() {
        let reference: LaneRef = serde_json::from_str(r#"{"block_id":"x"}"#).unwrap();
        assert_eq!(reference.duration, DEFAULT_DURATION_MS);
        assert_eq!(reference.bars, DEFAULT_BARS);
    }

    #[test]
    fn test_track_file_defaults() {
        let file: TrackFile = serde_json::from_str("{}").unwrap();
        assert_eq!(file.bpm, 120.0);
        assert_eq!(file.delay, 0);
        assert!(file.track_blocks.is_empty());
        assert_eq!(file.render_width, 1000);
        assert_eq!(file.render_height, 1000);
    }
}
