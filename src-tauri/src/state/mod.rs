// State management module
// Block and lane stores and their JSON persistence

pub mod blocks;
pub mod lanes;
pub mod models;
pub mod storage;

pub use blocks::BlockStore;
pub use lanes::{LaneError, LaneResult, LaneStore};
pub use models::{
    Block, BlockSnapshot, FirstBlock, Lane, LaneEntryInput, LaneRef, LaneSummary, LocatedBlock,
    NewReferenceInput, PlaybackConfig, ResolvedBlock, Status, TrackSnapshot, DEFAULT_BARS,
};
pub use storage::{StorageError, StorageResult};
