// Cue scheduling
// Flattens resolved lanes into one time-ordered list of surface dispatches

use serde::Serialize;

use crate::state::ResolvedBlock;

/// One scheduled `show` of a block in a lane
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cue {
    /// Offset from the start of playback
    pub at_ms: u64,
    pub lane_index: usize,
    pub block_id: String,
    pub code: String,
    /// How long the block stays up before the next cue in its lane
    pub duration_ms: u64,
}

/// Time-ordered cues for every lane
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CueSheet {
    pub cues: Vec<Cue>,
    /// When the last block of the longest lane ends
    pub total_ms: u64,
}

impl CueSheet {
    /// Schedule every lane in parallel
    ///
    /// Each lane starts after `delay_ms` and plays its blocks back to back.
    /// With `start_index`, earlier blocks of every lane are skipped. Cues at
    /// the same instant are ordered by lane.
    pub fn build(lanes: &[Vec<ResolvedBlock>], delay_ms: u64, start_index: Option<usize>) -> Self {
        let skip = start_index.unwrap_or(0);
        let mut cues = Vec::new();
        let mut total_ms = 0;

        for (lane_index, lane) in lanes.iter().enumerate() {
            let mut at_ms = delay_ms;
            for block in lane.iter().skip(skip) {
                cues.push(Cue {
                    at_ms,
                    lane_index,
                    block_id: block.block_id.clone(),
                    code: block.code.clone(),
                    duration_ms: block.duration,
                });
                at_ms = at_ms.saturating_add(block.duration);
            }
            total_ms = total_ms.max(at_ms);
        }

        cues.sort_by_key(|cue| (cue.at_ms, cue.lane_index));
        CueSheet { cues, total_ms }
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }
}
