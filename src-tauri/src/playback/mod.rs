// Playback module
// Bar timing, cue scheduling, the lane sequencer and click-to-play

pub mod click;
pub mod cues;
pub mod sequencer;

pub use click::ClickToPlay;
pub use cues::{Cue, CueSheet};
pub use sequencer::Sequencer;

/// Beats per bar; sketches are timed in 4/4
pub const BEATS_PER_BAR: u32 = 4;

/// Length of `bars` bars at `bpm`, rounded to whole milliseconds
pub fn bars_to_duration_ms(bpm: f64, bars: u32) -> u64 {
    if !bpm.is_finite() || bpm <= 0.0 {
        return 0;
    }
    (60.0 / bpm * BEATS_PER_BAR as f64 * bars as f64 * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_to_duration() {
        // At 120 BPM a 4/4 bar lasts 2 seconds
        assert_eq!(bars_to_duration_ms(120.0, 1), 2000);
        assert_eq!(bars_to_duration_ms(120.0, 8), 16000);
        assert_eq!(bars_to_duration_ms(90.0, 1), 2667);
        assert_eq!(bars_to_duration_ms(0.0, 8), 0);
    }
}
