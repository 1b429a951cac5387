// Click-to-play flag
// Written by the track view, read by the global input hook thread

use std::sync::atomic::{AtomicBool, Ordering};

use crate::player::TrackView;

/// Whether a global mouse click should toggle track playback
#[derive(Debug, Default)]
pub struct ClickToPlay {
    enabled: AtomicBool,
}

impl ClickToPlay {
    pub fn new(enabled: bool) -> Self {
        ClickToPlay {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        log::info!("Click to play state updated: {}", enabled);
    }

    /// Handle a global click; returns whether playback was toggled
    pub fn on_click(&self, view: &dyn TrackView) -> bool {
        if !self.is_enabled() {
            log::debug!("Click to play disabled, ignoring click");
            return false;
        }
        view.request_playback_toggle();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::testing::RecordingView;

    #[test]
    fn test_click_ignored_when_disabled() {
        let flag = ClickToPlay::default();
        let view = RecordingView::default();

        assert!(!flag.on_click(&view));
        assert_eq!(view.toggle_requests(), 0);
    }

    #[test]
    fn test_click_toggles_when_enabled() {
        let flag = ClickToPlay::new(false);
        let view = RecordingView::default();

        flag.set_enabled(true);

        assert!(flag.is_enabled());
        assert!(flag.on_click(&view));
        assert_eq!(view.toggle_requests(), 1);
    }
}
